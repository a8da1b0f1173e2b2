//! `generec verify` and `generec reject` commands.

use anyhow::Result;
use clap::Args;
use gene_records::{Action, RecordId, Verdict};

use super::{signer, user_error};
use crate::opts::{LedgerOpts, connect};
use crate::output::{print_success, record_line};

#[derive(Args, Debug)]
pub struct TransitionArgs {
    /// Record id as shown by `generec list`
    pub id: String,
}

pub async fn cmd_verify(opts: &LedgerOpts, args: &TransitionArgs) -> Result<()> {
    run(opts, args, Verdict::Verified, Action::Verification).await
}

pub async fn cmd_reject(opts: &LedgerOpts, args: &TransitionArgs) -> Result<()> {
    run(opts, args, Verdict::Rejected, Action::Rejection).await
}

async fn run(opts: &LedgerOpts, args: &TransitionArgs, verdict: Verdict, action: Action) -> Result<()> {
    let conn = connect(opts).await?;
    let writer = signer(&conn, action)?;
    let id = RecordId::new(args.id.trim());

    let record = conn
        .manager
        .transition(&writer, &id, verdict)
        .await
        .map_err(user_error(action))?;

    print_success(opts, serde_json::to_value(&record)?, record_line(&record), vec![])
}
