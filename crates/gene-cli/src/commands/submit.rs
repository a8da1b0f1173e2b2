//! `generec submit` command.

use anyhow::Result;
use clap::Args;
use gene_records::{Action, ExperimentPayload};

use super::{signer, user_error};
use crate::opts::{LedgerOpts, connect};
use crate::output::{print_success, record_line};

#[derive(Args, Debug)]
pub struct SubmitArgs {
    /// Editing technique, e.g. CRISPR-Cas9, CRISPR-Cas12, Base Editing, Prime Editing
    #[arg(long)]
    pub gene_type: String,

    /// Guide RNA sequence
    #[arg(long)]
    pub grna: String,

    /// Measured editing efficiency in percent (0-100)
    #[arg(long)]
    pub efficiency: f64,

    /// Free-form notes stored in the encrypted payload
    #[arg(long, default_value = "")]
    pub notes: String,
}

pub async fn cmd_submit(opts: &LedgerOpts, args: &SubmitArgs) -> Result<()> {
    let conn = connect(opts).await?;
    let writer = signer(&conn, Action::Submission)?;

    let payload = ExperimentPayload {
        gene_type: args.gene_type.clone(),
        grna: args.grna.clone(),
        efficiency: args.efficiency,
        notes: args.notes.clone(),
    };
    let record = conn
        .manager
        .create(&writer, payload)
        .await
        .map_err(user_error(Action::Submission))?;

    let human = format!("submitted {}", record_line(&record));
    print_success(opts, serde_json::to_value(&record)?, human, vec![])
}
