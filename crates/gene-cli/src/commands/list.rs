//! `generec list` command.

use anyhow::Result;
use clap::Args;
use gene_records::{Record, filter, view};

use crate::opts::{LedgerOpts, connect};
use crate::output::{print_success, record_table};

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only show records whose gene type or id contains this term
    #[arg(long, short = 's', default_value = "")]
    pub search: String,

    /// Only show your own pending records (requires --account)
    #[arg(long)]
    pub actionable: bool,
}

pub async fn cmd_list(opts: &LedgerOpts, args: &ListArgs) -> Result<()> {
    let conn = connect(opts).await?;
    let records = conn
        .manager
        .load_all(&conn.session.read_only_client())
        .await;

    let mut warnings = Vec::new();
    let candidates: Vec<Record> = if args.actionable {
        let viewer = conn.session.active_account();
        if viewer.is_none() {
            warnings.push("no account connected; nothing is actionable".to_string());
        }
        view::actionable(&records, viewer.as_ref())
            .into_iter()
            .cloned()
            .collect()
    } else {
        records
    };
    let shown = filter(&candidates, &args.search);

    let human = if shown.is_empty() {
        "no records".to_string()
    } else {
        record_table(shown.iter().copied())
    };
    print_success(opts, serde_json::to_value(&shown)?, human, warnings)
}
