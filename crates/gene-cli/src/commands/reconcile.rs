//! `generec reconcile` command.

use anyhow::Result;
use gene_records::Action;

use super::{signer, user_error};
use crate::opts::{LedgerOpts, connect};
use crate::output::print_success;

pub async fn cmd_reconcile(opts: &LedgerOpts) -> Result<()> {
    let conn = connect(opts).await?;
    let writer = signer(&conn, Action::Reconciliation)?;
    let report = conn
        .manager
        .reconcile(&writer)
        .await
        .map_err(user_error(Action::Reconciliation))?;

    let mut warnings = Vec::new();
    for id in &report.dangling {
        warnings.push(format!("indexed record {id} has no stored data"));
    }
    for id in &report.unreadable {
        warnings.push(format!("stored record {id} is unreadable and stays unindexed"));
    }

    let human = if report.adopted.is_empty() {
        "index is up to date".to_string()
    } else {
        let ids: Vec<&str> = report.adopted.iter().map(|id| id.as_str()).collect();
        format!("indexed {} orphaned record(s): {}", ids.len(), ids.join(", "))
    };
    print_success(opts, serde_json::to_value(&report)?, human, warnings)
}
