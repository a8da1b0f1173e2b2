//! `generec accounts` command.

use anyhow::Result;
use serde_json::json;

use crate::opts::{LedgerOpts, connect};
use crate::output::print_success;

pub async fn cmd_accounts(opts: &LedgerOpts) -> Result<()> {
    let conn = connect(opts).await?;
    let accounts: Vec<String> = conn
        .session
        .request_accounts()
        .into_iter()
        .map(|a| a.to_string())
        .collect();
    let active = conn.session.active_account().map(|a| a.to_string());

    let human = match &active {
        Some(account) => account.clone(),
        None => "no account connected (pass --account or set GENE_ACCOUNT)".to_string(),
    };
    print_success(opts, json!({ "active": active, "accounts": accounts }), human, vec![])
}
