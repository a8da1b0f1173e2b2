//! Global CLI options and ledger/session resolution.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use gene_ledger::{Address, FsLedger, WalletSession};
use gene_records::{RecordManager, RecordsConfig};
use tracing::debug;

/// Global options for CLI commands.
///
/// These options apply to all commands and can be set via env vars.
#[derive(Args, Debug, Clone)]
pub struct LedgerOpts {
    /// Ledger directory (env: GENE_LEDGER)
    #[arg(short = 'l', long, global = true, env = "GENE_LEDGER", default_value = ".")]
    pub ledger: PathBuf,

    /// Wallet account used to sign writes (env: GENE_ACCOUNT)
    #[arg(short = 'a', long, global = true, env = "GENE_ACCOUNT")]
    pub account: Option<String>,

    /// JSON output envelope
    #[arg(long, global = true)]
    pub json: bool,

    /// Pretty-print JSON output (implies --json)
    #[arg(long, global = true)]
    pub pretty: bool,
}

/// Everything a command needs to talk to the ledger.
pub struct Connection {
    pub session: WalletSession,
    pub manager: RecordManager,
}

/// Open the ledger directory and connect the wallet when an account is given.
pub async fn connect(opts: &LedgerOpts) -> Result<Connection> {
    let config = RecordsConfig::from_env();
    let ledger = FsLedger::open(&opts.ledger)
        .await
        .with_context(|| format!("open ledger at '{}'", opts.ledger.display()))?;

    let accounts: Vec<Address> = opts.account.iter().map(|a| Address::new(a.as_str())).collect();
    let session =
        WalletSession::new(Arc::new(ledger), accounts).with_call_timeout(config.call_timeout);
    if opts.account.is_some() {
        session.request_accounts();
    }
    debug!(
        ledger = %opts.ledger.display(),
        account = ?session.active_account().map(|a| a.to_string()),
        "ledger opened"
    );

    Ok(Connection {
        session,
        manager: RecordManager::new(config),
    })
}
