mod commands;
mod opts;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::list::ListArgs;
use commands::submit::SubmitArgs;
use commands::transition::TransitionArgs;
use opts::LedgerOpts;

#[derive(Parser, Debug)]
#[command(name = "generec", version, about = "Gene-editing experiment records on a ledger")]
struct Cli {
    #[command(flatten)]
    opts: LedgerOpts,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit a new experiment record
    Submit(SubmitArgs),

    /// List records, newest first
    List(ListArgs),

    /// Mark one of your pending records verified
    Verify(TransitionArgs),

    /// Mark one of your pending records rejected
    Reject(TransitionArgs),

    /// Show record counts and the efficiency histogram
    Stats,

    /// Index stored records that are missing from the record index
    Reconcile,

    /// Show the connected wallet accounts
    Accounts,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Values already in the environment win over .env.
    dotenvy::dotenv().ok();
    setup_logging();

    let cli = Cli::parse();
    let opts = &cli.opts;

    match cli.command {
        Command::Submit(args) => commands::submit::cmd_submit(opts, &args).await,
        Command::List(args) => commands::list::cmd_list(opts, &args).await,
        Command::Verify(args) => commands::transition::cmd_verify(opts, &args).await,
        Command::Reject(args) => commands::transition::cmd_reject(opts, &args).await,
        Command::Stats => commands::stats::cmd_stats(opts).await,
        Command::Reconcile => commands::reconcile::cmd_reconcile(opts).await,
        Command::Accounts => commands::accounts::cmd_accounts(opts).await,
    }
}

/// Log to stderr so stdout stays parseable; `RUST_LOG` overrides the default.
fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .init();
}
