//! CLI command handlers.

pub mod accounts;
pub mod list;
pub mod reconcile;
pub mod stats;
pub mod submit;
pub mod transition;

use anyhow::anyhow;
use gene_ledger::SignedClient;
use gene_records::{Action, RecordsError};

use crate::opts::Connection;

/// Turn a record store failure into the message shown for `action`.
pub fn user_error(action: Action) -> impl FnOnce(RecordsError) -> anyhow::Error {
    move |err| anyhow!(err.user_message(action))
}

/// Signing client for the connected account, or the "connect wallet" error.
pub fn signer(conn: &Connection, action: Action) -> anyhow::Result<SignedClient> {
    conn.session
        .signed_client()
        .map_err(|err| user_error(action)(RecordsError::from(err)))
}
