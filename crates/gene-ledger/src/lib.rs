//! Key-value ledger abstractions: the backend contract, read-only and signed
//! clients, the wallet session that hands them out, and in-memory and
//! filesystem backends.

mod client;
mod fs_ledger;
mod mem_ledger;
mod session;

pub use client::{ReadOnlyClient, SignedClient};
pub use fs_ledger::FsLedger;
pub use mem_ledger::MemLedger;
pub use session::WalletSession;

use async_trait::async_trait;
use gene_codec::ContentHash;
use std::{fmt, io, path::PathBuf, sync::Arc, time::Duration};

pub type LedgerResult<T> = Result<T, LedgerError>;
pub type DynLedger = Arc<dyn LedgerBackend>;

/// Contract with the backing ledger.
///
/// `get` returns an empty vector for absent keys. `compare_and_set` writes only
/// when the hash of the key's current bytes equals `expected`.
#[async_trait]
pub trait LedgerBackend: Send + Sync {
    async fn is_available(&self) -> LedgerResult<bool>;
    async fn get(&self, key: &str) -> LedgerResult<Vec<u8>>;
    async fn set(&self, key: &str, value: &[u8], signer: &Address) -> LedgerResult<TxAck>;
    async fn compare_and_set(
        &self,
        key: &str,
        expected: ContentHash,
        value: &[u8],
        signer: &Address,
    ) -> LedgerResult<TxAck>;
    async fn scan_keys(&self, prefix: &str) -> LedgerResult<Vec<String>>;
}

/// Read capability handed to code that only lists records.
#[async_trait]
pub trait LedgerReader: Send + Sync {
    /// Liveness probe; callers check it before reading.
    async fn is_available(&self) -> LedgerResult<bool>;
    async fn get(&self, key: &str) -> LedgerResult<Vec<u8>>;
    async fn scan_keys(&self, prefix: &str) -> LedgerResult<Vec<String>>;
}

/// Write capability bound to an authenticated signer.
#[async_trait]
pub trait LedgerWriter: LedgerReader {
    fn signer(&self) -> &Address;
    async fn set(&self, key: &str, value: &[u8]) -> LedgerResult<TxAck>;
    async fn compare_and_set(
        &self,
        key: &str,
        expected: ContentHash,
        value: &[u8],
    ) -> LedgerResult<TxAck>;
}

/// Acknowledgement returned once a write is confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxAck {
    pub tx_hash: ContentHash,
    pub block: u64,
}

impl TxAck {
    pub(crate) fn confirm(block: u64, signer: &Address, key: &str, value: &[u8]) -> Self {
        let mut preimage = Vec::with_capacity(key.len() + value.len() + 64);
        preimage.extend_from_slice(&block.to_be_bytes());
        preimage.extend_from_slice(signer.as_str().as_bytes());
        preimage.push(0);
        preimage.extend_from_slice(key.as_bytes());
        preimage.push(0);
        preimage.extend_from_slice(value);
        Self {
            tx_hash: ContentHash::of_bytes(&preimage),
            block,
        }
    }
}

/// Account address of a wallet identity.
///
/// Addresses compare case-insensitively, matching how checksummed and
/// lowercase renderings of the same account are treated.
#[derive(Debug, Clone)]
pub struct Address(String);

impl Address {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}

impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.matches(&other.0)
    }
}

impl Eq for Address {}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("ledger is not available")]
    Unavailable,
    #[error("no signer available; connect a wallet first")]
    NoSigner,
    #[error("user rejected transaction")]
    UserRejected,
    #[error("ledger call failed: {0}")]
    Failed(String),
    #[error("version conflict on '{key}': expected {expected}, found {actual}")]
    Conflict {
        key: String,
        expected: ContentHash,
        actual: ContentHash,
    },
    #[error("ledger call on '{key}' timed out after {after:?}")]
    Timeout { key: String, after: Duration },
}

impl LedgerError {
    /// True when the signer explicitly declined the transaction.
    pub fn is_user_rejection(&self) -> bool {
        matches!(self, LedgerError::UserRejected)
    }
}

pub(crate) fn io_error(path: impl Into<PathBuf>, err: io::Error) -> LedgerError {
    LedgerError::Io {
        path: path.into(),
        source: err,
    }
}
