use crate::{Address, LedgerBackend, LedgerError, LedgerResult, TxAck};
use async_trait::async_trait;
use gene_codec::ContentHash;
use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
    time::Duration,
};
use tokio::sync::Mutex;

/// In-memory ledger with confirmation latency and fault injection for tests.
#[derive(Clone, Default)]
pub struct MemLedger {
    state: Arc<Mutex<MemState>>,
    latency: Duration,
}

#[derive(Default)]
struct MemState {
    entries: BTreeMap<String, Vec<u8>>,
    unavailable: bool,
    block: u64,
    faults: HashMap<String, Fault>,
}

#[derive(Debug, Clone)]
enum Fault {
    Fail(String),
    UserRejected,
}

impl std::fmt::Debug for MemLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemLedger")
            .field("latency", &self.latency)
            .finish_non_exhaustive()
    }
}

impl MemLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every write by `latency` before it is applied, standing in for
    /// block confirmation.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub async fn set_available(&self, available: bool) {
        self.state.lock().await.unavailable = !available;
    }

    /// Make the next write to `key` fail with a generic ledger error.
    pub async fn fail_next_write(&self, key: impl Into<String>, message: impl Into<String>) {
        self.state
            .lock()
            .await
            .faults
            .insert(key.into(), Fault::Fail(message.into()));
    }

    /// Make the next write to `key` fail as if the signer declined it.
    pub async fn reject_next_write(&self, key: impl Into<String>) {
        self.state
            .lock()
            .await
            .faults
            .insert(key.into(), Fault::UserRejected);
    }

    /// Write raw bytes without a signer or confirmation, e.g. to plant malformed values.
    pub async fn seed(&self, key: impl Into<String>, value: impl Into<Vec<u8>>) {
        self.state.lock().await.entries.insert(key.into(), value.into());
    }

    pub async fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.state.lock().await.entries.get(key).cloned()
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn confirm(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

impl MemState {
    fn check_writable(&mut self, key: &str) -> LedgerResult<()> {
        if self.unavailable {
            return Err(LedgerError::Unavailable);
        }
        match self.faults.remove(key) {
            Some(Fault::Fail(message)) => Err(LedgerError::Failed(message)),
            Some(Fault::UserRejected) => Err(LedgerError::UserRejected),
            None => Ok(()),
        }
    }

    fn apply(&mut self, key: &str, value: &[u8], signer: &Address) -> TxAck {
        self.block += 1;
        self.entries.insert(key.to_string(), value.to_vec());
        TxAck::confirm(self.block, signer, key, value)
    }
}

#[async_trait]
impl LedgerBackend for MemLedger {
    async fn is_available(&self) -> LedgerResult<bool> {
        Ok(!self.state.lock().await.unavailable)
    }

    async fn get(&self, key: &str) -> LedgerResult<Vec<u8>> {
        let state = self.state.lock().await;
        if state.unavailable {
            return Err(LedgerError::Unavailable);
        }
        Ok(state.entries.get(key).cloned().unwrap_or_default())
    }

    async fn set(&self, key: &str, value: &[u8], signer: &Address) -> LedgerResult<TxAck> {
        self.confirm().await;
        let mut state = self.state.lock().await;
        state.check_writable(key)?;
        Ok(state.apply(key, value, signer))
    }

    async fn compare_and_set(
        &self,
        key: &str,
        expected: ContentHash,
        value: &[u8],
        signer: &Address,
    ) -> LedgerResult<TxAck> {
        self.confirm().await;
        let mut state = self.state.lock().await;
        state.check_writable(key)?;
        let actual = state
            .entries
            .get(key)
            .map(|bytes| ContentHash::of_bytes(bytes))
            .unwrap_or_else(ContentHash::absent);
        if actual != expected {
            return Err(LedgerError::Conflict {
                key: key.to_string(),
                expected,
                actual,
            });
        }
        Ok(state.apply(key, value, signer))
    }

    async fn scan_keys(&self, prefix: &str) -> LedgerResult<Vec<String>> {
        let state = self.state.lock().await;
        if state.unavailable {
            return Err(LedgerError::Unavailable);
        }
        Ok(state
            .entries
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> Address {
        Address::new("0x00000000000000000000000000000000000000a1")
    }

    #[tokio::test(flavor = "current_thread")]
    async fn absent_keys_read_as_empty() {
        let ledger = MemLedger::new();
        assert!(ledger.get("record_keys").await.expect("get").is_empty());
        ledger.set("record_keys", b"[]", &signer()).await.expect("set");
        assert_eq!(ledger.get("record_keys").await.expect("get"), b"[]");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn compare_and_set_detects_stale_versions() {
        let ledger = MemLedger::new();
        let first = ledger
            .compare_and_set("k", ContentHash::absent(), b"one", &signer())
            .await
            .expect("first write");
        let stale = ledger
            .compare_and_set("k", ContentHash::absent(), b"two", &signer())
            .await
            .expect_err("stale write");
        match stale {
            LedgerError::Conflict { actual, .. } => assert_eq!(actual, ContentHash::of_bytes(b"one")),
            other => panic!("unexpected error: {other}"),
        }
        let second = ledger
            .compare_and_set("k", ContentHash::of_bytes(b"one"), b"two", &signer())
            .await
            .expect("second write");
        assert_eq!(second.block, first.block + 1);
        assert_eq!(ledger.raw("k").await.as_deref(), Some(&b"two"[..]));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn injected_faults_fire_once() {
        let ledger = MemLedger::new();
        ledger.reject_next_write("k").await;
        let err = ledger.set("k", b"v", &signer()).await.expect_err("rejected");
        assert!(err.is_user_rejection());
        ledger.fail_next_write("k", "out of gas").await;
        assert!(matches!(
            ledger.set("k", b"v", &signer()).await,
            Err(LedgerError::Failed(msg)) if msg == "out of gas"
        ));
        ledger.set("k", b"v", &signer()).await.expect("third attempt succeeds");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn unavailable_ledger_refuses_reads_and_writes() {
        let ledger = MemLedger::new();
        ledger.set_available(false).await;
        assert!(!ledger.is_available().await.expect("probe"));
        assert!(matches!(ledger.get("k").await, Err(LedgerError::Unavailable)));
        assert!(matches!(
            ledger.set("k", b"v", &signer()).await,
            Err(LedgerError::Unavailable)
        ));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn scan_filters_by_prefix() {
        let ledger = MemLedger::new();
        ledger.seed("record_keys", "[]").await;
        ledger.seed("record_2", "{}").await;
        ledger.seed("record_1", "{}").await;
        ledger.seed("other", "{}").await;
        let keys = ledger.scan_keys("record_").await.expect("scan");
        assert_eq!(keys, vec!["record_1", "record_2", "record_keys"]);
    }
}
