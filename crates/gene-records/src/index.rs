//! The record index stored under `record_keys`.
//!
//! The index only grows by appends. Each append is a compare-and-set against
//! the hash of the bytes it was derived from, so a concurrent writer's append
//! forces a reload and retry instead of being overwritten.

use gene_codec::{ContentHash, INDEX_KEY, RecordId, decode_index, encode_index};
use gene_ledger::{LedgerError, LedgerReader, LedgerResult, LedgerWriter};
use tracing::{debug, warn};

use crate::{RecordsError, RecordsResult};

/// Index contents together with the version they were read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSnapshot {
    pub ids: Vec<RecordId>,
    pub version: ContentHash,
}

impl IndexSnapshot {
    pub fn contains(&self, id: &RecordId) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Read the index. A malformed value is logged and read as empty; its
/// version still reflects the stored bytes so the next append replaces it.
pub async fn load_index<R: LedgerReader + ?Sized>(reader: &R) -> LedgerResult<IndexSnapshot> {
    let raw = reader.get(INDEX_KEY).await?;
    let version = ContentHash::of_bytes(&raw);
    let ids = match decode_index(&raw) {
        Ok(ids) => ids,
        Err(err) => {
            warn!(%err, bytes = raw.len(), "record index is malformed; treating it as empty");
            Vec::new()
        }
    };
    Ok(IndexSnapshot { ids, version })
}

/// Append `new_ids` (skipping any already present) to the index read as
/// `existing`, retrying on version conflicts up to `retry_limit` times.
pub async fn append_index<W: LedgerWriter + ?Sized>(
    writer: &W,
    existing: IndexSnapshot,
    new_ids: &[RecordId],
    retry_limit: u32,
) -> RecordsResult<IndexSnapshot> {
    let mut base = existing;
    let mut conflicts = 0u32;
    loop {
        let mut ids = base.ids.clone();
        for id in new_ids {
            if !ids.contains(id) {
                ids.push(id.clone());
            }
        }
        if ids.len() == base.ids.len() {
            return Ok(base);
        }

        let bytes = encode_index(&ids);
        match writer.compare_and_set(INDEX_KEY, base.version, &bytes).await {
            Ok(_) => {
                return Ok(IndexSnapshot {
                    ids,
                    version: ContentHash::of_bytes(&bytes),
                });
            }
            Err(LedgerError::Conflict { actual, .. }) => {
                conflicts += 1;
                if conflicts > retry_limit {
                    return Err(RecordsError::IndexContention {
                        attempts: conflicts,
                    });
                }
                debug!(
                    attempt = conflicts,
                    expected = %base.version.short(),
                    found = %actual.short(),
                    "record index changed underneath append; reloading"
                );
                base = load_index(writer).await?;
            }
            Err(err) => return Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use gene_ledger::{Address, MemLedger, SignedClient, TxAck};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn client(ledger: &MemLedger) -> SignedClient {
        SignedClient::new(Arc::new(ledger.clone()), Address::new("0xa11ce"))
    }

    fn ids(raw: &[&str]) -> Vec<RecordId> {
        raw.iter().map(|s| RecordId::new(*s)).collect()
    }

    #[tokio::test(flavor = "current_thread")]
    async fn missing_index_is_empty_at_absent_version() {
        let ledger = MemLedger::new();
        let snapshot = load_index(&client(&ledger)).await.expect("load");
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.version, ContentHash::absent());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn malformed_index_reads_empty_and_is_replaced_on_append() {
        let ledger = MemLedger::new();
        ledger.seed(INDEX_KEY, "{oops").await;
        let writer = client(&ledger);
        let snapshot = load_index(&writer).await.expect("load");
        assert!(snapshot.is_empty());

        let updated = append_index(&writer, snapshot, &ids(&["1-a"]), 0)
            .await
            .expect("append");
        assert_eq!(updated.ids, ids(&["1-a"]));
        assert_eq!(ledger.raw(INDEX_KEY).await.as_deref(), Some(&br#"["1-a"]"#[..]));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn stale_snapshot_reloads_and_keeps_concurrent_append() {
        let ledger = MemLedger::new();
        let writer = client(&ledger);
        let stale = load_index(&writer).await.expect("load");

        // Another writer appends after `stale` was read.
        let fresh = load_index(&writer).await.expect("load");
        append_index(&writer, fresh, &ids(&["1-other"]), 0)
            .await
            .expect("other append");

        let updated = append_index(&writer, stale, &ids(&["2-mine"]), 1)
            .await
            .expect("retrying append");
        assert_eq!(updated.ids, ids(&["1-other", "2-mine"]));
        let reloaded = load_index(&writer).await.expect("reload");
        assert_eq!(reloaded, updated);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn already_indexed_ids_are_not_duplicated() {
        let ledger = MemLedger::new();
        let writer = client(&ledger);
        let first = append_index(&writer, load_index(&writer).await.unwrap(), &ids(&["1-a"]), 0)
            .await
            .expect("append");
        let again = append_index(&writer, first.clone(), &ids(&["1-a"]), 0)
            .await
            .expect("no-op append");
        assert_eq!(again, first);
    }

    /// Writer whose index always appears to have moved.
    struct AlwaysConflicting {
        inner: SignedClient,
        attempts: AtomicU32,
    }

    #[async_trait]
    impl LedgerReader for AlwaysConflicting {
        async fn is_available(&self) -> LedgerResult<bool> {
            self.inner.is_available().await
        }
        async fn get(&self, key: &str) -> LedgerResult<Vec<u8>> {
            self.inner.get(key).await
        }
        async fn scan_keys(&self, prefix: &str) -> LedgerResult<Vec<String>> {
            self.inner.scan_keys(prefix).await
        }
    }

    #[async_trait]
    impl LedgerWriter for AlwaysConflicting {
        fn signer(&self) -> &Address {
            self.inner.signer()
        }
        async fn set(&self, key: &str, value: &[u8]) -> LedgerResult<TxAck> {
            self.inner.set(key, value).await
        }
        async fn compare_and_set(
            &self,
            key: &str,
            expected: ContentHash,
            _value: &[u8],
        ) -> LedgerResult<TxAck> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(LedgerError::Conflict {
                key: key.to_string(),
                expected,
                actual: ContentHash::of_bytes(b"elsewhere"),
            })
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn gives_up_after_retry_limit() {
        let writer = AlwaysConflicting {
            inner: client(&MemLedger::new()),
            attempts: AtomicU32::new(0),
        };
        let snapshot = load_index(&writer).await.expect("load");
        let err = append_index(&writer, snapshot, &ids(&["1-a"]), 3)
            .await
            .expect_err("contention");
        assert!(matches!(err, RecordsError::IndexContention { attempts: 4 }));
        assert_eq!(writer.attempts.load(Ordering::SeqCst), 4);
    }
}
