use std::{future::Future, time::Duration};

use async_trait::async_trait;
use gene_codec::ContentHash;
use tokio::time::timeout;

use crate::{Address, DynLedger, LedgerError, LedgerReader, LedgerResult, LedgerWriter, TxAck};

async fn bounded<T, F>(limit: Option<Duration>, key: &str, call: F) -> LedgerResult<T>
where
    F: Future<Output = LedgerResult<T>>,
{
    match limit {
        None => call.await,
        Some(after) => timeout(after, call).await.unwrap_or_else(|_| {
            Err(LedgerError::Timeout {
                key: key.to_string(),
                after,
            })
        }),
    }
}

/// Read-only view of a ledger; needs no signer.
#[derive(Clone)]
pub struct ReadOnlyClient {
    backend: DynLedger,
    call_timeout: Option<Duration>,
}

impl ReadOnlyClient {
    pub fn new(backend: DynLedger) -> Self {
        Self {
            backend,
            call_timeout: None,
        }
    }

    pub fn with_call_timeout(mut self, call_timeout: Option<Duration>) -> Self {
        self.call_timeout = call_timeout;
        self
    }
}

#[async_trait]
impl LedgerReader for ReadOnlyClient {
    async fn is_available(&self) -> LedgerResult<bool> {
        bounded(self.call_timeout, "<probe>", self.backend.is_available()).await
    }

    async fn get(&self, key: &str) -> LedgerResult<Vec<u8>> {
        bounded(self.call_timeout, key, self.backend.get(key)).await
    }

    async fn scan_keys(&self, prefix: &str) -> LedgerResult<Vec<String>> {
        bounded(self.call_timeout, prefix, self.backend.scan_keys(prefix)).await
    }
}

/// Ledger client bound to a signer; every write is attributed to it.
#[derive(Clone)]
pub struct SignedClient {
    reader: ReadOnlyClient,
    signer: Address,
}

impl SignedClient {
    pub fn new(backend: DynLedger, signer: Address) -> Self {
        Self {
            reader: ReadOnlyClient::new(backend),
            signer,
        }
    }

    pub fn with_call_timeout(mut self, call_timeout: Option<Duration>) -> Self {
        self.reader = self.reader.with_call_timeout(call_timeout);
        self
    }

    /// Drop the write capability.
    pub fn read_only(&self) -> ReadOnlyClient {
        self.reader.clone()
    }
}

#[async_trait]
impl LedgerReader for SignedClient {
    async fn is_available(&self) -> LedgerResult<bool> {
        self.reader.is_available().await
    }

    async fn get(&self, key: &str) -> LedgerResult<Vec<u8>> {
        self.reader.get(key).await
    }

    async fn scan_keys(&self, prefix: &str) -> LedgerResult<Vec<String>> {
        self.reader.scan_keys(prefix).await
    }
}

#[async_trait]
impl LedgerWriter for SignedClient {
    fn signer(&self) -> &Address {
        &self.signer
    }

    async fn set(&self, key: &str, value: &[u8]) -> LedgerResult<TxAck> {
        let ack = bounded(
            self.reader.call_timeout,
            key,
            self.reader.backend.set(key, value, &self.signer),
        )
        .await?;
        tracing::debug!(key, tx = %ack.tx_hash.short(), block = ack.block, "ledger write confirmed");
        Ok(ack)
    }

    async fn compare_and_set(
        &self,
        key: &str,
        expected: ContentHash,
        value: &[u8],
    ) -> LedgerResult<TxAck> {
        let ack = bounded(
            self.reader.call_timeout,
            key,
            self.reader
                .backend
                .compare_and_set(key, expected, value, &self.signer),
        )
        .await?;
        tracing::debug!(key, tx = %ack.tx_hash.short(), block = ack.block, "ledger swap confirmed");
        Ok(ack)
    }
}
