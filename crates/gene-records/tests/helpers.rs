//! Shared fixtures for record store integration tests.
//!
//! Each integration test compiles this module separately, so some helpers are
//! unused in any given test binary.

#![allow(dead_code)]

use std::{sync::Arc, time::Duration};

use gene_ledger::{Address, MemLedger, ReadOnlyClient, SignedClient};
use gene_records::{ExperimentPayload, ManualClock, Record, RecordManager, RecordsConfig};

pub const ALICE: &str = "0xA11cE00000000000000000000000000000000001";
pub const BOB: &str = "0xB0b0000000000000000000000000000000000002";

/// Unix time the manual clock starts at (2023-11-14T22:13:20Z).
pub const START_MS: u64 = 1_700_000_000_000;

pub struct Harness {
    pub ledger: MemLedger,
    pub clock: Arc<ManualClock>,
    pub manager: RecordManager,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_ledger(MemLedger::new(), RecordsConfig::immediate())
    }

    pub fn with_ledger(ledger: MemLedger, config: RecordsConfig) -> Self {
        let clock = Arc::new(ManualClock::at_unix_ms(START_MS));
        let manager = RecordManager::new(config).with_clock(clock.clone());
        Self {
            ledger,
            clock,
            manager,
        }
    }

    pub fn writer(&self, who: &str) -> SignedClient {
        SignedClient::new(Arc::new(self.ledger.clone()), Address::new(who))
    }

    pub fn reader(&self) -> ReadOnlyClient {
        ReadOnlyClient::new(Arc::new(self.ledger.clone()))
    }

    /// Create a record as `who`, then move the clock forward one second so the
    /// next record sorts strictly newer.
    pub async fn create(&self, who: &str, gene_type: &str, efficiency: f64) -> Record {
        let record = self
            .manager
            .create(&self.writer(who), experiment(gene_type, efficiency))
            .await
            .expect("create record");
        self.clock.advance(Duration::from_secs(1));
        record
    }
}

pub fn experiment(gene_type: &str, efficiency: f64) -> ExperimentPayload {
    ExperimentPayload {
        gene_type: gene_type.into(),
        grna: "GAGTCCGAGCAGAAGAAGAA".into(),
        efficiency,
        notes: "integration fixture".into(),
    }
}

pub async fn raw_json(ledger: &MemLedger, key: &str) -> serde_json::Value {
    let bytes = ledger.raw(key).await.expect("key present");
    serde_json::from_slice(&bytes).expect("stored JSON")
}
