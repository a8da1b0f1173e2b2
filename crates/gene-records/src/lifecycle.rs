use std::{collections::HashSet, sync::Arc};

use gene_codec::{
    ExperimentPayload, RECORD_KEY_PREFIX, RecordId, RecordStatus, StoredRecord, decode_record,
    encode, encode_record, rewrite_status,
};
use gene_ledger::{LedgerReader, LedgerWriter};
use serde::Serialize;
use serde_json::Map;
use tracing::{error, info, warn};

use crate::{
    Record, RecordsConfig, RecordsError, RecordsResult,
    clock::{Clock, SystemClock, since_epoch},
    id::generate_record_id,
    index::{append_index, load_index},
};

/// Terminal status a pending record can move to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Verified,
    Rejected,
}

impl Verdict {
    pub fn status(&self) -> RecordStatus {
        match self {
            Verdict::Verified => RecordStatus::Verified,
            Verdict::Rejected => RecordStatus::Rejected,
        }
    }
}

/// Outcome of [`RecordManager::reconcile`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Stored records that were missing from the index and have been appended.
    pub adopted: Vec<RecordId>,
    /// Indexed ids with no stored record. Left in place.
    pub dangling: Vec<RecordId>,
    /// Unindexed keys whose contents could not be decoded. Left unindexed.
    pub unreadable: Vec<RecordId>,
}

impl ReconcileReport {
    pub fn is_clean(&self) -> bool {
        self.adopted.is_empty() && self.dangling.is_empty() && self.unreadable.is_empty()
    }
}

/// Creates, lists and transitions experiment records on a ledger.
pub struct RecordManager {
    config: RecordsConfig,
    clock: Arc<dyn Clock>,
}

impl RecordManager {
    pub fn new(config: RecordsConfig) -> Self {
        Self {
            config,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &RecordsConfig {
        &self.config
    }

    /// Load every indexed record, newest first.
    ///
    /// Never fails: an unavailable ledger yields an empty list and records that
    /// cannot be read or decoded are logged and skipped. Records with equal
    /// timestamps keep their index order.
    pub async fn load_all<R: LedgerReader + ?Sized>(&self, reader: &R) -> Vec<Record> {
        match reader.is_available().await {
            Ok(true) => {}
            Ok(false) => {
                error!("ledger is not available; no records loaded");
                return Vec::new();
            }
            Err(err) => {
                error!(%err, "ledger availability probe failed; no records loaded");
                return Vec::new();
            }
        }

        let index = match load_index(reader).await {
            Ok(index) => index,
            Err(err) => {
                error!(%err, "failed to read record index");
                return Vec::new();
            }
        };

        let mut seen = HashSet::with_capacity(index.len());
        let mut records = Vec::with_capacity(index.len());
        for id in &index.ids {
            if !seen.insert(id) {
                continue;
            }
            match fetch_stored(reader, id).await {
                Ok(Some(stored)) => records.push(Record::from_stored(id.clone(), stored)),
                Ok(None) => warn!(%id, "indexed record is missing from the ledger"),
                Err(err) => warn!(%id, %err, "skipping unreadable record"),
            }
        }
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        info!(loaded = records.len(), indexed = index.len(), "records loaded");
        records
    }

    /// Load one record by id.
    pub async fn get<R: LedgerReader + ?Sized>(&self, reader: &R, id: &RecordId) -> RecordsResult<Record> {
        let stored = fetch_stored(reader, id)
            .await?
            .ok_or_else(|| RecordsError::RecordNotFound(id.clone()))?;
        Ok(Record::from_stored(id.clone(), stored))
    }

    /// Store a new pending record owned by the writer's signer, then index it.
    ///
    /// The record write and the index append are separate ledger calls. If the
    /// append fails the error is returned and the record stays stored but
    /// unindexed until [`RecordManager::reconcile`] adopts it.
    pub async fn create<W: LedgerWriter + ?Sized>(
        &self,
        writer: &W,
        fields: ExperimentPayload,
    ) -> RecordsResult<Record> {
        validate(&fields)?;
        let now = self.clock.now();
        let id = generate_record_id(now)?;
        let stored = StoredRecord {
            data: encode(&fields),
            timestamp: since_epoch(now).as_secs(),
            owner: writer.signer().as_str().to_string(),
            gene_type: fields.gene_type,
            efficiency: fields.efficiency,
            status: RecordStatus::Pending,
            extra: Map::new(),
        };

        writer.set(&id.ledger_key(), &encode_record(&stored)).await?;

        let indexed = match load_index(writer).await {
            Ok(index) => {
                append_index(writer, index, std::slice::from_ref(&id), self.config.index_retry_limit)
                    .await
            }
            Err(err) => Err(err.into()),
        };
        if let Err(err) = indexed {
            warn!(%id, %err, "record stored but not indexed; reconcile will adopt it");
            return Err(err);
        }

        info!(%id, gene_type = %stored.gene_type, owner = %stored.owner, "record created");
        Ok(Record::from_stored(id, stored))
    }

    /// Move a pending record to `verdict`.
    ///
    /// Only the owner may transition a record, and only once. The stored object
    /// is rewritten from its raw bytes with nothing but `status` changed.
    pub async fn transition<W: LedgerWriter + ?Sized>(
        &self,
        writer: &W,
        id: &RecordId,
        verdict: Verdict,
    ) -> RecordsResult<Record> {
        if !self.config.confirmation_delay.is_zero() {
            tokio::time::sleep(self.config.confirmation_delay).await;
        }

        let raw = writer.get(&id.ledger_key()).await?;
        if raw.is_empty() {
            return Err(RecordsError::RecordNotFound(id.clone()));
        }
        let mut stored = decode_record(&raw)?;

        let requester = writer.signer();
        if !requester.matches(&stored.owner) {
            return Err(RecordsError::NotOwner {
                id: id.clone(),
                requester: requester.to_string(),
                owner: stored.owner,
            });
        }
        if stored.status.is_terminal() {
            return Err(RecordsError::InvalidTransition {
                id: id.clone(),
                from: stored.status,
                to: verdict.status(),
            });
        }

        stored.status = verdict.status();
        writer
            .set(&id.ledger_key(), &rewrite_status(&raw, stored.status)?)
            .await?;
        info!(%id, status = %stored.status, "record transitioned");
        Ok(Record::from_stored(id.clone(), stored))
    }

    pub async fn verify<W: LedgerWriter + ?Sized>(&self, writer: &W, id: &RecordId) -> RecordsResult<Record> {
        self.transition(writer, id, Verdict::Verified).await
    }

    pub async fn reject<W: LedgerWriter + ?Sized>(&self, writer: &W, id: &RecordId) -> RecordsResult<Record> {
        self.transition(writer, id, Verdict::Rejected).await
    }

    /// Re-derive the index from a scan of stored record keys.
    ///
    /// Orphaned records (stored but never indexed) are appended oldest first.
    /// Indexed ids without a stored record are reported but kept, since the
    /// index never shrinks.
    pub async fn reconcile<W: LedgerWriter + ?Sized>(&self, writer: &W) -> RecordsResult<ReconcileReport> {
        let index = load_index(writer).await?;
        let keys = writer.scan_keys(RECORD_KEY_PREFIX).await?;

        let mut report = ReconcileReport::default();
        let mut stored_ids = HashSet::new();
        let mut orphans = Vec::new();
        for key in keys {
            let Some(id) = RecordId::from_ledger_key(&key) else {
                continue;
            };
            stored_ids.insert(id.clone());
            if index.contains(&id) {
                continue;
            }
            match fetch_stored(writer, &id).await {
                Ok(Some(stored)) => orphans.push((stored.timestamp, id)),
                Ok(None) => {}
                Err(err) => {
                    warn!(%id, %err, "orphaned key holds an unreadable record");
                    report.unreadable.push(id);
                }
            }
        }

        report.dangling = index
            .ids
            .iter()
            .filter(|id| !stored_ids.contains(*id))
            .cloned()
            .collect();

        orphans.sort();
        report.adopted = orphans.into_iter().map(|(_, id)| id).collect();
        if !report.adopted.is_empty() {
            append_index(writer, index, &report.adopted, self.config.index_retry_limit).await?;
        }

        info!(
            adopted = report.adopted.len(),
            dangling = report.dangling.len(),
            unreadable = report.unreadable.len(),
            "index reconciled"
        );
        Ok(report)
    }
}

async fn fetch_stored<R: LedgerReader + ?Sized>(
    reader: &R,
    id: &RecordId,
) -> RecordsResult<Option<StoredRecord>> {
    let raw = reader.get(&id.ledger_key()).await?;
    if raw.is_empty() {
        return Ok(None);
    }
    Ok(Some(decode_record(&raw)?))
}

fn validate(fields: &ExperimentPayload) -> RecordsResult<()> {
    if fields.gene_type.trim().is_empty() {
        return Err(RecordsError::Validation("gene type is required".into()));
    }
    if fields.grna.trim().is_empty() {
        return Err(RecordsError::Validation("gRNA sequence is required".into()));
    }
    if !(0.0..=100.0).contains(&fields.efficiency) {
        return Err(RecordsError::Validation(format!(
            "efficiency must be between 0 and 100, got {}",
            fields.efficiency
        )));
    }
    Ok(())
}
