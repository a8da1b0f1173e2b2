//! Gene-editing experiment records on a key-value ledger.
//!
//! Records live under `record_<id>` and are enumerated through the
//! append-only index at `record_keys`. [`RecordManager`] owns every mutation:
//! creation, the single pending → verified/rejected transition, and index
//! reconciliation. [`view`] derives statistics and filtered views from the
//! loaded set.

mod clock;
mod config;
mod error;
mod id;
pub mod index;
mod lifecycle;
pub mod view;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::RecordsConfig;
pub use error::{Action, RecordsError, RecordsResult};
pub use id::generate_record_id;
pub use index::{IndexSnapshot, append_index, load_index};
pub use lifecycle::{ReconcileReport, RecordManager, Verdict};
pub use view::{Stats, aggregate, filter, histogram};

pub use gene_codec::{ExperimentPayload, RecordId, RecordStatus};

use gene_codec::StoredRecord;
use serde::Serialize;

/// A record as presented to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: RecordId,
    /// Opaque payload envelope; see [`gene_codec::decode`].
    pub encoded_payload: String,
    /// Seconds since the Unix epoch.
    pub timestamp: u64,
    pub owner: String,
    pub gene_type: String,
    pub efficiency: f64,
    pub status: RecordStatus,
}

impl Record {
    pub(crate) fn from_stored(id: RecordId, stored: StoredRecord) -> Self {
        Self {
            id,
            encoded_payload: stored.data,
            timestamp: stored.timestamp,
            owner: stored.owner,
            gene_type: stored.gene_type,
            efficiency: stored.efficiency,
            status: stored.status,
        }
    }
}
