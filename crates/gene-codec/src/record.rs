use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::{Map, Value};
use std::fmt;

use crate::DecodeError;

/// Ledger key holding the record index.
pub const INDEX_KEY: &str = "record_keys";
/// Prefix of per-record ledger keys.
pub const RECORD_KEY_PREFIX: &str = "record_";

/// Opaque record identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Ledger key under which this record is stored.
    pub fn ledger_key(&self) -> String {
        format!("{RECORD_KEY_PREFIX}{}", self.0)
    }

    /// Inverse of [`RecordId::ledger_key`]; `None` for the index key and foreign keys.
    pub fn from_ledger_key(key: &str) -> Option<Self> {
        if key == INDEX_KEY {
            return None;
        }
        key.strip_prefix(RECORD_KEY_PREFIX)
            .filter(|rest| !rest.is_empty())
            .map(Self::new)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    #[default]
    Pending,
    Verified,
    Rejected,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Pending => "pending",
            RecordStatus::Verified => "verified",
            RecordStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, RecordStatus::Pending)
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JSON object stored under `record_<id>`.
///
/// Fields this crate does not know about are carried in `extra` so that a
/// status rewrite leaves them untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredRecord {
    /// Envelope produced by [`crate::encode`].
    pub data: String,
    pub timestamp: u64,
    pub owner: String,
    pub gene_type: String,
    pub efficiency: f64,
    #[serde(default, deserialize_with = "status_or_pending")]
    pub status: RecordStatus,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

const STATUS_NAMES: &[&str] = &["pending", "verified", "rejected"];

// Older writers omit `status`, store null, or store an empty string; all mean pending.
fn status_or_pending<'de, D>(deserializer: D) -> Result<RecordStatus, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)?.as_deref() {
        None | Some("") | Some("pending") => Ok(RecordStatus::Pending),
        Some("verified") => Ok(RecordStatus::Verified),
        Some("rejected") => Ok(RecordStatus::Rejected),
        Some(other) => Err(de::Error::unknown_variant(other, STATUS_NAMES)),
    }
}

pub fn encode_record(record: &StoredRecord) -> Vec<u8> {
    serde_json::to_vec(record).unwrap_or_default()
}

pub fn decode_record(bytes: &[u8]) -> Result<StoredRecord, DecodeError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Replace the `status` field of a stored record object, leaving every other
/// member as written, in its original order and number form.
pub fn rewrite_status(bytes: &[u8], status: RecordStatus) -> Result<Vec<u8>, DecodeError> {
    let mut object: Map<String, Value> = serde_json::from_slice(bytes)?;
    object.insert("status".to_string(), Value::String(status.as_str().to_string()));
    Ok(serde_json::to_vec(&object)?)
}
