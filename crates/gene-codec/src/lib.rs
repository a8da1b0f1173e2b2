//! Wire formats exchanged with the record ledger: the payload envelope, the
//! stored record object, the key index, and the content hash used to version
//! ledger values.

mod hash;
mod index;
mod payload;
mod record;

pub use hash::{ContentHash, HASH_PREFIX, HashParseError};
pub use index::{decode_index, encode_index};
pub use payload::{ENCRYPTED_TAG, ExperimentPayload, decode, encode};
pub use record::{
    INDEX_KEY, RECORD_KEY_PREFIX, RecordId, RecordStatus, StoredRecord, decode_record,
    encode_record, rewrite_status,
};

/// Error returned when stored bytes cannot be interpreted.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("encoded payload missing '{ENCRYPTED_TAG}' tag")]
    MissingTag,
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
