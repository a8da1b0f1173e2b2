use crate::{DecodeError, RecordId};

/// Serialize the index as a UTF-8 JSON array of id strings.
pub fn encode_index(ids: &[RecordId]) -> Vec<u8> {
    serde_json::to_vec(ids).unwrap_or_default()
}

/// Parse an index value. An empty value is an empty index, not an error.
pub fn decode_index(bytes: &[u8]) -> Result<Vec<RecordId>, DecodeError> {
    if bytes.is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_slice(bytes)?)
}
