//! Simulated-encryption envelope for experiment payloads.
//!
//! The envelope is `FHE-` followed by standard base64 of the payload's JSON.
//! It is a reversible encoding and provides no confidentiality: anyone who can
//! read the ledger can read the payload.

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

use crate::DecodeError;

/// Tag marking a value as "encrypted".
pub const ENCRYPTED_TAG: &str = "FHE-";

/// Structured fields submitted for one experiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentPayload {
    #[serde(rename = "geneType")]
    pub gene_type: String,
    /// Guide-RNA sequence.
    #[serde(rename = "gRNA")]
    pub grna: String,
    pub efficiency: f64,
    #[serde(default)]
    pub notes: String,
}

/// Wrap a payload in the tagged envelope. Deterministic for a given payload.
pub fn encode(payload: &ExperimentPayload) -> String {
    // Serializing a struct of strings and a float into a Vec cannot fail.
    let json = serde_json::to_vec(payload).unwrap_or_default();
    format!("{ENCRYPTED_TAG}{}", STANDARD.encode(json))
}

/// Open an envelope produced by [`encode`].
pub fn decode(encoded: &str) -> Result<ExperimentPayload, DecodeError> {
    let body = encoded
        .strip_prefix(ENCRYPTED_TAG)
        .ok_or(DecodeError::MissingTag)?;
    let json = STANDARD.decode(body)?;
    Ok(serde_json::from_slice(&json)?)
}
