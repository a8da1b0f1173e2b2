use sha2::{Digest, Sha256};
use std::fmt;

/// Prefix for serialized hashes (e.g. `sha256:deadbeef`).
pub const HASH_PREFIX: &str = "sha256:";

/// SHA-256 digest of a raw ledger value.
///
/// Used as the version of a key's current contents: absent keys hash as the
/// empty byte string, so "expect absent" and "expect empty" are the same version.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Compute the hash of the provided byte slice.
    pub fn of_bytes(bytes: &[u8]) -> Self {
        let digest = Sha256::digest(bytes);
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&digest);
        ContentHash(arr)
    }

    /// Version of a key that holds nothing.
    pub fn absent() -> Self {
        Self::of_bytes(&[])
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Render the digest as a `sha256:...` hex string.
    pub fn to_hex(&self) -> String {
        format!("{HASH_PREFIX}{}", hex::encode(self.0))
    }

    /// Parse a hash from its `sha256:`-prefixed hex string representation.
    pub fn from_hex_str(s: &str) -> Result<Self, HashParseError> {
        let rest = s.strip_prefix(HASH_PREFIX).ok_or(HashParseError::MissingPrefix)?;
        if rest.len() != 64 {
            return Err(HashParseError::InvalidLength(rest.len()));
        }
        let mut buf = [0u8; 32];
        hex::decode_to_slice(rest, &mut buf).map_err(HashParseError::InvalidHex)?;
        Ok(ContentHash(buf))
    }

    /// Short form for log lines.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..6])
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ContentHash").field(&self.to_hex()).finish()
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl From<[u8; 32]> for ContentHash {
    fn from(value: [u8; 32]) -> Self {
        ContentHash(value)
    }
}

impl TryFrom<&str> for ContentHash {
    type Error = HashParseError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        ContentHash::from_hex_str(value)
    }
}

/// Error returned when a `sha256:` string is malformed.
#[derive(Debug, thiserror::Error)]
pub enum HashParseError {
    #[error("hash string missing '{HASH_PREFIX}' prefix")]
    MissingPrefix,
    #[error("hash hex length must be 64, got {0}")]
    InvalidLength(usize),
    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_format_round_trip() {
        let text = "sha256:0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";
        let hash = ContentHash::from_hex_str(text).expect("parse");
        assert_eq!(hash.to_hex(), text);
        assert!(matches!(
            ContentHash::from_hex_str("0123"),
            Err(HashParseError::MissingPrefix)
        ));
        assert!(matches!(
            ContentHash::from_hex_str("sha256:0123"),
            Err(HashParseError::InvalidLength(4))
        ));
    }

    #[test]
    fn absent_matches_empty_bytes() {
        assert_eq!(ContentHash::absent(), ContentHash::of_bytes(b""));
        assert_eq!(
            ContentHash::absent().to_hex(),
            "sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_ne!(ContentHash::absent(), ContentHash::of_bytes(b"[]"));
    }
}
