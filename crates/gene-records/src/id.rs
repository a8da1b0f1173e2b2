use std::time::SystemTime;

use gene_codec::RecordId;

use crate::{RecordsError, RecordsResult, clock::since_epoch};

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SUFFIX_LEN: usize = 7;

/// New id of the form `<unix-millis>-<7 base36 chars>`.
pub fn generate_record_id(now: SystemTime) -> RecordsResult<RecordId> {
    let mut entropy = [0u8; SUFFIX_LEN];
    getrandom::getrandom(&mut entropy).map_err(|err| RecordsError::Entropy(err.to_string()))?;
    Ok(format_record_id(since_epoch(now).as_millis(), entropy))
}

fn format_record_id(unix_ms: u128, entropy: [u8; SUFFIX_LEN]) -> RecordId {
    let suffix: String = entropy
        .iter()
        .map(|b| BASE36[(*b as usize) % BASE36.len()] as char)
        .collect();
    RecordId::new(format!("{unix_ms}-{suffix}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn formats_time_and_suffix() {
        let id = format_record_id(1_712_345_678_901, [0, 1, 10, 35, 36, 71, 255]);
        assert_eq!(id.as_str(), "1712345678901-01az0z3");
    }

    #[test]
    fn generated_ids_are_unique_within_one_millisecond() {
        let now = UNIX_EPOCH + Duration::from_millis(1_700_000_000_000);
        let ids: HashSet<_> = (0..64)
            .map(|_| generate_record_id(now).expect("id"))
            .collect();
        assert_eq!(ids.len(), 64);
        for id in ids {
            let (millis, suffix) = id.as_str().split_once('-').expect("separator");
            assert_eq!(millis, "1700000000000");
            assert_eq!(suffix.len(), SUFFIX_LEN);
            assert!(suffix.bytes().all(|b| BASE36.contains(&b)));
        }
    }
}
