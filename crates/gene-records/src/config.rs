use std::time::Duration;

use crate::view::DEFAULT_EDGES;

#[derive(Debug, Clone)]
pub struct RecordsConfig {
    /// Wait applied before each status transition, standing in for the time the
    /// ledger takes to process the encrypted payload.
    pub confirmation_delay: Duration,
    /// How many lost compare-and-set races an index append tolerates.
    pub index_retry_limit: u32,
    /// Per-call ledger timeout; `None` waits indefinitely.
    pub call_timeout: Option<Duration>,
    /// Upper bucket edges for the efficiency histogram.
    pub histogram_edges: Vec<f64>,
}

impl Default for RecordsConfig {
    fn default() -> Self {
        Self {
            confirmation_delay: Duration::from_secs(3),
            index_retry_limit: 5,
            call_timeout: None,
            histogram_edges: DEFAULT_EDGES.to_vec(),
        }
    }
}

impl RecordsConfig {
    /// Defaults overridden by `GENE_CONFIRMATION_DELAY_MS`, `GENE_INDEX_RETRY_LIMIT`
    /// and `GENE_CALL_TIMEOUT_MS`. Malformed values are logged and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(ms) = parse_var::<u64>(&lookup, "GENE_CONFIRMATION_DELAY_MS") {
            config.confirmation_delay = Duration::from_millis(ms);
        }
        if let Some(limit) = parse_var::<u32>(&lookup, "GENE_INDEX_RETRY_LIMIT") {
            config.index_retry_limit = limit;
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "GENE_CALL_TIMEOUT_MS") {
            // 0 disables the timeout.
            config.call_timeout = (ms > 0).then(|| Duration::from_millis(ms));
        }
        config
    }

    /// Config without artificial delays, for tests and batch tools.
    pub fn immediate() -> Self {
        Self {
            confirmation_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}

fn parse_var<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<T> {
    let raw = lookup(name)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(var = name, value = %raw, "ignoring malformed config value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_without_overrides() {
        let config = RecordsConfig::from_lookup(lookup(&[]));
        assert_eq!(config.confirmation_delay, Duration::from_secs(3));
        assert_eq!(config.index_retry_limit, 5);
        assert_eq!(config.call_timeout, None);
        assert_eq!(config.histogram_edges, vec![0.0, 20.0, 40.0, 60.0, 80.0, 100.0]);
    }

    #[test]
    fn overrides_apply_and_malformed_values_are_ignored() {
        let config = RecordsConfig::from_lookup(lookup(&[
            ("GENE_CONFIRMATION_DELAY_MS", "0"),
            ("GENE_INDEX_RETRY_LIMIT", "many"),
            ("GENE_CALL_TIMEOUT_MS", "2500"),
        ]));
        assert_eq!(config.confirmation_delay, Duration::ZERO);
        assert_eq!(config.index_retry_limit, 5);
        assert_eq!(config.call_timeout, Some(Duration::from_millis(2500)));
    }

    #[test]
    fn zero_timeout_disables_it() {
        let config = RecordsConfig::from_lookup(lookup(&[("GENE_CALL_TIMEOUT_MS", "0")]));
        assert_eq!(config.call_timeout, None);
    }
}
