//! Pure projections over a loaded record set.

use gene_codec::RecordStatus;
use gene_ledger::Address;
use serde::Serialize;

use crate::Record;

/// Upper edges of the default efficiency buckets.
pub const DEFAULT_EDGES: [f64; 6] = [0.0, 20.0, 40.0, 60.0, 80.0, 100.0];

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Stats {
    pub total: usize,
    pub verified: usize,
    pub pending: usize,
    pub rejected: usize,
    pub avg_efficiency: f64,
}

pub fn aggregate(records: &[Record]) -> Stats {
    let mut stats = Stats {
        total: records.len(),
        verified: 0,
        pending: 0,
        rejected: 0,
        avg_efficiency: 0.0,
    };
    let mut sum = 0.0;
    for record in records {
        match record.status {
            RecordStatus::Pending => stats.pending += 1,
            RecordStatus::Verified => stats.verified += 1,
            RecordStatus::Rejected => stats.rejected += 1,
        }
        sum += record.efficiency;
    }
    if stats.total > 0 {
        stats.avg_efficiency = sum / stats.total as f64;
    }
    stats
}

/// Count records per bucket, one bucket per edge.
///
/// Bucket `i > 0` holds `edges[i-1] < efficiency <= edges[i]`; bucket 0 holds
/// everything `<= edges[0]`, so an efficiency of exactly 0 is counted there.
/// Values above the last edge (and NaN) are not counted.
pub fn histogram(records: &[Record], edges: &[f64]) -> Vec<usize> {
    let mut counts = vec![0; edges.len()];
    for record in records {
        let e = record.efficiency;
        let bucket = edges.iter().enumerate().position(|(i, &upper)| {
            let above_lower = i == 0 || e > edges[i - 1];
            above_lower && e <= upper
        });
        if let Some(i) = bucket {
            counts[i] += 1;
        }
    }
    counts
}

/// Records whose gene type or id contains `term`, ignoring case. An empty term
/// keeps everything. Input order is preserved.
pub fn filter<'a>(records: &'a [Record], term: &str) -> Vec<&'a Record> {
    let needle = term.to_lowercase();
    records
        .iter()
        .filter(|r| {
            needle.is_empty()
                || r.gene_type.to_lowercase().contains(&needle)
                || r.id.as_str().to_lowercase().contains(&needle)
        })
        .collect()
}

pub fn is_owner(record: &Record, viewer: &Address) -> bool {
    viewer.matches(&record.owner)
}

/// Records the viewer may verify or reject: their own, still pending.
pub fn actionable<'a>(records: &'a [Record], viewer: Option<&Address>) -> Vec<&'a Record> {
    let Some(viewer) = viewer else {
        return Vec::new();
    };
    records
        .iter()
        .filter(|r| r.status == RecordStatus::Pending && is_owner(r, viewer))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use gene_codec::RecordId;

    fn record(id: &str, gene_type: &str, efficiency: f64, status: RecordStatus) -> Record {
        Record {
            id: RecordId::new(id),
            encoded_payload: "FHE-e30=".into(),
            timestamp: 1,
            owner: "0xAbC".into(),
            gene_type: gene_type.into(),
            efficiency,
            status,
        }
    }

    #[test]
    fn aggregate_of_nothing_is_zero() {
        assert_eq!(
            aggregate(&[]),
            Stats {
                total: 0,
                verified: 0,
                pending: 0,
                rejected: 0,
                avg_efficiency: 0.0
            }
        );
    }

    #[test]
    fn aggregate_partitions_by_status() {
        let records = [
            record("1", "CRISPR-Cas9", 10.0, RecordStatus::Pending),
            record("2", "CRISPR-Cas9", 55.0, RecordStatus::Verified),
            record("3", "Base Editing", 100.0, RecordStatus::Rejected),
        ];
        let stats = aggregate(&records);
        assert_eq!(stats.total, 3);
        assert_eq!((stats.pending, stats.verified, stats.rejected), (1, 1, 1));
        assert_eq!(stats.avg_efficiency, 55.0);
    }

    #[test]
    fn histogram_boundaries() {
        let records: Vec<Record> = [0.0, 0.5, 20.0, 20.01, 55.0, 80.0, 99.9, 100.0, 120.0]
            .into_iter()
            .enumerate()
            .map(|(i, e)| record(&i.to_string(), "Other", e, RecordStatus::Pending))
            .collect();
        assert_eq!(histogram(&records, &DEFAULT_EDGES), vec![1, 2, 1, 1, 1, 2]);
    }

    #[test]
    fn filter_matches_gene_type_or_id_ignoring_case() {
        let records = [
            record("1712-abc", "CRISPR-Cas9", 10.0, RecordStatus::Pending),
            record("1713-xyz", "Base Editing", 20.0, RecordStatus::Pending),
        ];
        let hits = filter(&records, "Cas9");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].gene_type, "CRISPR-Cas9");
        assert_eq!(filter(&records, "XYZ")[0].id.as_str(), "1713-xyz");
        assert_eq!(filter(&records, "").len(), 2);
        assert!(filter(&records, "prime").is_empty());
    }

    #[test]
    fn only_own_pending_records_are_actionable() {
        let records = [
            record("1", "Other", 1.0, RecordStatus::Pending),
            record("2", "Other", 1.0, RecordStatus::Verified),
        ];
        let viewer = Address::new("0xabc");
        let mine = actionable(&records, Some(&viewer));
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id.as_str(), "1");
        assert!(actionable(&records, Some(&Address::new("0xdef"))).is_empty());
        assert!(actionable(&records, None).is_empty());
    }
}
