//! Store statistics.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::grouping::group_by_name;
use crate::store::LeadStore;

const NONE_LABEL: &str = "(none)";

/// Counts per category plus duplicate totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    /// All records.
    pub total: usize,
    /// Records with a missing or blank name.
    pub unnamed: usize,
    /// Counts per tier value.
    pub by_tier: BTreeMap<String, usize>,
    /// Counts per signal strength.
    pub by_signal: BTreeMap<String, usize>,
    /// Counts per source type.
    pub by_source: BTreeMap<String, usize>,
    /// Name groups with more than one record.
    pub duplicate_groups: usize,
    /// Records that a dedup run would delete.
    pub redundant_records: usize,
    /// Store's `last_updated` stamp.
    pub last_updated: Option<DateTime<Utc>>,
}

fn bump(map: &mut BTreeMap<String, usize>, label: Option<&str>) {
    *map.entry(label.unwrap_or(NONE_LABEL).to_string()).or_insert(0) += 1;
}

/// Summarizes a store.
#[must_use]
pub fn compute_stats(store: &LeadStore) -> StoreStats {
    let mut stats = StoreStats {
        total: store.len(),
        last_updated: store.metadata().last_updated,
        ..StoreStats::default()
    };

    for (_, record) in store.records().iter() {
        if record.name().is_none() {
            stats.unnamed += 1;
        }
        bump(&mut stats.by_tier, record.tier.as_ref().map(|t| t.as_str()));
        bump(
            &mut stats.by_signal,
            record.signal_strength.as_ref().map(|s| s.as_str()),
        );
        bump(
            &mut stats.by_source,
            record.source_type.as_ref().map(|s| s.as_str()),
        );
    }

    for group in group_by_name(store.records()) {
        if group.is_duplicate() {
            stats.duplicate_groups += 1;
            stats.redundant_records += group.members.len() - 1;
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{CompanyRecord, SourceType, Tier};

    #[test]
    fn test_counts() {
        let mut store = LeadStore::new();
        store.insert(CompanyRecord::new("Acme").with_tier(Tier::One));
        store.insert(
            CompanyRecord::new("acme")
                .with_tier(Tier::One)
                .with_source(SourceType::Youtube),
        );
        store.insert(CompanyRecord::new("ACME "));
        store.insert(CompanyRecord::new("Beta").with_source(SourceType::Youtube));
        store.insert(CompanyRecord::default());

        let stats = compute_stats(&store);
        assert_eq!(stats.total, 5);
        assert_eq!(stats.unnamed, 1);
        assert_eq!(stats.by_tier["1"], 2);
        assert_eq!(stats.by_tier[NONE_LABEL], 3);
        assert_eq!(stats.by_source["youtube"], 2);
        assert_eq!(stats.by_signal[NONE_LABEL], 5);
        assert_eq!(stats.duplicate_groups, 1);
        assert_eq!(stats.redundant_records, 2);
        assert!(stats.last_updated.is_none());
    }

    #[test]
    fn test_empty_store() {
        let stats = compute_stats(&LeadStore::new());
        assert_eq!(stats, StoreStats::default());
    }
}
