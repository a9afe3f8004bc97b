//! Priority ranking over the whole store.

use serde::Serialize;

use crate::config::ScoringWeights;
use crate::record::{CompanyRecord, RecordId};
use crate::scoring::score;
use crate::store::RecordMap;

/// One row of the ranked list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedRecord {
    /// 1-based position.
    pub rank: usize,
    /// Record id.
    pub id: RecordId,
    /// Priority score.
    pub score: u32,
    /// The record itself.
    pub record: CompanyRecord,
}

/// Sorts every record by score, highest first. Equal scores keep store
/// order. `top` truncates the list.
#[must_use]
pub fn rank_records(
    records: &RecordMap,
    weights: &ScoringWeights,
    top: Option<usize>,
) -> Vec<RankedRecord> {
    let mut scored: Vec<(u32, &RecordId, &CompanyRecord)> = records
        .iter()
        .map(|(id, record)| (score(record, weights), id, record))
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));

    scored
        .into_iter()
        .take(top.unwrap_or(usize::MAX))
        .enumerate()
        .map(|(i, (score, id, record))| RankedRecord {
            rank: i + 1,
            id: id.clone(),
            score,
            record: record.clone(),
        })
        .collect()
}
