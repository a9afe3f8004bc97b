//! Duplicate resolution.
//!
//! For each group the highest-scored record survives and every other member
//! is marked for removal. Resolution is pure: the store is only touched when
//! the caller applies the result.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::{DedupConfig, TieBreak};
use crate::grouping::{DuplicateGroup, GroupKey};
use crate::record::{CompanyRecord, RecordId};
use crate::scoring::{score_breakdown, ScoreBreakdown};

/// A group member together with its score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredMember {
    /// Record id.
    pub id: RecordId,
    /// Total score.
    pub score: u32,
    /// Per-dimension split of `score`.
    pub breakdown: ScoreBreakdown,
    /// The record itself.
    pub record: CompanyRecord,
}

/// Outcome for one group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupResolution {
    /// Group key.
    pub key: GroupKey,
    /// Best-scored member, kept.
    pub survivor: ScoredMember,
    /// Losing members, best first.
    pub removed: Vec<ScoredMember>,
    /// The survivor's score equals the runner-up's; the pick rests on the
    /// tie-break rule and deserves a human look.
    pub tied: bool,
}

impl GroupResolution {
    /// Returns true if this group removes anything.
    #[must_use]
    pub fn has_removals(&self) -> bool {
        !self.removed.is_empty()
    }
}

/// Result of resolving every group.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Resolution {
    /// One entry per group, in first-seen order.
    pub groups: Vec<GroupResolution>,
}

impl Resolution {
    /// Ids that stay in the store.
    #[must_use]
    pub fn survivors(&self) -> BTreeSet<RecordId> {
        self.groups.iter().map(|g| g.survivor.id.clone()).collect()
    }

    /// Ids to delete.
    #[must_use]
    pub fn removed(&self) -> BTreeSet<RecordId> {
        self.groups
            .iter()
            .flat_map(|g| g.removed.iter().map(|m| m.id.clone()))
            .collect()
    }

    /// Groups that actually remove records.
    pub fn duplicate_groups(&self) -> impl Iterator<Item = &GroupResolution> {
        self.groups.iter().filter(|g| g.has_removals())
    }

    /// Number of ids to delete.
    #[must_use]
    pub fn removed_count(&self) -> usize {
        self.groups.iter().map(|g| g.removed.len()).sum()
    }

    /// Returns true if there is nothing to delete.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.removed_count() == 0
    }
}

/// Picks one survivor per group.
///
/// Members are ordered by score, highest first, with a stable sort. Equal
/// scores fall back to `config.tie_break`: group order for `FirstSeen`,
/// ascending id for `LexicalId`.
#[must_use]
pub fn resolve(groups: &[DuplicateGroup], config: &DedupConfig) -> Resolution {
    let mut out = Vec::with_capacity(groups.len());

    for group in groups {
        let mut scored: Vec<ScoredMember> = group
            .members
            .iter()
            .map(|(id, record)| {
                let breakdown = score_breakdown(record, &config.weights);
                ScoredMember {
                    id: id.clone(),
                    score: breakdown.total(),
                    breakdown,
                    record: record.clone(),
                }
            })
            .collect();

        match config.tie_break {
            TieBreak::FirstSeen => scored.sort_by(|a, b| b.score.cmp(&a.score)),
            TieBreak::LexicalId => {
                scored.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
            }
        }

        let tied = scored.len() > 1 && scored[0].score == scored[1].score;
        let mut members = scored.into_iter();
        let Some(survivor) = members.next() else {
            continue;
        };
        let removed: Vec<ScoredMember> = members.collect();

        if tied {
            warn!(
                key = %group.key,
                survivor = %survivor.id,
                score = survivor.score,
                "tied duplicate group, survivor chosen by tie-break"
            );
        }

        out.push(GroupResolution {
            key: group.key.clone(),
            survivor,
            removed,
            tied,
        });
    }

    let resolution = Resolution { groups: out };
    debug!(
        groups = resolution.groups.len(),
        removed = resolution.removed_count(),
        "resolved duplicate groups"
    );
    resolution
}
