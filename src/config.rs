//! Scoring and resolution configuration.
//!
//! Every weight is a named field so tests and operators can override a
//! single dimension without touching anything global.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{LeadsError, StoreError, ValidationError};

/// Additive weights used by the priority scorer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    /// Tier 1.
    pub tier_one: u32,
    /// Tier 2.
    pub tier_two: u32,
    /// Tier 3.
    pub tier_three: u32,
    /// Tier 4, unknown tiers and missing tiers.
    pub tier_other: u32,

    /// `high` signal strength.
    pub signal_high: u32,
    /// `medium` signal strength.
    pub signal_medium: u32,
    /// Low, unknown and missing signal strength.
    pub signal_low: u32,

    /// Records from the YouTube pipeline.
    pub source_youtube: u32,
    /// Extra points for a YouTube record that names a use case.
    pub youtube_use_case_bonus: u32,
    /// Records from the company-search API.
    pub source_parallel_api: u32,
    /// Hand-entered records.
    pub source_manual: u32,
    /// Unknown and missing source.
    pub source_other: u32,

    /// Non-blank `website`.
    pub has_website: u32,
    /// Non-blank `description`.
    pub has_description: u32,
    /// Non-blank `industry`.
    pub has_industry: u32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            tier_one: 30,
            tier_two: 20,
            tier_three: 10,
            tier_other: 5,
            signal_high: 15,
            signal_medium: 10,
            signal_low: 5,
            source_youtube: 10,
            youtube_use_case_bonus: 5,
            source_parallel_api: 8,
            source_manual: 6,
            source_other: 0,
            has_website: 2,
            has_description: 2,
            has_industry: 1,
        }
    }
}

impl ScoringWeights {
    /// Largest accepted single weight. A score sums at most seven weights,
    /// so this keeps every total inside `u32`.
    pub const MAX_WEIGHT: u32 = u32::MAX / 8;

    fn named(&self) -> [(&'static str, u32); 15] {
        [
            ("tier_one", self.tier_one),
            ("tier_two", self.tier_two),
            ("tier_three", self.tier_three),
            ("tier_other", self.tier_other),
            ("signal_high", self.signal_high),
            ("signal_medium", self.signal_medium),
            ("signal_low", self.signal_low),
            ("source_youtube", self.source_youtube),
            ("youtube_use_case_bonus", self.youtube_use_case_bonus),
            ("source_parallel_api", self.source_parallel_api),
            ("source_manual", self.source_manual),
            ("source_other", self.source_other),
            ("has_website", self.has_website),
            ("has_description", self.has_description),
            ("has_industry", self.has_industry),
        ]
    }

    /// Rejects weight tables where a lower-priority category outscores a
    /// higher one, which would make "better" records lose, and weights too
    /// large to sum safely.
    pub fn validate(self) -> Result<Self, ValidationError> {
        if let Some((field, _)) = self
            .named()
            .into_iter()
            .find(|&(_, w)| w > Self::MAX_WEIGHT)
        {
            return Err(ValidationError::WeightTooLarge {
                field,
                max: Self::MAX_WEIGHT,
            });
        }

        let tiers = [self.tier_one, self.tier_two, self.tier_three, self.tier_other];
        if tiers.windows(2).any(|w| w[0] < w[1]) {
            return Err(ValidationError::NonMonotonicWeights { dimension: "tier" });
        }

        let signals = [self.signal_high, self.signal_medium, self.signal_low];
        if signals.windows(2).any(|w| w[0] < w[1]) {
            return Err(ValidationError::NonMonotonicWeights {
                dimension: "signal_strength",
            });
        }

        let known_sources = [
            self.source_youtube,
            self.source_parallel_api,
            self.source_manual,
        ];
        if known_sources.iter().any(|&w| w < self.source_other) {
            return Err(ValidationError::NonMonotonicWeights {
                dimension: "source_type",
            });
        }

        Ok(self)
    }
}

/// How to order members whose scores are equal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Keep the store's own order: the record seen first wins.
    #[default]
    FirstSeen,
    /// Smallest record id (byte-wise) wins, independent of file order.
    LexicalId,
}

/// Configuration for a deduplication run.
///
/// # Examples
///
/// ```
/// use leadsdb::{DedupConfig, TieBreak};
///
/// let config = DedupConfig::default();
/// assert_eq!(config.weights.tier_one, 30);
/// assert_eq!(config.tie_break, TieBreak::FirstSeen);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    /// Scoring weights.
    pub weights: ScoringWeights,
    /// Ordering among equal scores.
    pub tie_break: TieBreak,
}

impl DedupConfig {
    /// Validates the weight table.
    pub fn validate(self) -> Result<Self, ValidationError> {
        Ok(Self {
            weights: self.weights.validate()?,
            tie_break: self.tie_break,
        })
    }

    /// Loads a JSON config file. Missing keys fall back to defaults.
    ///
    /// # Errors
    /// - `StoreError::NotFound` if the file does not exist
    /// - `ValidationError::ConfigParse` if the JSON is malformed
    /// - `ValidationError::NonMonotonicWeights` if the weights are inconsistent
    /// - `ValidationError::WeightTooLarge` if a weight exceeds [`ScoringWeights::MAX_WEIGHT`]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LeadsError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StoreError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                StoreError::io(path, e)
            }
        })?;

        let config: Self =
            serde_json::from_str(&content).map_err(|e| ValidationError::ConfigParse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        Ok(config.validate()?)
    }
}
