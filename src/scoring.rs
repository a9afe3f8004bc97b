//! Priority scoring.
//!
//! A record's score is a pure additive function of its categorical fields
//! and the presence of a few descriptive fields. Scores do not need to be
//! unique; ties are the resolver's problem.

use serde::Serialize;

use crate::config::ScoringWeights;
use crate::record::{CompanyRecord, SignalStrength, SourceType, Tier};

/// Per-dimension split of a record's score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScoreBreakdown {
    /// Points from `tier`.
    pub tier: u32,
    /// Points from `signal_strength`.
    pub signal: u32,
    /// Points from `source_type`, including the use-case bonus.
    pub source: u32,
    /// Points for website, description and industry.
    pub completeness: u32,
}

impl ScoreBreakdown {
    /// Sum of all dimensions, saturating at `u32::MAX`.
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.tier
            .saturating_add(self.signal)
            .saturating_add(self.source)
            .saturating_add(self.completeness)
    }
}

fn tier_weight(tier: Option<&Tier>, w: &ScoringWeights) -> u32 {
    match tier {
        Some(Tier::One) => w.tier_one,
        Some(Tier::Two) => w.tier_two,
        Some(Tier::Three) => w.tier_three,
        _ => w.tier_other,
    }
}

fn signal_weight(signal: Option<&SignalStrength>, w: &ScoringWeights) -> u32 {
    match signal {
        Some(SignalStrength::High) => w.signal_high,
        Some(SignalStrength::Medium) => w.signal_medium,
        _ => w.signal_low,
    }
}

fn source_weight(record: &CompanyRecord, w: &ScoringWeights) -> u32 {
    match record.source_type.as_ref() {
        Some(SourceType::Youtube) => {
            let bonus = if record.has_use_case() {
                w.youtube_use_case_bonus
            } else {
                0
            };
            w.source_youtube.saturating_add(bonus)
        }
        Some(SourceType::ParallelApi) => w.source_parallel_api,
        Some(SourceType::Manual) => w.source_manual,
        _ => w.source_other,
    }
}

/// Computes the per-dimension score split for a record.
#[must_use]
pub fn score_breakdown(record: &CompanyRecord, weights: &ScoringWeights) -> ScoreBreakdown {
    let mut completeness: u32 = 0;
    if record.has_website() {
        completeness = completeness.saturating_add(weights.has_website);
    }
    if record.has_description() {
        completeness = completeness.saturating_add(weights.has_description);
    }
    if record.has_industry() {
        completeness = completeness.saturating_add(weights.has_industry);
    }

    ScoreBreakdown {
        tier: tier_weight(record.tier.as_ref(), weights),
        signal: signal_weight(record.signal_strength.as_ref(), weights),
        source: source_weight(record, weights),
        completeness,
    }
}

/// Scores a record. Higher is better.
///
/// # Examples
///
/// ```
/// use leadsdb::{score, CompanyRecord, ScoringWeights, SignalStrength, SourceType, Tier};
///
/// let record = CompanyRecord::new("Acme")
///     .with_tier(Tier::One)
///     .with_signal(SignalStrength::High)
///     .with_source(SourceType::Youtube)
///     .with_use_case("x");
/// assert_eq!(score(&record, &ScoringWeights::default()), 60);
/// ```
#[must_use]
pub fn score(record: &CompanyRecord, weights: &ScoringWeights) -> u32 {
    score_breakdown(record, weights).total()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn w() -> ScoringWeights {
        ScoringWeights::default()
    }

    #[test]
    fn test_empty_record_gets_fallbacks() {
        // tier_other + signal_low + source_other
        assert_eq!(score(&CompanyRecord::default(), &w()), 10);
    }

    #[test]
    fn test_documented_example_scores() {
        let a = CompanyRecord::new("Acme")
            .with_tier(Tier::One)
            .with_signal(SignalStrength::High)
            .with_source(SourceType::Youtube)
            .with_use_case("x");
        let b = CompanyRecord::new("acme ")
            .with_tier(Tier::Two)
            .with_signal(SignalStrength::Low)
            .with_source(SourceType::Manual);
        assert_eq!(score(&a, &w()), 60);
        assert_eq!(score(&b, &w()), 31);
    }

    #[test]
    fn test_unknown_categories_use_minimum() {
        let record = CompanyRecord::new("x")
            .with_tier(Tier::Other("9".to_string()))
            .with_signal(SignalStrength::Other("huge".to_string()))
            .with_source(SourceType::Other("linkedin".to_string()));
        assert_eq!(score(&record, &w()), 10);
    }

    #[test]
    fn test_tier_four_same_as_unknown() {
        let four = CompanyRecord::new("x").with_tier(Tier::Four);
        let none = CompanyRecord::new("x");
        assert_eq!(score(&four, &w()), score(&none, &w()));
    }

    #[test]
    fn test_use_case_bonus_only_for_youtube() {
        let api = CompanyRecord::new("x").with_source(SourceType::ParallelApi);
        let api_uc = api.clone().with_use_case("ops");
        assert_eq!(score(&api, &w()), score(&api_uc, &w()));

        let yt = CompanyRecord::new("x").with_source(SourceType::Youtube);
        let yt_uc = yt.clone().with_use_case("ops");
        assert_eq!(score(&yt_uc, &w()) - score(&yt, &w()), 5);
    }

    #[test]
    fn test_completeness_fields() {
        let record = CompanyRecord::new("x")
            .with_website("https://x.io")
            .with_description("does things")
            .with_industry("SaaS");
        let b = score_breakdown(&record, &w());
        assert_eq!(b.completeness, 5);
        assert_eq!(b.total(), score(&record, &w()));
    }

    #[test]
    fn test_monotonic_in_tier() {
        let base = CompanyRecord::new("x").with_signal(SignalStrength::Medium);
        let t3 = score(&base.clone().with_tier(Tier::Three), &w());
        let t2 = score(&base.clone().with_tier(Tier::Two), &w());
        let t1 = score(&base.with_tier(Tier::One), &w());
        assert!(t1 >= t2 && t2 >= t3);
    }

    #[test]
    fn test_monotonic_in_signal() {
        let base = CompanyRecord::new("x").with_tier(Tier::Two);
        let low = score(&base.clone().with_signal(SignalStrength::Low), &w());
        let med = score(&base.clone().with_signal(SignalStrength::Medium), &w());
        let high = score(&base.with_signal(SignalStrength::High), &w());
        assert!(high >= med && med >= low);
    }

    #[test]
    fn test_adding_optional_field_never_decreases() {
        let base = CompanyRecord::new("x").with_source(SourceType::Youtube);
        let s0 = score(&base, &w());
        for richer in [
            base.clone().with_website("w"),
            base.clone().with_description("d"),
            base.clone().with_industry("i"),
            base.clone().with_use_case("u"),
        ] {
            assert!(score(&richer, &w()) >= s0);
        }
    }

    #[test]
    fn test_custom_weights_override() {
        let weights = ScoringWeights {
            has_industry: 100,
            ..ScoringWeights::default()
        };
        let record = CompanyRecord::new("x").with_industry("SaaS");
        assert_eq!(score(&record, &weights), 110);
    }

    #[test]
    fn test_unvalidated_huge_weights_saturate() {
        let weights = ScoringWeights {
            tier_one: u32::MAX,
            youtube_use_case_bonus: u32::MAX,
            has_website: u32::MAX,
            has_description: u32::MAX,
            ..ScoringWeights::default()
        };
        let record = CompanyRecord::new("x")
            .with_tier(Tier::One)
            .with_source(SourceType::Youtube)
            .with_use_case("ops")
            .with_website("w")
            .with_description("d");
        let b = score_breakdown(&record, &weights);
        assert_eq!(b.source, u32::MAX);
        assert_eq!(b.completeness, u32::MAX);
        assert_eq!(b.total(), u32::MAX);
    }

    #[test]
    fn test_max_validated_weights_fit() {
        let m = ScoringWeights::MAX_WEIGHT;
        let weights = ScoringWeights {
            tier_one: m,
            tier_two: m,
            tier_three: m,
            tier_other: m,
            signal_high: m,
            signal_medium: m,
            signal_low: m,
            source_youtube: m,
            youtube_use_case_bonus: m,
            source_parallel_api: m,
            source_manual: m,
            source_other: m,
            has_website: m,
            has_description: m,
            has_industry: m,
        }
        .validate()
        .unwrap();
        let record = CompanyRecord::new("x")
            .with_tier(Tier::One)
            .with_signal(SignalStrength::High)
            .with_source(SourceType::Youtube)
            .with_use_case("ops")
            .with_website("w")
            .with_description("d")
            .with_industry("i");
        assert_eq!(score(&record, &weights), m * 7);
    }
}
