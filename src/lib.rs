//! # leadsdb - Local leads database tooling
//!
//! leadsdb keeps a flat JSON database of company leads clean. Records come
//! from several ingestion scripts (YouTube descriptions, a company-search
//! API, manual entry) and the same company often lands more than once.
//!
//! ## Core Concepts
//!
//! - **Record**: one company with a tier, signal strength, and source type
//! - **Score**: a deterministic priority computed from those fields
//! - **Duplicate group**: records whose trimmed, lowercased names match
//! - **Survivor**: the best-scored record kept from each group
//!
//! ## Usage
//!
//! ```rust,ignore
//! use leadsdb::{plan, DedupConfig, LeadStore};
//!
//! let mut store = LeadStore::load("leads.json")?;
//! let resolution = plan(&store, &DedupConfig::default());
//! for group in resolution.duplicate_groups() {
//!     println!("{} keeps {}", group.key, group.survivor.id);
//! }
//! store.apply(&resolution)?;
//! store.save("leads.json")?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod record;
pub mod scoring;
pub mod store;

pub mod dedup;
pub mod grouping;
pub mod ranking;
pub mod report;
pub mod resolver;
pub mod stats;

// Re-export primary types at crate root for convenience
pub use config::{DedupConfig, ScoringWeights, TieBreak};
pub use dedup::{plan, run_dedup, run_remove, DedupMode, DedupOutcome, RemovalOutcome};
pub use error::{LeadsError, LeadsResult, StoreError, ValidationError};
pub use grouping::{group_by_name, normalize_name, DuplicateGroup, GroupKey};
pub use ranking::{rank_records, RankedRecord};
pub use record::{CompanyRecord, RecordId, SignalStrength, SourceType, Tier};
pub use report::{DedupReport, OutputFormat};
pub use resolver::{resolve, GroupResolution, Resolution, ScoredMember};
pub use scoring::{score, score_breakdown, ScoreBreakdown};
pub use stats::{compute_stats, StoreStats};
pub use store::{LeadStore, RecordMap, StoreMetadata};
