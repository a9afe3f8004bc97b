//! The deduplication run: load, group, resolve, preview, confirm, apply,
//! write. Explicit removal by id goes through the same gate.
//!
//! Nothing is deleted unless the operator has been shown every record that
//! would go, with its score, and has answered the prompt with the literal
//! confirmation word.

use std::collections::HashSet;
use std::io::{BufRead, Write};
use std::path::Path;

use tracing::info;

use crate::config::DedupConfig;
use crate::error::{LeadsResult, StoreError, ValidationError};
use crate::grouping::group_by_name;
use crate::record::RecordId;
use crate::report::{
    confirm, write_dedup_report, write_removal_report, DedupReport, OutputFormat, RemovalReport,
    ReportEntry,
};
use crate::resolver::{resolve, Resolution};
use crate::scoring::score;
use crate::store::LeadStore;

/// Whether a run may write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupMode {
    /// Print the preview and stop.
    DryRun,
    /// Print the preview, ask for confirmation, then apply.
    Interactive,
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DedupOutcome {
    /// Every name is unique; nothing to do.
    NoDuplicates,
    /// Dry run: `pending` records would have been removed.
    Previewed {
        /// Records the run would delete.
        pending: usize,
    },
    /// The operator declined; the store was not touched.
    Aborted {
        /// Records that were offered for deletion.
        pending: usize,
    },
    /// The listed records were deleted and the store rewritten.
    Applied {
        /// Deleted ids, in store order.
        removed: Vec<RecordId>,
    },
}

/// How an explicit removal ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemovalOutcome {
    /// No ids were given.
    NothingSelected,
    /// Dry run: `pending` records would have been removed.
    Previewed {
        /// Records the run would delete.
        pending: usize,
    },
    /// The operator declined; the store was not touched.
    Aborted {
        /// Records that were offered for deletion.
        pending: usize,
    },
    /// The listed records were deleted and the store rewritten.
    Applied {
        /// Deleted ids, in store order.
        removed: Vec<RecordId>,
    },
}

fn check_output(mode: DedupMode, format: OutputFormat) -> Result<(), ValidationError> {
    if mode == DedupMode::Interactive && format == OutputFormat::Json {
        return Err(ValidationError::InteractiveJson);
    }
    Ok(())
}

/// Groups and resolves an in-memory store without touching it.
#[must_use]
pub fn plan(store: &LeadStore, config: &DedupConfig) -> Resolution {
    resolve(&group_by_name(store.records()), config)
}

/// Runs deduplication against the store file at `path`.
///
/// The preview goes to `output`; the confirmation answer is read from
/// `input` (unused for dry runs).
///
/// # Errors
/// - `ValidationError::InteractiveJson` for JSON output outside a dry run
/// - `StoreError::NotFound` if the store file is absent
/// - any load/save error from the store
/// - `LeadsError::Terminal` if the preview cannot be written or the answer read
pub fn run_dedup(
    path: &Path,
    config: &DedupConfig,
    mode: DedupMode,
    format: OutputFormat,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> LeadsResult<DedupOutcome> {
    check_output(mode, format)?;
    let mut store = LeadStore::load(path)?;
    let resolution = plan(&store, config);

    let report = DedupReport::from_resolution(&resolution);
    write_dedup_report(output, &report, format)?;

    if resolution.is_noop() {
        info!(records = store.len(), "no duplicates found");
        return Ok(DedupOutcome::NoDuplicates);
    }

    let pending = resolution.removed_count();
    if mode == DedupMode::DryRun {
        return Ok(DedupOutcome::Previewed { pending });
    }

    if !confirm(input, output, pending)? {
        writeln!(output, "Aborted; no records were removed.")?;
        info!(pending, "dedup aborted by operator");
        return Ok(DedupOutcome::Aborted { pending });
    }

    let removed: Vec<RecordId> = store
        .apply(&resolution)?
        .into_iter()
        .map(|(id, _)| id)
        .collect();
    store.save(path)?;

    writeln!(
        output,
        "Removed {} record(s); {} remain.",
        removed.len(),
        store.len()
    )?;
    Ok(DedupOutcome::Applied { removed })
}

/// Deletes the given records from the store file at `path`, after showing
/// each one with its score and getting the confirmation word.
///
/// Repeated ids count once. Every id must exist before anything is shown.
///
/// # Errors
/// - `ValidationError::InteractiveJson` for JSON output outside a dry run
/// - `StoreError::NotFound` if the store file is absent
/// - `StoreError::KeyNotFound` if any id is not in the store
/// - any save error from the store
/// - `LeadsError::Terminal` if the preview cannot be written or the answer read
pub fn run_remove(
    path: &Path,
    ids: &[RecordId],
    config: &DedupConfig,
    mode: DedupMode,
    format: OutputFormat,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> LeadsResult<RemovalOutcome> {
    check_output(mode, format)?;
    let mut store = LeadStore::load(path)?;

    let mut seen = HashSet::new();
    let mut entries = Vec::new();
    for id in ids.iter().filter(|id| seen.insert(*id)) {
        let record = store
            .get(id)
            .ok_or_else(|| StoreError::KeyNotFound(id.clone()))?;
        entries.push(ReportEntry::new(id, record, score(record, &config.weights)));
    }

    let report = RemovalReport::new(entries);
    write_removal_report(output, &report, format)?;

    let pending = report.total_removed;
    if pending == 0 {
        return Ok(RemovalOutcome::NothingSelected);
    }
    if mode == DedupMode::DryRun {
        return Ok(RemovalOutcome::Previewed { pending });
    }

    if !confirm(input, output, pending)? {
        writeln!(output, "Aborted; no records were removed.")?;
        info!(pending, "removal aborted by operator");
        return Ok(RemovalOutcome::Aborted { pending });
    }

    let removed: Vec<RecordId> = store
        .remove_all(seen)?
        .into_iter()
        .map(|(id, _)| id)
        .collect();
    store.save(path)?;

    writeln!(
        output,
        "Removed {} record(s); {} remain.",
        removed.len(),
        store.len()
    )?;
    Ok(RemovalOutcome::Applied { removed })
}
