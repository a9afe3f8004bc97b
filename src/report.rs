//! Human-facing output: the dedup preview, the confirmation prompt, and the
//! ranking/stats listings.
//!
//! Everything here writes to a caller-supplied writer so the CLI can use
//! stdout while tests capture into a buffer.

use std::io::{self, BufRead, Write};

use serde::Serialize;

use crate::ranking::RankedRecord;
use crate::record::{CompanyRecord, RecordId};
use crate::resolver::{GroupResolution, Resolution, ScoredMember};
use crate::stats::StoreStats;

/// Output format for reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Aligned plain text for a terminal.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

/// The literal answer that commits a destructive change.
pub const CONFIRM_WORD: &str = "yes";

/// One line of the preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    /// Record id.
    pub id: String,
    /// Company name as stored.
    pub name: Option<String>,
    /// Priority score.
    pub score: u32,
    /// Tier as stored.
    pub tier: Option<String>,
    /// Signal strength as stored.
    pub signal_strength: Option<String>,
    /// Source type as stored.
    pub source_type: Option<String>,
}

impl ReportEntry {
    /// Builds an entry for a scored record.
    #[must_use]
    pub fn new(id: &RecordId, record: &CompanyRecord, score: u32) -> Self {
        Self {
            id: id.to_string(),
            name: record.company_name.clone(),
            score,
            tier: record.tier.as_ref().map(ToString::to_string),
            signal_strength: record.signal_strength.as_ref().map(ToString::to_string),
            source_type: record.source_type.as_ref().map(ToString::to_string),
        }
    }
}

impl From<&ScoredMember> for ReportEntry {
    fn from(member: &ScoredMember) -> Self {
        Self::new(&member.id, &member.record, member.score)
    }
}

/// Preview of one duplicate group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupReport {
    /// Group key.
    pub key: String,
    /// Survivor chosen by tie-break.
    pub tied: bool,
    /// Record that stays.
    pub survivor: ReportEntry,
    /// Records that go.
    pub removed: Vec<ReportEntry>,
}

impl From<&GroupResolution> for GroupReport {
    fn from(group: &GroupResolution) -> Self {
        Self {
            key: group.key.to_string(),
            tied: group.tied,
            survivor: ReportEntry::from(&group.survivor),
            removed: group.removed.iter().map(ReportEntry::from).collect(),
        }
    }
}

/// Dry-run report: every group that would lose records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DedupReport {
    /// Groups that lose at least one record.
    pub groups: Vec<GroupReport>,
    /// Records to delete across all groups.
    pub total_removed: usize,
    /// Groups whose survivor was picked by tie-break.
    pub tied_groups: usize,
}

impl DedupReport {
    /// Builds the report from a resolution, skipping singleton groups.
    #[must_use]
    pub fn from_resolution(resolution: &Resolution) -> Self {
        let groups: Vec<GroupReport> = resolution
            .duplicate_groups()
            .map(GroupReport::from)
            .collect();
        Self {
            total_removed: groups.iter().map(|g| g.removed.len()).sum(),
            tied_groups: groups.iter().filter(|g| g.tied).count(),
            groups,
        }
    }
}

fn opt(v: Option<&String>) -> &str {
    v.map_or("-", String::as_str)
}

fn write_entry(out: &mut impl Write, marker: &str, e: &ReportEntry) -> io::Result<()> {
    writeln!(
        out,
        "  {marker} {id}  score={score:<3} tier={tier:<2} signal={signal:<6} source={source:<12} name={name}",
        id = e.id,
        score = e.score,
        tier = opt(e.tier.as_ref()),
        signal = opt(e.signal_strength.as_ref()),
        source = opt(e.source_type.as_ref()),
        name = opt(e.name.as_ref()),
    )
}

fn write_json<T: Serialize>(out: &mut impl Write, value: &T) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value).map_err(io::Error::from)?;
    writeln!(out)
}

/// Writes the dedup preview.
pub fn write_dedup_report(
    out: &mut impl Write,
    report: &DedupReport,
    format: OutputFormat,
) -> io::Result<()> {
    if format == OutputFormat::Json {
        return write_json(out, report);
    }

    if report.groups.is_empty() {
        return writeln!(out, "No duplicates found.");
    }

    for group in &report.groups {
        let tie = if group.tied { "  [TIE: review manually]" } else { "" };
        writeln!(
            out,
            "{} ({} records){tie}",
            group.key,
            group.removed.len() + 1
        )?;
        write_entry(out, "keep  ", &group.survivor)?;
        for entry in &group.removed {
            write_entry(out, "remove", entry)?;
        }
    }
    writeln!(
        out,
        "\n{} duplicate group(s), {} record(s) to remove, {} tied group(s).",
        report.groups.len(),
        report.total_removed,
        report.tied_groups
    )
}

/// Preview of an explicit removal by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RemovalReport {
    /// Records that would be deleted, in the order they were requested.
    pub records: Vec<ReportEntry>,
    /// Number of records that would be deleted.
    pub total_removed: usize,
}

impl RemovalReport {
    /// Wraps the targeted entries.
    #[must_use]
    pub fn new(records: Vec<ReportEntry>) -> Self {
        Self {
            total_removed: records.len(),
            records,
        }
    }
}

/// Writes the removal preview.
pub fn write_removal_report(
    out: &mut impl Write,
    report: &RemovalReport,
    format: OutputFormat,
) -> io::Result<()> {
    if format == OutputFormat::Json {
        return write_json(out, report);
    }

    if report.records.is_empty() {
        return writeln!(out, "No records selected.");
    }
    for entry in &report.records {
        write_entry(out, "remove", entry)?;
    }
    writeln!(out, "\n{} record(s) to remove.", report.total_removed)
}

/// Asks the operator to confirm a deletion. Only the literal `yes` commits;
/// anything else, including end of input, declines.
pub fn confirm(input: &mut impl BufRead, out: &mut impl Write, removals: usize) -> io::Result<bool> {
    write!(out, "Type '{CONFIRM_WORD}' to delete {removals} record(s): ")?;
    out.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']) == CONFIRM_WORD)
}

/// Writes the ranked list.
pub fn write_ranking(
    out: &mut impl Write,
    ranked: &[RankedRecord],
    format: OutputFormat,
) -> io::Result<()> {
    if format == OutputFormat::Json {
        return write_json(out, &ranked);
    }
    for row in ranked {
        writeln!(
            out,
            "{:>4}. {:<3} {}  {}",
            row.rank,
            row.score,
            row.record.company_name.as_deref().unwrap_or("-"),
            row.id
        )?;
    }
    Ok(())
}

/// Writes store statistics.
pub fn write_stats(out: &mut impl Write, stats: &StoreStats, format: OutputFormat) -> io::Result<()> {
    if format == OutputFormat::Json {
        return write_json(out, stats);
    }
    writeln!(out, "records:           {}", stats.total)?;
    writeln!(out, "unnamed:           {}", stats.unnamed)?;
    writeln!(out, "duplicate groups:  {}", stats.duplicate_groups)?;
    writeln!(out, "redundant records: {}", stats.redundant_records)?;
    if let Some(ts) = stats.last_updated {
        writeln!(out, "last updated:      {}", ts.to_rfc3339())?;
    }
    for (title, counts) in [
        ("tier", &stats.by_tier),
        ("signal_strength", &stats.by_signal),
        ("source_type", &stats.by_source),
    ] {
        writeln!(out, "{title}:")?;
        for (label, n) in counts {
            writeln!(out, "  {label:<14} {n}")?;
        }
    }
    Ok(())
}
