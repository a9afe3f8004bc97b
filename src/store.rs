//! Flat JSON record store.
//!
//! The store is a single document holding a metadata block and an
//! id → record mapping:
//!
//! ```text
//! {
//!   "metadata":  { "last_updated": "<RFC 3339>" },
//!   "companies": { "<id>": { "company_name": "...", ... }, ... }
//! }
//! ```
//!
//! # Concurrency
//! Single writer only. The whole document is read once and rewritten once
//! per invocation; there is no locking and no merge of external changes.

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::record::{CompanyRecord, RecordId};
use crate::resolver::Resolution;

/// Store-level metadata. Unknown keys are preserved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreMetadata {
    /// When the store was last written.
    #[serde(
        default,
        deserialize_with = "deserialize_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_updated: Option<DateTime<Utc>>,

    /// Any other metadata keys.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Accepts RFC 3339 timestamps and naive ISO-8601 ones (read as UTC), which
/// is what the ingestion scripts historically wrote.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(ts.with_timezone(&Utc)));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| Some(naive.and_utc()))
        .map_err(|e| serde::de::Error::custom(format!("invalid last_updated '{raw}': {e}")))
}

/// Ordered id → record mapping.
///
/// Iteration order is the order records appeared in the file (or were
/// inserted). This is the order first-seen tie-breaking relies on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordMap {
    entries: Vec<(RecordId, CompanyRecord)>,
}

impl RecordMap {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a map from ordered entries, rejecting repeated ids.
    pub fn from_entries(
        entries: impl IntoIterator<Item = (RecordId, CompanyRecord)>,
    ) -> Result<Self, StoreError> {
        let mut map = Self::new();
        for (id, record) in entries {
            map.insert(id, record)?;
        }
        Ok(map)
    }

    /// Appends a record. Returns `DuplicateKey` if the id is taken.
    pub fn insert(&mut self, id: RecordId, record: CompanyRecord) -> Result<(), StoreError> {
        if self.contains(&id) {
            return Err(StoreError::DuplicateKey(id));
        }
        self.entries.push((id, record));
        Ok(())
    }

    /// Looks up a record by id.
    #[must_use]
    pub fn get(&self, id: &RecordId) -> Option<&CompanyRecord> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == id)
            .map(|(_, record)| record)
    }

    /// True if `id` is present.
    #[must_use]
    pub fn contains(&self, id: &RecordId) -> bool {
        self.entries.iter().any(|(existing, _)| existing == id)
    }

    /// Removes a record, preserving the order of the rest.
    pub fn remove(&mut self, id: &RecordId) -> Result<CompanyRecord, StoreError> {
        let pos = self
            .entries
            .iter()
            .position(|(existing, _)| existing == id)
            .ok_or_else(|| StoreError::KeyNotFound(id.clone()))?;
        Ok(self.entries.remove(pos).1)
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if there are no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates in store order.
    pub fn iter(&self) -> impl Iterator<Item = (&RecordId, &CompanyRecord)> {
        self.entries.iter().map(|(id, record)| (id, record))
    }

    /// Record ids in store order.
    pub fn ids(&self) -> impl Iterator<Item = &RecordId> {
        self.entries.iter().map(|(id, _)| id)
    }
}

impl Serialize for RecordMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (id, record) in &self.entries {
            map.serialize_entry(id, record)?;
        }
        map.end()
    }
}

/// Raw `companies` object in file order. Duplicate keys are kept so the
/// loader can report them as `DuplicateKey` instead of silently keeping one.
#[derive(Default)]
struct RawEntries(Vec<(RecordId, CompanyRecord)>);

impl<'de> Deserialize<'de> for RawEntries {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = RawEntries;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object mapping record ids to company records")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<RawEntries, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((id, record)) = access.next_entry::<RecordId, CompanyRecord>()? {
                    entries.push((id, record));
                }
                Ok(RawEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

#[derive(Deserialize)]
struct RawDocument {
    #[serde(default)]
    metadata: StoreMetadata,
    #[serde(default)]
    companies: RawEntries,
}

#[derive(Serialize)]
struct DocumentRef<'a> {
    metadata: &'a StoreMetadata,
    companies: &'a RecordMap,
}

/// The leads database: metadata plus the ordered record mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeadStore {
    metadata: StoreMetadata,
    records: RecordMap,
}

impl LeadStore {
    /// Create an empty store (not yet backed by a file).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a store from disk.
    ///
    /// # Errors
    /// - `NotFound` if the file does not exist
    /// - `Serialization` if the document is not a valid store
    /// - `DuplicateKey` if the same record id appears twice
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                StoreError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                StoreError::io(path, e)
            }
        })?;

        let raw: RawDocument = serde_json::from_str(&content)
            .map_err(|e| StoreError::Serialization(format!("{}: {e}", path.display())))?;
        let records = RecordMap::from_entries(raw.companies.0)?;
        for (id, record) in records.iter() {
            for field in record.invalid_fields() {
                warn!(%id, field = %field, "ignoring wrongly typed field; raw value kept");
            }
        }

        debug!(path = %path.display(), records = records.len(), "loaded lead store");
        Ok(Self {
            metadata: raw.metadata,
            records,
        })
    }

    /// Rewrite the whole store to `path`, stamping `last_updated`.
    ///
    /// Uses write-to-temp-then-rename so a crash mid-write leaves the
    /// previous file intact.
    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        let path = path.as_ref();
        self.metadata.last_updated = Some(Utc::now());

        let doc = DocumentRef {
            metadata: &self.metadata,
            companies: &self.records,
        };
        let json = serde_json::to_string_pretty(&doc)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let temp_path = temp_path_for(path);
        let written = write_synced(&temp_path, json.as_bytes())
            .map_err(|e| StoreError::io(&temp_path, e))
            .and_then(|()| fs::rename(&temp_path, path).map_err(|e| StoreError::io(path, e)));
        if written.is_err() {
            // No partial temp file survives a failed save.
            let _ = fs::remove_file(&temp_path);
        }
        written?;

        info!(path = %path.display(), records = self.records.len(), "wrote lead store");
        Ok(())
    }

    /// Store-level metadata.
    #[must_use]
    pub fn metadata(&self) -> &StoreMetadata {
        &self.metadata
    }

    /// All records in store order.
    #[must_use]
    pub fn records(&self) -> &RecordMap {
        &self.records
    }

    /// Looks up a record by id.
    #[must_use]
    pub fn get(&self, id: &RecordId) -> Option<&CompanyRecord> {
        self.records.get(id)
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Add a new record under a freshly generated id.
    pub fn insert(&mut self, record: CompanyRecord) -> RecordId {
        let mut id = RecordId::generate();
        while self.records.contains(&id) {
            id = RecordId::generate();
        }
        self.records.entries.push((id.clone(), record));
        id
    }

    /// Add a record under a caller-chosen id.
    pub fn insert_with_id(&mut self, id: RecordId, record: CompanyRecord) -> Result<(), StoreError> {
        self.records.insert(id, record)
    }

    /// Delete one record. Unknown ids fail with `KeyNotFound`.
    pub fn remove(&mut self, id: &RecordId) -> Result<CompanyRecord, StoreError> {
        let record = self.records.remove(id)?;
        debug!(%id, "removed record");
        Ok(record)
    }

    /// Delete several records atomically: if any id is missing nothing is
    /// removed.
    pub fn remove_all<'a>(
        &mut self,
        ids: impl IntoIterator<Item = &'a RecordId>,
    ) -> Result<Vec<(RecordId, CompanyRecord)>, StoreError> {
        let targets: HashSet<&RecordId> = ids.into_iter().collect();
        if let Some(missing) = targets.iter().find(|id| !self.records.contains(id)) {
            return Err(StoreError::KeyNotFound((*missing).clone()));
        }

        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.records.entries)
            .into_iter()
            .partition(|(id, _)| targets.contains(id));
        self.records.entries = kept;

        info!(removed = removed.len(), remaining = self.records.len(), "removed records");
        Ok(removed)
    }

    /// Apply a resolution by deleting every losing duplicate.
    pub fn apply(&mut self, resolution: &Resolution) -> Result<Vec<(RecordId, CompanyRecord)>, StoreError> {
        let removed: BTreeSet<RecordId> = resolution.removed();
        self.remove_all(&removed)
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(bytes)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    writer.get_ref().sync_all()
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{SignalStrength, SourceType, Tier};
    use tempfile::tempdir;

    const SAMPLE: &str = r#"{
        "metadata": { "last_updated": "2025-01-10T09:30:00.123456", "version": 2 },
        "companies": {
            "b-2": { "company_name": "Beta", "tier": "2" },
            "a-1": { "company_name": "Acme", "tier": "1", "signal_strength": "high",
                     "source_type": "youtube", "video_id": "xyz" },
            "c-3": { "company_name": "Gamma" }
        }
    }"#;

    #[test]
    fn test_load_preserves_file_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("leads.json");
        fs::write(&path, SAMPLE).unwrap();

        let store = LeadStore::load(&path).unwrap();
        let ids: Vec<&str> = store.records().ids().map(RecordId::as_str).collect();
        assert_eq!(ids, ["b-2", "a-1", "c-3"]);
        assert!(store.metadata().last_updated.is_some());
        assert_eq!(store.metadata().extra["version"], 2);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let err = LeadStore::load(dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn test_load_duplicate_ids_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("leads.json");
        fs::write(
            &path,
            r#"{ "companies": { "x": { "company_name": "A" }, "x": { "company_name": "B" } } }"#,
        )
        .unwrap();

        let err = LeadStore::load(&path).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey(id) if id.as_str() == "x"));
    }

    #[test]
    fn test_failed_save_removes_temp_file() {
        let dir = tempdir().unwrap();
        // A non-empty directory at the target path makes the rename fail.
        let path = dir.path().join("leads.json");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep"), "x").unwrap();

        let mut store = LeadStore::new();
        store.insert(CompanyRecord::new("Acme"));
        let err = store.save(&path).unwrap_err();

        assert!(matches!(err, StoreError::Io { .. }));
        assert!(!temp_path_for(&path).exists());
        assert!(path.join("keep").exists());
    }

    #[test]
    fn test_load_empty_document() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("leads.json");
        fs::write(&path, "{}").unwrap();

        let store = LeadStore::load(&path).unwrap();
        assert!(store.is_empty());
        assert!(store.metadata().last_updated.is_none());
    }

    #[test]
    fn test_malformed_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("leads.json");
        fs::write(&path, "{ \"companies\": [").unwrap();
        assert!(matches!(
            LeadStore::load(&path),
            Err(StoreError::Serialization(_))
        ));
    }

    #[test]
    fn test_save_updates_timestamp_and_roundtrips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("leads.json");
        fs::write(&path, SAMPLE).unwrap();

        let mut store = LeadStore::load(&path).unwrap();
        let before = store.metadata().last_updated;
        store.save(&path).unwrap();
        assert!(store.metadata().last_updated > before);

        let reloaded = LeadStore::load(&path).unwrap();
        assert_eq!(reloaded.records(), store.records());
        assert_eq!(
            reloaded.get(&RecordId::from("a-1")).unwrap().extra["video_id"],
            "xyz"
        );
        assert!(!temp_path_for(&path).exists());
    }

    #[test]
    fn test_insert_generates_unique_ids() {
        let mut store = LeadStore::new();
        let a = store.insert(CompanyRecord::new("Acme"));
        let b = store.insert(CompanyRecord::new("Acme"));
        assert_ne!(a, b);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_insert_with_existing_id_fails() {
        let mut store = LeadStore::new();
        store
            .insert_with_id(RecordId::from("x"), CompanyRecord::new("A"))
            .unwrap();
        let err = store
            .insert_with_id(RecordId::from("x"), CompanyRecord::new("B"))
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey(_)));
    }

    #[test]
    fn test_remove_unknown_id_fails() {
        let mut store = LeadStore::new();
        store.insert(CompanyRecord::new("Acme"));
        let err = store.remove(&RecordId::from("ghost")).unwrap_err();
        assert!(matches!(err, StoreError::KeyNotFound(id) if id.as_str() == "ghost"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_remove_all_is_all_or_nothing() {
        let mut store = LeadStore::new();
        let a = store.insert(CompanyRecord::new("A"));
        let b = store.insert(CompanyRecord::new("B"));
        let ghost = RecordId::from("ghost");

        assert!(store.remove_all([&a, &ghost]).is_err());
        assert_eq!(store.len(), 2);

        let removed = store.remove_all([&a]).unwrap();
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].0, a);
        assert!(store.get(&b).is_some());
    }

    #[test]
    fn test_serialized_layout() {
        let mut store = LeadStore::new();
        store
            .insert_with_id(
                RecordId::from("id-1"),
                CompanyRecord::new("Acme")
                    .with_tier(Tier::One)
                    .with_signal(SignalStrength::Medium)
                    .with_source(SourceType::ParallelApi),
            )
            .unwrap();

        let dir = tempdir().unwrap();
        let path = dir.path().join("leads.json");
        store.save(&path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(value["metadata"]["last_updated"].is_string());
        let rec = &value["companies"]["id-1"];
        assert_eq!(rec["company_name"], "Acme");
        assert_eq!(rec["tier"], "1");
        assert_eq!(rec["signal_strength"], "medium");
        assert_eq!(rec["source_type"], "parallel_api");
    }
}
