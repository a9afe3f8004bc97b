//! Duplicate grouping by normalized company name.
//!
//! Matching is exact after trimming and lowercasing. "Acme Inc." and "Acme"
//! land in different groups: missed duplicates are accepted in exchange for
//! never merging two different companies.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use tracing::{debug, warn};

use crate::record::{CompanyRecord, RecordId};
use crate::store::RecordMap;

/// Normalizes a company name into its dedup key.
///
/// ```
/// assert_eq!(leadsdb::normalize_name("  Acme Corp "), "acme corp");
/// ```
#[must_use]
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// What a group is keyed on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum GroupKey {
    /// Normalized company name.
    Name(String),
    /// A record with no usable name, isolated under its own id.
    Unnamed(RecordId),
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => write!(f, "{name}"),
            Self::Unnamed(id) => write!(f, "<unnamed:{id}>"),
        }
    }
}

/// Records sharing a group key, in store order.
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateGroup {
    /// Normalized name, or the id of an unnamed record.
    pub key: GroupKey,
    /// Members in store order.
    pub members: Vec<(RecordId, CompanyRecord)>,
}

impl DuplicateGroup {
    /// Returns true if the group holds more than one record.
    #[must_use]
    pub fn is_duplicate(&self) -> bool {
        self.members.len() > 1
    }
}

/// Partitions records by normalized name.
///
/// Groups come back in the order their first member appears in the store;
/// members keep store order. Records without a name are never grouped with
/// anything and are logged as malformed.
#[must_use]
pub fn group_by_name(records: &RecordMap) -> Vec<DuplicateGroup> {
    let mut groups: Vec<DuplicateGroup> = Vec::new();
    let mut index: HashMap<GroupKey, usize> = HashMap::new();

    for (id, record) in records.iter() {
        let key = if let Some(name) = record.name() {
            GroupKey::Name(normalize_name(name))
        } else {
            warn!(%id, "malformed record: missing company_name, isolating");
            GroupKey::Unnamed(id.clone())
        };

        let member = (id.clone(), record.clone());
        if let Some(&slot) = index.get(&key) {
            groups[slot].members.push(member);
        } else {
            index.insert(key.clone(), groups.len());
            groups.push(DuplicateGroup {
                key,
                members: vec![member],
            });
        }
    }

    debug!(
        records = records.len(),
        groups = groups.len(),
        duplicate_groups = groups.iter().filter(|g| g.is_duplicate()).count(),
        "grouped records by name"
    );
    groups
}
