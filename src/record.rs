//! Company record types and identity.
//!
//! A record is one company/lead as written by the ingestion scripts. The
//! categorical fields are typed here so that unknown or missing values
//! resolve to a documented fallback instead of ad hoc per-call defaults.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::ValidationError;

/// Opaque, stable record identifier.
///
/// Ids are assigned once at creation time and never derived from record
/// content. Ids already present in a store file are kept verbatim.
///
/// # Examples
///
/// ```
/// use leadsdb::RecordId;
///
/// let id = RecordId::generate();
/// assert!(!id.as_str().is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Creates a new random record id.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Creates a record id from caller input, rejecting blank ids.
    pub fn parse(raw: impl Into<String>) -> Result<Self, ValidationError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(ValidationError::EmptyRecordId);
        }
        Ok(Self(raw))
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Priority tier assigned by ingestion. Lower number = higher priority.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawTier", into = "String")]
pub enum Tier {
    /// Tier 1, the highest priority.
    One,
    /// Tier 2.
    Two,
    /// Tier 3.
    Three,
    /// Tier 4, scored like an unknown tier.
    Four,
    /// Any value outside 1-4, kept verbatim.
    Other(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTier {
    Text(String),
    Number(i64),
    Other(Value),
}

impl From<RawTier> for Tier {
    fn from(raw: RawTier) -> Self {
        match raw {
            RawTier::Text(s) => Self::from(s),
            RawTier::Number(n) => Self::from(n.to_string()),
            RawTier::Other(v) => Self::Other(v.to_string()),
        }
    }
}

impl From<String> for Tier {
    fn from(s: String) -> Self {
        match s.as_str() {
            "1" => Self::One,
            "2" => Self::Two,
            "3" => Self::Three,
            "4" => Self::Four,
            _ => Self::Other(s),
        }
    }
}

impl From<Tier> for String {
    fn from(tier: Tier) -> Self {
        tier.as_str().to_string()
    }
}

impl Tier {
    /// Returns the persisted string form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::One => "1",
            Self::Two => "2",
            Self::Three => "3",
            Self::Four => "4",
            Self::Other(s) => s,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strength of the buying signal behind a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SignalStrength {
    /// `high`
    High,
    /// `medium`
    Medium,
    /// `low`
    Low,
    /// Unrecognized value, kept verbatim.
    Other(String),
}

impl From<String> for SignalStrength {
    fn from(s: String) -> Self {
        match s.as_str() {
            "high" => Self::High,
            "medium" => Self::Medium,
            "low" => Self::Low,
            _ => Self::Other(s),
        }
    }
}

impl From<SignalStrength> for String {
    fn from(signal: SignalStrength) -> Self {
        signal.as_str().to_string()
    }
}

impl SignalStrength {
    /// Returns the persisted string form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Other(s) => s,
        }
    }
}

impl fmt::Display for SignalStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which ingestion pipeline produced a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SourceType {
    /// Extracted from a YouTube video description.
    Youtube,
    /// Returned by the company-search API.
    ParallelApi,
    /// Entered by hand.
    Manual,
    /// Unrecognized value, kept verbatim.
    Other(String),
}

impl From<String> for SourceType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "youtube" => Self::Youtube,
            "parallel_api" => Self::ParallelApi,
            "manual" => Self::Manual,
            _ => Self::Other(s),
        }
    }
}

impl From<SourceType> for String {
    fn from(source: SourceType) -> Self {
        source.as_str().to_string()
    }
}

impl SourceType {
    /// Returns the persisted string form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Youtube => "youtube",
            Self::ParallelApi => "parallel_api",
            Self::Manual => "manual",
            Self::Other(s) => s,
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One company/lead entity.
///
/// Keys the scorer does not know about are kept in `extra` and written back
/// untouched. Decoding never fails on a field's value: a known field with the
/// wrong JSON type is treated as absent, its raw value goes to `extra` so it
/// survives a save, and its key is reported by [`CompanyRecord::invalid_fields`].
///
/// # Examples
///
/// ```
/// use leadsdb::{CompanyRecord, Tier};
///
/// let record = CompanyRecord::new("Acme").with_tier(Tier::One);
/// assert_eq!(record.name(), Some("Acme"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct CompanyRecord {
    /// Company name; the dedup key after trimming and lowercasing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,

    /// Ingestion priority tier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<Tier>,

    /// Buying-signal strength.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal_strength: Option<SignalStrength>,

    /// Pipeline that produced the record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_type: Option<SourceType>,

    /// Company website.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,

    /// Free-text description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Use case named in the source material.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_case: Option<String>,

    /// Industry label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,

    /// Every other key, plus known keys whose value had the wrong type.
    #[serde(flatten)]
    pub extra: Map<String, Value>,

    #[serde(skip)]
    invalid_fields: Vec<String>,
}

fn present(field: Option<&String>) -> bool {
    field.is_some_and(|s| !s.trim().is_empty())
}

/// Moves `key` out of `map` and parses it. Null reads as absent. A value
/// `parse` rejects is put back under the same key and `key` is recorded.
fn take_field<T>(
    map: &mut Map<String, Value>,
    key: &str,
    invalid: &mut Vec<String>,
    parse: impl FnOnce(&Value) -> Option<T>,
) -> Option<T> {
    let value = map.remove(key)?;
    if value.is_null() {
        return None;
    }
    let parsed = parse(&value);
    if parsed.is_none() {
        invalid.push(key.to_string());
        map.insert(key.to_string(), value);
    }
    parsed
}

fn text(value: &Value) -> Option<String> {
    value.as_str().map(str::to_string)
}

fn tier_value(value: &Value) -> Option<Tier> {
    match value {
        Value::String(s) => Some(Tier::from(s.clone())),
        Value::Number(n) => n.as_i64().map(|n| Tier::from(n.to_string())),
        _ => None,
    }
}

impl From<Map<String, Value>> for CompanyRecord {
    fn from(mut map: Map<String, Value>) -> Self {
        let mut invalid = Vec::new();
        let company_name = take_field(&mut map, "company_name", &mut invalid, text);
        let tier = take_field(&mut map, "tier", &mut invalid, tier_value);
        let signal_strength = take_field(&mut map, "signal_strength", &mut invalid, |v| {
            text(v).map(SignalStrength::from)
        });
        let source_type = take_field(&mut map, "source_type", &mut invalid, |v| {
            text(v).map(SourceType::from)
        });
        let website = take_field(&mut map, "website", &mut invalid, text);
        let description = take_field(&mut map, "description", &mut invalid, text);
        let use_case = take_field(&mut map, "use_case", &mut invalid, text);
        let industry = take_field(&mut map, "industry", &mut invalid, text);

        Self {
            company_name,
            tier,
            signal_strength,
            source_type,
            website,
            description,
            use_case,
            industry,
            extra: map,
            invalid_fields: invalid,
        }
    }
}

impl CompanyRecord {
    /// Creates a record with only a company name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            company_name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Sets the tier.
    #[must_use]
    pub fn with_tier(mut self, tier: Tier) -> Self {
        self.tier = Some(tier);
        self
    }

    /// Sets the signal strength.
    #[must_use]
    pub fn with_signal(mut self, signal: SignalStrength) -> Self {
        self.signal_strength = Some(signal);
        self
    }

    /// Sets the source type.
    #[must_use]
    pub fn with_source(mut self, source: SourceType) -> Self {
        self.source_type = Some(source);
        self
    }

    /// Sets the website.
    #[must_use]
    pub fn with_website(mut self, website: impl Into<String>) -> Self {
        self.website = Some(website.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the use case.
    #[must_use]
    pub fn with_use_case(mut self, use_case: impl Into<String>) -> Self {
        self.use_case = Some(use_case.into());
        self
    }

    /// Sets the industry.
    #[must_use]
    pub fn with_industry(mut self, industry: impl Into<String>) -> Self {
        self.industry = Some(industry.into());
        self
    }

    /// Returns the display name, or `None` if it is missing or blank.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.company_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
    }

    /// Known fields whose stored value had the wrong JSON type, in field
    /// order. Their raw values are in `extra`.
    #[must_use]
    pub fn invalid_fields(&self) -> &[String] {
        &self.invalid_fields
    }

    /// True if `website` is set and not blank.
    #[must_use]
    pub fn has_website(&self) -> bool {
        present(self.website.as_ref())
    }

    /// True if `description` is set and not blank.
    #[must_use]
    pub fn has_description(&self) -> bool {
        present(self.description.as_ref())
    }

    /// True if `use_case` is set and not blank.
    #[must_use]
    pub fn has_use_case(&self) -> bool {
        present(self.use_case.as_ref())
    }

    /// True if `industry` is set and not blank.
    #[must_use]
    pub fn has_industry(&self) -> bool {
        present(self.industry.as_ref())
    }
}
