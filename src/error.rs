//! Error types for leadsdb.
//!
//! All errors are strongly typed using thiserror so callers can match on
//! specific conditions (a missing store file is handled very differently
//! from a bad weight table).

use std::path::PathBuf;

use thiserror::Error;

use crate::record::RecordId;

/// Errors raised by the JSON record store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing file does not exist; nothing can run against it.
    #[error("Store not found: {}", path.display())]
    NotFound {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// A record id was referenced that is not in the store.
    #[error("Record not found: {0}")]
    KeyNotFound(RecordId),

    /// A record id appeared twice (in the file or on insert).
    #[error("Duplicate record id: {0}")]
    DuplicateKey(RecordId),

    /// Filesystem failure while reading or writing the store.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File being read or written.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// The document could not be parsed or serialized.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Validation errors for configuration and caller input.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A lower-priority category is weighted above a higher one.
    #[error("Scoring weights for '{dimension}' must not rank a lower category above a higher one")]
    NonMonotonicWeights {
        /// Record field whose weights are out of order.
        dimension: &'static str,
    },

    /// A single weight is large enough that summing a score could overflow.
    #[error("Scoring weight '{field}' exceeds the maximum of {max}")]
    WeightTooLarge {
        /// Name of the offending weight.
        field: &'static str,
        /// Largest accepted value.
        max: u32,
    },

    /// A blank string was given where a record id is required.
    #[error("Record id cannot be empty")]
    EmptyRecordId,

    /// The config file exists but is not a valid weight/tie-break document.
    #[error("Failed to parse config {}: {message}", path.display())]
    ConfigParse {
        /// Config file path.
        path: PathBuf,
        /// Parser message.
        message: String,
    },

    /// An interactive run would mix the confirmation prompt into a JSON
    /// document on the same output.
    #[error("JSON output is only available for dry runs")]
    InteractiveJson,
}

/// Top-level error type for leadsdb.
#[derive(Debug, Error)]
pub enum LeadsError {
    /// Loading, saving or editing the store failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Config or caller input was rejected.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Writing a report or reading the operator's answer failed.
    #[error("Terminal I/O error: {0}")]
    Terminal(#[from] std::io::Error),

    /// A broken invariant inside the crate.
    #[error("Internal error: {message}")]
    Internal {
        /// What went wrong.
        message: String,
    },
}

impl LeadsError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if the backing store file was missing.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Store(StoreError::NotFound { .. }))
    }

    /// Returns true if a record id lookup failed.
    #[must_use]
    pub const fn is_key_not_found(&self) -> bool {
        matches!(self, Self::Store(StoreError::KeyNotFound(_)))
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Result type alias for leadsdb operations.
pub type LeadsResult<T> = Result<T, LeadsError>;
