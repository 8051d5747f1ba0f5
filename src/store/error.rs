//! Document store errors.

use std::fmt;

/// Errors a document store can report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError {
    /// The specific error that occurred
    pub kind: StoreErrorKind,
}

/// Specific store error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreErrorKind {
    /// A document could not be converted to or from its typed form
    Serialization {
        /// Collection involved
        collection: String,
        /// Description of the failure
        reason: String,
    },
    /// The backing store could not be reached
    Unavailable {
        /// Description of the failure
        reason: String,
    },
}

impl StoreError {
    /// Creates a new StoreError with the given kind.
    #[must_use]
    pub fn new(kind: StoreErrorKind) -> Self {
        Self { kind }
    }

    /// Creates a serialization error.
    #[must_use]
    pub fn serialization(collection: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Serialization {
            collection: collection.into(),
            reason: reason.into(),
        })
    }

    /// Creates an unavailable error.
    #[must_use]
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Unavailable {
            reason: reason.into(),
        })
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            StoreErrorKind::Serialization { collection, reason } => {
                write!(f, "malformed document in '{}': {}", collection, reason)
            }
            StoreErrorKind::Unavailable { reason } => {
                write!(f, "document store unavailable: {}", reason)
            }
        }
    }
}

impl std::error::Error for StoreError {}
