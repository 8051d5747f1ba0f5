//! Top-level error type for toolgate.
//!
//! Dispatch outcomes never surface here: every tool failure is folded into a
//! [`ToolResult`](crate::tools::ToolResult). This type covers the setup
//! surface only (loading configuration, installing logging).
//!
//! No external error crates (anyhow, thiserror, eyre) are used in the library.

use std::fmt;

/// Errors raised while assembling a toolgate runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolgateError {
    /// The specific error that occurred
    pub kind: ToolgateErrorKind,
}

/// Specific setup error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolgateErrorKind {
    /// Configuration could not be read or parsed
    Configuration {
        /// Which setting or source was invalid
        field: String,
        /// Why it was invalid
        reason: String,
    },
    /// Logging could not be initialized
    Logging {
        /// Description of the failure
        reason: String,
    },
}

impl ToolgateError {
    /// Creates a new ToolgateError with the given kind.
    #[must_use]
    pub fn new(kind: ToolgateErrorKind) -> Self {
        Self { kind }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn configuration(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(ToolgateErrorKind::Configuration {
            field: field.into(),
            reason: reason.into(),
        })
    }

    /// Creates a logging error.
    #[must_use]
    pub fn logging(reason: impl Into<String>) -> Self {
        Self::new(ToolgateErrorKind::Logging {
            reason: reason.into(),
        })
    }

    /// Returns true if this error indicates a configuration problem.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self.kind, ToolgateErrorKind::Configuration { .. })
    }

    /// Returns true if the tracing subscriber could not be installed.
    #[must_use]
    pub fn is_logging(&self) -> bool {
        matches!(self.kind, ToolgateErrorKind::Logging { .. })
    }
}

impl fmt::Display for ToolgateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ToolgateErrorKind::Configuration { field, reason } => {
                write!(f, "configuration error for '{}': {}", field, reason)
            }
            ToolgateErrorKind::Logging { reason } => {
                write!(f, "logging setup failed: {}", reason)
            }
        }
    }
}

impl std::error::Error for ToolgateError {}
