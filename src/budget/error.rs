//! Budget gate errors.

use std::fmt;

/// Errors a budget gate can report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetError {
    /// The specific error that occurred
    pub kind: BudgetErrorKind,
}

/// Specific budget error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BudgetErrorKind {
    /// A cost entry carried a negative or non-finite amount
    InvalidCost {
        /// The tool the entry was for
        tool_name: String,
        /// The rejected amount, as text
        amount: String,
    },
    /// The backing tracker could not be reached
    Unavailable {
        /// Description of the failure
        reason: String,
    },
}

impl BudgetError {
    /// Creates a new BudgetError with the given kind.
    #[must_use]
    pub fn new(kind: BudgetErrorKind) -> Self {
        Self { kind }
    }

    /// Creates an invalid cost error.
    #[must_use]
    pub fn invalid_cost(tool_name: impl Into<String>, amount: f64) -> Self {
        Self::new(BudgetErrorKind::InvalidCost {
            tool_name: tool_name.into(),
            amount: amount.to_string(),
        })
    }

    /// Creates an unavailable error.
    #[must_use]
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::new(BudgetErrorKind::Unavailable {
            reason: reason.into(),
        })
    }
}

impl fmt::Display for BudgetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            BudgetErrorKind::InvalidCost { tool_name, amount } => {
                write!(
                    f,
                    "invalid cost {} reported by tool '{}'; costs must be finite and non-negative",
                    amount, tool_name
                )
            }
            BudgetErrorKind::Unavailable { reason } => {
                write!(f, "budget tracker unavailable: {}", reason)
            }
        }
    }
}

impl std::error::Error for BudgetError {}
