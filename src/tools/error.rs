//! Tool error types.
//!
//! `ToolError` is what a tool returns from a failed invocation and what the
//! registry builds for its own refusals (unknown tool, disabled tool, budget
//! block). It never crosses the dispatch boundary as an `Err`: the registry
//! folds it into a failure [`ToolResult`](crate::tools::ToolResult).

use std::fmt;

/// Errors that can occur around a tool dispatch.
///
/// Boxed kind keeps the error small in `Result` types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolError {
    kind: Box<ToolErrorKind>,
}

/// Specific tool error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolErrorKind {
    /// No tool registered under this name
    NotFound {
        /// The requested name
        tool_name: String,
    },
    /// Tool is registered but disabled
    Disabled {
        /// The requested name
        tool_name: String,
    },
    /// The budget gate refused the call
    BudgetBlocked {
        /// The requested name
        tool_name: String,
        /// The gate's stated reason
        reason: String,
    },
    /// The tool ran and failed
    ExecutionFailed {
        /// The name of the tool
        tool_name: String,
        /// Underlying error description
        reason: String,
    },
    /// The tool rejected its parameters
    InvalidArguments {
        /// The name of the tool
        tool_name: String,
        /// What was invalid
        reason: String,
    },
    /// Internal error
    Internal {
        /// Description of the internal error
        message: String,
    },
}

impl ToolError {
    /// Creates a new ToolError with the given kind.
    #[must_use]
    pub fn new(kind: ToolErrorKind) -> Self {
        Self {
            kind: Box::new(kind),
        }
    }

    /// Returns a reference to the error kind.
    #[must_use]
    pub fn kind(&self) -> &ToolErrorKind {
        &self.kind
    }

    /// Creates a not found error.
    #[must_use]
    pub fn not_found(tool_name: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::NotFound {
            tool_name: tool_name.into(),
        })
    }

    /// Creates a disabled error.
    #[must_use]
    pub fn disabled(tool_name: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Disabled {
            tool_name: tool_name.into(),
        })
    }

    /// Creates a budget blocked error.
    #[must_use]
    pub fn budget_blocked(tool_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::BudgetBlocked {
            tool_name: tool_name.into(),
            reason: reason.into(),
        })
    }

    /// Creates an execution failed error.
    #[must_use]
    pub fn execution_failed(tool_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::ExecutionFailed {
            tool_name: tool_name.into(),
            reason: reason.into(),
        })
    }

    /// Creates an invalid arguments error.
    #[must_use]
    pub fn invalid_arguments(tool_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::InvalidArguments {
            tool_name: tool_name.into(),
            reason: reason.into(),
        })
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Internal {
            message: message.into(),
        })
    }

    /// Returns true if the tool was not registered.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(*self.kind, ToolErrorKind::NotFound { .. })
    }

    /// Returns true if the tool was disabled.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        matches!(*self.kind, ToolErrorKind::Disabled { .. })
    }

    /// Returns true if the budget gate refused the call.
    #[must_use]
    pub fn is_budget_blocked(&self) -> bool {
        matches!(*self.kind, ToolErrorKind::BudgetBlocked { .. })
    }

    /// Returns true if the refusal happened before the tool was invoked.
    #[must_use]
    pub fn is_refusal(&self) -> bool {
        self.is_not_found() || self.is_disabled() || self.is_budget_blocked()
    }
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind.as_ref() {
            ToolErrorKind::NotFound { tool_name } => {
                write!(
                    f,
                    "tool '{}' not found; verify the tool is registered",
                    tool_name
                )
            }
            ToolErrorKind::Disabled { tool_name } => {
                write!(
                    f,
                    "tool '{}' is disabled; enable it before calling",
                    tool_name
                )
            }
            ToolErrorKind::BudgetBlocked { tool_name, reason } => {
                write!(f, "tool '{}' blocked by budget: {}", tool_name, reason)
            }
            ToolErrorKind::ExecutionFailed { tool_name, reason } => {
                write!(f, "tool '{}' execution failed: {}", tool_name, reason)
            }
            ToolErrorKind::InvalidArguments { tool_name, reason } => {
                write!(
                    f,
                    "tool '{}' rejected its arguments: {}; check the parameter schema",
                    tool_name, reason
                )
            }
            ToolErrorKind::Internal { message } => {
                write!(f, "internal tool error: {}", message)
            }
        }
    }
}

impl std::error::Error for ToolError {}
