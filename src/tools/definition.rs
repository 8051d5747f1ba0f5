//! Tool contract and registration metadata.
//!
//! A tool is an independently implemented operation with a name, a
//! description, a JSON parameter schema and an asynchronous entry point.
//! The registry treats every tool as opaque: it never validates parameters
//! against the schema, which is advisory and exists for planner discovery.

use crate::tools::error::ToolError;
use crate::tools::result::ToolResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{self, Debug};
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;

/// The planner-facing description of a tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The name of the tool
    pub name: String,
    /// Description of what the tool does
    pub description: String,
    /// JSON Schema for the tool's input parameters
    #[serde(rename = "parameterSchema")]
    pub parameter_schema: Value,
}

/// Classification tag assigned to a tool at registration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolCategory {
    /// Calendars, reminders, timed posts
    Scheduling,
    /// Search and retrieval
    Knowledge,
    /// Campaigns, products, outreach
    Marketing,
    /// Agent memory
    Memory,
    /// Social network posting
    Social,
    /// Everything else
    Utility,
}

impl ToolCategory {
    /// All categories, in declaration order.
    pub const ALL: [ToolCategory; 6] = [
        Self::Scheduling,
        Self::Knowledge,
        Self::Marketing,
        Self::Memory,
        Self::Social,
        Self::Utility,
    ];

    /// Returns the lowercase tag for this category.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scheduling => "scheduling",
            Self::Knowledge => "knowledge",
            Self::Marketing => "marketing",
            Self::Memory => "memory",
            Self::Social => "social",
            Self::Utility => "utility",
        }
    }
}

impl fmt::Display for ToolCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(|c| c.as_str()).collect();
                format!("unknown category '{s}'; expected one of {}", known.join(", "))
            })
    }
}

/// Options applied when a tool is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterOptions {
    /// Category tag, if any
    pub category: Option<ToolCategory>,
    /// Initial enabled state
    pub enabled: bool,
}

impl RegisterOptions {
    /// Enabled, uncategorized.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the category.
    #[must_use]
    pub fn with_category(mut self, category: ToolCategory) -> Self {
        self.category = Some(category);
        self
    }

    /// Sets the initial enabled state.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Registers the tool in the disabled state.
    #[must_use]
    pub fn disabled(self) -> Self {
        self.with_enabled(false)
    }
}

impl Default for RegisterOptions {
    fn default() -> Self {
        Self {
            category: None,
            enabled: true,
        }
    }
}

/// The future returned by [`Tool::execute`].
pub type ToolExecutionFuture =
    Pin<Box<dyn Future<Output = Result<ToolResult, ToolError>> + Send + 'static>>;

/// A capability the registry can dispatch to.
///
/// Implementations validate their own parameters and report invalid input
/// either as `Err(ToolError)` or as a failure [`ToolResult`]; the registry
/// folds both into the same outcome. When the side effect has a known
/// marginal cost the tool reports it on the result via
/// [`ToolResult::with_cost`].
///
/// The registry applies no timeout. A tool that calls out to a network
/// service or subprocess is responsible for bounding that call itself.
///
/// # Example
///
/// ```rust
/// use serde_json::{json, Value};
/// use toolgate::tools::{Tool, ToolExecutionFuture, ToolResult};
///
/// #[derive(Debug)]
/// struct Echo;
///
/// impl Tool for Echo {
///     fn name(&self) -> &str {
///         "echo"
///     }
///
///     fn description(&self) -> &str {
///         "Returns its parameters unchanged"
///     }
///
///     fn parameter_schema(&self) -> Value {
///         json!({"type": "object"})
///     }
///
///     fn execute(&self, params: Value) -> ToolExecutionFuture {
///         Box::pin(async move { Ok(ToolResult::ok("echoed").with_data(params)) })
///     }
/// }
/// ```
pub trait Tool: Send + Sync + Debug {
    /// Unique, stable name used as the registry key.
    fn name(&self) -> &str;

    /// Human-readable description surfaced to the planner.
    fn description(&self) -> &str;

    /// JSON Schema describing valid parameters.
    fn parameter_schema(&self) -> Value;

    /// Runs the tool.
    ///
    /// The returned future must own everything it needs; clone shared state
    /// out of `self` before boxing.
    fn execute(&self, params: Value) -> ToolExecutionFuture;

    /// Builds the planner-facing definition.
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameter_schema: self.parameter_schema(),
        }
    }
}
