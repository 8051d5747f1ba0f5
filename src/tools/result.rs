//! Uniform dispatch outcome.

use crate::tools::error::ToolError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The outcome of a single dispatch.
///
/// Serializes as `{success, message, data?, cost?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Whether the call achieved its purpose
    pub success: bool,
    /// Message suitable for direct display
    pub message: String,
    /// Structured payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Marginal cost the tool incurred, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<ToolCost>,
}

/// A cost reported by a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCost {
    /// Amount in US dollars
    pub usd: f64,
    /// Who charged it (e.g. "sendgrid", "serpapi")
    pub provider: String,
    /// How many units were consumed
    pub units: f64,
    /// What a unit is (e.g. "email", "request", "token")
    pub unit_type: String,
}

impl ToolCost {
    /// Creates a cost of `usd` for `units` of `unit_type` charged by `provider`.
    #[must_use]
    pub fn new(
        usd: f64,
        provider: impl Into<String>,
        units: f64,
        unit_type: impl Into<String>,
    ) -> Self {
        Self {
            usd,
            provider: provider.into(),
            units,
            unit_type: unit_type.into(),
        }
    }

    /// True when this cost should be recorded (finite and above zero).
    #[must_use]
    pub fn is_billable(&self) -> bool {
        self.usd.is_finite() && self.usd > 0.0
    }
}

impl ToolResult {
    /// Creates a successful result.
    #[must_use]
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
            cost: None,
        }
    }

    /// Creates a failed result.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            cost: None,
        }
    }

    /// Folds an error into a failed result carrying its description.
    #[must_use]
    pub fn from_error(error: &ToolError) -> Self {
        Self::failure(error.to_string())
    }

    /// Attaches a payload.
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Attaches a cost.
    #[must_use]
    pub fn with_cost(mut self, cost: ToolCost) -> Self {
        self.cost = Some(cost);
        self
    }

    /// The cost, if one was reported and is worth recording.
    #[must_use]
    pub fn billable_cost(&self) -> Option<&ToolCost> {
        self.cost.as_ref().filter(|cost| cost.is_billable())
    }
}

impl From<ToolError> for ToolResult {
    fn from(error: ToolError) -> Self {
        Self::from_error(&error)
    }
}
