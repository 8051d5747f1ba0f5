//! The budget gate contract consumed by the registry.

use crate::budget::error::BudgetError;
use crate::tools::{ExecutionContext, ToolCost};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Debug;

/// What the registry asks the gate before invoking a tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetQuery {
    /// Tool about to be invoked
    pub tool: String,
    /// Calling agent
    pub agent: Option<String>,
    /// Product the call is for
    pub product: Option<String>,
    /// End user
    pub user: Option<String>,
}

impl BudgetQuery {
    /// Builds the query for `tool` attributed to `context`.
    #[must_use]
    pub fn new(tool: impl Into<String>, context: &ExecutionContext) -> Self {
        Self {
            tool: tool.into(),
            agent: context.agent.clone(),
            product: context.product.clone(),
            user: context.user.clone(),
        }
    }
}

/// The gate's answer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BudgetDecision {
    /// Whether the call must not proceed
    pub blocked: bool,
    /// Why, when blocked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl BudgetDecision {
    /// The call may proceed.
    #[must_use]
    pub fn allow() -> Self {
        Self::default()
    }

    /// The call must not proceed.
    #[must_use]
    pub fn block(reason: impl Into<String>) -> Self {
        Self {
            blocked: true,
            reason: Some(reason.into()),
        }
    }
}

/// A completed, billable call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostEntry {
    /// Tool that incurred the cost
    pub tool: String,
    /// The cost the tool reported
    pub cost: ToolCost,
    /// Calling agent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    /// Product the call was for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    /// End user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Free-form metadata; the registry stores `{"params": ...}` here
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

impl CostEntry {
    /// Builds an entry for `tool` attributed to `context`.
    #[must_use]
    pub fn new(tool: impl Into<String>, cost: ToolCost, context: &ExecutionContext) -> Self {
        Self {
            tool: tool.into(),
            cost,
            agent: context.agent.clone(),
            product: context.product.clone(),
            user: context.user.clone(),
            meta: None,
        }
    }

    /// Attaches metadata.
    #[must_use]
    pub fn with_meta(mut self, meta: Value) -> Self {
        self.meta = Some(meta);
        self
    }
}

/// Approves calls before execution and records their cost afterwards.
///
/// Implementations serialize their own accounting; the registry may run
/// several dispatches for the same tool concurrently, and two of them can
/// both pass `should_block` before either is logged.
#[async_trait]
pub trait BudgetGate: Send + Sync + Debug {
    /// Decides whether the described call may proceed.
    ///
    /// # Errors
    ///
    /// An error means no decision could be made; the registry treats it as
    /// a block.
    async fn should_block(&self, query: &BudgetQuery) -> Result<BudgetDecision, BudgetError>;

    /// Records the cost of a completed call.
    ///
    /// # Errors
    ///
    /// Failures are reported by the registry on its log channel and never
    /// change the dispatch outcome.
    async fn log(&self, entry: CostEntry) -> Result<(), BudgetError>;
}

/// A gate that never blocks and discards every cost.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnmeteredGate;

#[async_trait]
impl BudgetGate for UnmeteredGate {
    async fn should_block(&self, _query: &BudgetQuery) -> Result<BudgetDecision, BudgetError> {
        Ok(BudgetDecision::allow())
    }

    async fn log(&self, entry: CostEntry) -> Result<(), BudgetError> {
        tracing::trace!(tool = %entry.tool, usd = entry.cost.usd, "Cost not tracked (unmetered)");
        Ok(())
    }
}
