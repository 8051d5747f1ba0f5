//! Per-call attribution.

use serde::{Deserialize, Serialize};

/// Who a dispatch is attributed to.
///
/// Scopes the budget check and the cost log of one call; never stored by the
/// registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionContext {
    /// Calling agent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    /// Product the work is for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    /// End user on whose behalf the call is made
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

impl ExecutionContext {
    /// An unattributed context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the agent.
    #[must_use]
    pub fn with_agent(mut self, agent: impl Into<String>) -> Self {
        self.agent = Some(agent.into());
        self
    }

    /// Sets the product.
    #[must_use]
    pub fn with_product(mut self, product: impl Into<String>) -> Self {
        self.product = Some(product.into());
        self
    }

    /// Sets the user.
    #[must_use]
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// True when no dimension is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.agent.is_none() && self.product.is_none() && self.user.is_none()
    }
}
