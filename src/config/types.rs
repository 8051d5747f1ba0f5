//! Configuration types.

use crate::budget::{BudgetGate, BudgetLimits, CostLedger, UnmeteredGate};
use crate::error::ToolgateError;
use crate::logging::LoggingConfig;
use crate::tools::{RegisterOptions, ToolCategory};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Root configuration structure for toolgate.
///
/// Maps directly to the TOML configuration file format:
///
/// ```toml
/// [logging]
/// level = "debug"
///
/// [budget]
/// global_daily_usd = 5.0
///
/// [budget.tools]
/// send_email = 1.0
///
/// [tools]
/// disabled = ["post_linkedin"]
///
/// [tools.categories]
/// create_campaign = "marketing"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolgateConfig {
    /// File logging; absent means log to stderr only.
    #[serde(default)]
    pub logging: Option<LoggingConfig>,

    /// Daily spending limits.
    #[serde(default)]
    pub budget: BudgetLimits,

    /// Registration overrides.
    #[serde(default)]
    pub tools: ToolsConfig,
}

impl ToolgateConfig {
    /// Creates an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the logging section.
    #[must_use]
    pub fn with_logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = Some(logging);
        self
    }

    /// Sets the budget limits.
    #[must_use]
    pub fn with_budget(mut self, budget: BudgetLimits) -> Self {
        self.budget = budget;
        self
    }

    /// Sets the tool overrides.
    #[must_use]
    pub fn with_tools(mut self, tools: ToolsConfig) -> Self {
        self.tools = tools;
        self
    }

    /// Builds a ledger enforcing `[budget]`, or `None` when no limit is set.
    #[must_use]
    pub fn cost_ledger(&self) -> Option<CostLedger> {
        if self.budget.is_empty() {
            return None;
        }
        Some(CostLedger::new(self.budget.clone()))
    }

    /// The gate to hand to the registry.
    ///
    /// Falls back to [`UnmeteredGate`] when no limit is configured.
    #[must_use]
    pub fn budget_gate(&self) -> Arc<dyn BudgetGate> {
        match self.cost_ledger() {
            Some(ledger) => Arc::new(ledger),
            None => Arc::new(UnmeteredGate),
        }
    }

    /// Checks values serde cannot.
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the first negative or
    /// non-finite budget limit.
    pub fn validate(&self) -> Result<(), ToolgateError> {
        let check = |field: String, usd: f64| {
            if usd.is_finite() && usd >= 0.0 {
                Ok(())
            } else {
                Err(ToolgateError::configuration(
                    field,
                    format!("must be a non-negative amount in USD, got {usd}"),
                ))
            }
        };

        if let Some(usd) = self.budget.global_daily_usd {
            check("budget.global_daily_usd".to_string(), usd)?;
        }
        let tables = [
            ("tools", &self.budget.tools),
            ("agents", &self.budget.agents),
            ("products", &self.budget.products),
            ("users", &self.budget.users),
        ];
        for (table, limits) in tables {
            for (key, usd) in limits {
                check(format!("budget.{table}.{key}"), *usd)?;
            }
        }
        Ok(())
    }
}

/// Registration overrides from the `[tools]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Tools registered in the disabled state.
    pub disabled: Vec<String>,
    /// Category per tool name, replacing the tool's default.
    pub categories: HashMap<String, ToolCategory>,
}

impl ToolsConfig {
    /// Marks `name` as disabled at registration.
    #[must_use]
    pub fn with_disabled(mut self, name: impl Into<String>) -> Self {
        self.disabled.push(name.into());
        self
    }

    /// Overrides the category of `name`.
    #[must_use]
    pub fn with_category(mut self, name: impl Into<String>, category: ToolCategory) -> Self {
        self.categories.insert(name.into(), category);
        self
    }

    /// Registration options for `name`, starting from its default category.
    #[must_use]
    pub fn options_for(&self, name: &str, default: Option<ToolCategory>) -> RegisterOptions {
        let options = RegisterOptions::new();
        let options = match self.categories.get(name).copied().or(default) {
            Some(category) => options.with_category(category),
            None => options,
        };
        options.with_enabled(!self.disabled.iter().any(|d| d == name))
    }
}
