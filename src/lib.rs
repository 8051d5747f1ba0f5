//! # Toolgate: budget-gated tool registry
//!
//! A registry of named tools that agents call with JSON parameters. Every
//! call goes through one dispatch path that checks a budget gate before the
//! tool runs and records the tool's reported cost afterwards, attributed to
//! the calling agent, product and user.
//!
//! ## Architecture
//!
//! - **Tools**: the [`Tool`](tools::Tool) trait, [`ToolRegistry`](tools::ToolRegistry)
//!   and the built-in campaign and time tools
//! - **Budget**: the [`BudgetGate`](budget::BudgetGate) contract and a daily
//!   [`CostLedger`](budget::CostLedger) implementation
//! - **Store**: the document store the built-in tools persist to
//! - **Config / Logging**: TOML configuration and `tracing` setup
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use toolgate::prelude::*;
//!
//! #[tokio::main]
//! async fn main() {
//!     let ledger = CostLedger::new(BudgetLimits::new().with_global_daily(5.0));
//!     let mut registry = ToolRegistry::with_gate(Arc::new(ledger));
//!
//!     let store: Arc<dyn DocumentStore> = Arc::new(InMemoryDocumentStore::new());
//!     BuiltinTools::all(store).register_into(&mut registry);
//!
//!     let result = registry
//!         .execute(
//!             "create_campaign",
//!             json!({"name": "Spring launch"}),
//!             ExecutionContext::new().with_agent("planner"),
//!         )
//!         .await;
//!     println!("{}", result.message);
//! }
//! ```

pub mod budget;
pub mod config;
pub mod error;
pub mod logging;
pub mod store;
pub mod tools;
pub mod types;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::budget::{
        BudgetDecision, BudgetError, BudgetGate, BudgetLimits, BudgetQuery, CostEntry, CostLedger,
        CostSummary, UnmeteredGate,
    };
    pub use crate::config::{ToolgateConfig, ToolsConfig};
    pub use crate::error::{ToolgateError, ToolgateErrorKind};
    pub use crate::logging::{LogLevel, LoggingConfig};
    pub use crate::store::{DocumentStore, InMemoryDocumentStore, StoreError};
    pub use crate::tools::{
        BuiltinTools, ExecutionContext, RegisterOptions, RegisteredTool, RegistryMetrics, Tool,
        ToolCategory, ToolCost, ToolDefinition, ToolError, ToolExecutionFuture, ToolFilter,
        ToolRegistry, ToolResult,
    };
    pub use crate::types::{CampaignId, DispatchId};

    pub use serde_json::{json, Value};
    pub use std::sync::Arc;
}
