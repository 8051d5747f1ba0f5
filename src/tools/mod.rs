//! Tool registration and dispatch.
//!
//! A tool is any named capability an agent can call with JSON parameters.
//! Tools are registered in a [`ToolRegistry`], which is the only way they
//! are ever invoked:
//!
//! ```text
//! +-------------------------------------------------------------+
//! |                       ToolRegistry                          |
//! |                                                             |
//! |  register / unregister / enable / disable                   |
//! |  list(filter) / definitions(category)                       |
//! |                                                             |
//! |  execute(name, params, ctx)                                 |
//! |     lookup -> enabled -> gate.should_block -> tool.execute  |
//! |            -> gate.log(cost) -> ToolResult                  |
//! +-------------------------------------------------------------+
//!                 |                          |
//!                 v                          v
//!          Arc<dyn Tool>            Arc<dyn BudgetGate>
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use toolgate::prelude::*;
//!
//! let mut registry = ToolRegistry::new();
//! for (tool, category) in BuiltinTools::all(store).iter() {
//!     registry.register(Arc::clone(tool), RegisterOptions::new().with_category(*category));
//! }
//!
//! let result = registry
//!     .execute("current_time", json!({}), ExecutionContext::default())
//!     .await;
//! ```

pub mod builtins;
mod context;
mod definition;
mod error;
mod registry;
mod result;

pub use builtins::BuiltinTools;
pub use context::ExecutionContext;
pub use definition::{RegisterOptions, Tool, ToolCategory, ToolDefinition, ToolExecutionFuture};
pub use error::{ToolError, ToolErrorKind};
pub use registry::{DispatchFuture, RegisteredTool, RegistryMetrics, ToolFilter, ToolRegistry};
pub use result::{ToolCost, ToolResult};
