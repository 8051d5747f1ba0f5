//! Tool registry and dispatch gateway.
//!
//! The registry is the single source of truth for which tools exist and
//! whether each is usable, and [`ToolRegistry::execute`] is the only path by
//! which a tool is invoked. Every dispatch follows the same pipeline:
//!
//! ```text
//! execute(name, params, ctx)
//!   -> lookup          (missing  -> failure, nothing else happens)
//!   -> enabled check   (disabled -> failure, nothing else happens)
//!   -> gate.should_block          (blocked -> failure, tool never runs)
//!   -> tool.execute(params)       (error or panic -> failure)
//!   -> gate.log(cost)  if cost.usd > 0 (failure only logged)
//!   -> ToolResult
//! ```
//!
//! Nothing escapes `execute` as an error or a panic; every outcome is a
//! [`ToolResult`].

use crate::budget::{BudgetDecision, BudgetGate, BudgetQuery, CostEntry, UnmeteredGate};
use crate::tools::context::ExecutionContext;
use crate::tools::definition::{RegisterOptions, Tool, ToolCategory, ToolDefinition};
use crate::tools::error::ToolError;
use crate::tools::result::ToolResult;
use crate::types::DispatchId;
use futures::FutureExt;
use serde_json::{json, Value};
use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::Instrument;

/// The future returned by [`ToolRegistry::execute`].
///
/// Owns everything it needs, so the registry may be mutated while it runs.
pub type DispatchFuture = Pin<Box<dyn Future<Output = ToolResult> + Send + 'static>>;

/// A registry entry.
#[derive(Debug, Clone)]
pub struct RegisteredTool {
    tool: Arc<dyn Tool>,
    category: Option<ToolCategory>,
    enabled: bool,
}

impl RegisteredTool {
    /// The registry key.
    #[must_use]
    pub fn name(&self) -> &str {
        self.tool.name()
    }

    /// The tool's description.
    #[must_use]
    pub fn description(&self) -> &str {
        self.tool.description()
    }

    /// The tool's parameter schema.
    #[must_use]
    pub fn parameter_schema(&self) -> Value {
        self.tool.parameter_schema()
    }

    /// Category assigned at registration.
    #[must_use]
    pub fn category(&self) -> Option<ToolCategory> {
        self.category
    }

    /// Whether the tool can currently be dispatched.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The tool itself.
    #[must_use]
    pub fn tool(&self) -> &Arc<dyn Tool> {
        &self.tool
    }

    /// The planner-facing definition.
    #[must_use]
    pub fn definition(&self) -> ToolDefinition {
        self.tool.definition()
    }
}

/// Conjunctive filter for [`ToolRegistry::list`].
///
/// Unset dimensions match everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ToolFilter {
    /// Only tools with this category
    pub category: Option<ToolCategory>,
    /// Only tools in this enabled state
    pub enabled: Option<bool>,
}

impl ToolFilter {
    /// Matches every entry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts to one category.
    #[must_use]
    pub fn with_category(mut self, category: ToolCategory) -> Self {
        self.category = Some(category);
        self
    }

    /// Restricts to one enabled state.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    /// Whether `entry` passes every set dimension.
    #[must_use]
    pub fn matches(&self, entry: &RegisteredTool) -> bool {
        self.category.map_or(true, |c| entry.category == Some(c))
            && self.enabled.map_or(true, |e| entry.enabled == e)
    }
}

/// Counters for the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryMetrics {
    /// Register calls that stored an entry (including replacements)
    pub tools_registered: u64,
    /// Unregister calls that removed an entry
    pub tools_unregistered: u64,
    /// Calls to `execute`
    pub dispatches_requested: u64,
    /// Dispatches that returned `success: true`
    pub dispatches_succeeded: u64,
    /// Dispatches that returned `success: false`, for any reason
    pub dispatches_failed: u64,
    /// Dispatches refused by the budget gate
    pub dispatches_blocked: u64,
    /// Costs accepted by the gate's log
    pub costs_logged: u64,
    /// Costs the gate failed to record
    pub cost_log_failures: u64,
}

#[derive(Debug, Default)]
struct Counters {
    tools_registered: AtomicU64,
    tools_unregistered: AtomicU64,
    dispatches_requested: AtomicU64,
    dispatches_succeeded: AtomicU64,
    dispatches_failed: AtomicU64,
    dispatches_blocked: AtomicU64,
    costs_logged: AtomicU64,
    cost_log_failures: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> RegistryMetrics {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        RegistryMetrics {
            tools_registered: load(&self.tools_registered),
            tools_unregistered: load(&self.tools_unregistered),
            dispatches_requested: load(&self.dispatches_requested),
            dispatches_succeeded: load(&self.dispatches_succeeded),
            dispatches_failed: load(&self.dispatches_failed),
            dispatches_blocked: load(&self.dispatches_blocked),
            costs_logged: load(&self.costs_logged),
            cost_log_failures: load(&self.cost_log_failures),
        }
    }
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

/// Registry of tools, keyed by name.
///
/// Owned by the composition root and handed to whatever drives dispatch.
/// Mutations take `&mut self` and are visible to the next call; dispatches
/// take `&self` and snapshot what they need, so they may overlap freely.
/// The registry does not serialize concurrent dispatches of the same tool;
/// a gate that needs that must enforce it itself.
///
/// # Example
///
/// ```rust,ignore
/// let mut registry = ToolRegistry::with_gate(Arc::new(ledger));
/// registry.register(Arc::new(SendEmail::new(client)), RegisterOptions::new().with_category(ToolCategory::Social));
///
/// let result = registry
///     .execute("send_email", json!({"to": "a@b.c"}), ExecutionContext::new().with_agent("outreach"))
///     .await;
/// if !result.success {
///     eprintln!("{}", result.message);
/// }
/// ```
#[derive(Debug)]
pub struct ToolRegistry {
    tools: HashMap<String, RegisteredTool>,
    /// Names in first-registration order
    order: Vec<String>,
    gate: Arc<dyn BudgetGate>,
    counters: Arc<Counters>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    /// Creates a registry with no budget enforcement.
    ///
    /// Uses [`UnmeteredGate`]: every call is allowed and costs are dropped.
    #[must_use]
    pub fn new() -> Self {
        Self::with_gate(Arc::new(UnmeteredGate))
    }

    /// Creates a registry enforcing `gate`.
    #[must_use]
    pub fn with_gate(gate: Arc<dyn BudgetGate>) -> Self {
        Self {
            tools: HashMap::new(),
            order: Vec::new(),
            gate,
            counters: Arc::new(Counters::default()),
        }
    }

    /// The gate consulted on every dispatch.
    #[must_use]
    pub fn gate(&self) -> &Arc<dyn BudgetGate> {
        &self.gate
    }

    /// Inserts `tool`, replacing any entry with the same name.
    ///
    /// Replacement is total: category and enabled state come from `options`,
    /// never from the previous entry. The entry keeps its original position
    /// in listing order. A tool with an empty name is not stored.
    pub fn register(&mut self, tool: Arc<dyn Tool>, options: RegisterOptions) {
        let name = tool.name().to_string();
        if name.is_empty() {
            tracing::warn!(tool = ?tool, "Tool with empty name not registered");
            return;
        }

        let entry = RegisteredTool {
            tool,
            category: options.category,
            enabled: options.enabled,
        };

        if self.tools.insert(name.clone(), entry).is_some() {
            tracing::info!(
                tool_name = %name,
                category = ?options.category,
                enabled = options.enabled,
                "Tool re-registered; previous entry replaced"
            );
        } else {
            self.order.push(name.clone());
            tracing::info!(
                tool_name = %name,
                category = ?options.category,
                enabled = options.enabled,
                "Tool registered"
            );
        }
        bump(&self.counters.tools_registered);
    }

    /// Registers each tool in order with the same options.
    pub fn register_all<I>(&mut self, tools: I, options: RegisterOptions)
    where
        I: IntoIterator<Item = Arc<dyn Tool>>,
    {
        for tool in tools {
            self.register(tool, options);
        }
    }

    /// Removes `name`; returns whether an entry existed.
    pub fn unregister(&mut self, name: &str) -> bool {
        if self.tools.remove(name).is_none() {
            return false;
        }
        self.order.retain(|n| n != name);
        bump(&self.counters.tools_unregistered);
        tracing::info!(tool_name = %name, "Tool unregistered");
        true
    }

    /// Looks up an entry.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&RegisteredTool> {
        self.tools.get(name)
    }

    /// Whether an entry exists for `name`, enabled or not.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Entries matching `filter`, in registration order.
    #[must_use]
    pub fn list(&self, filter: &ToolFilter) -> Vec<&RegisteredTool> {
        self.entries().filter(|entry| filter.matches(entry)).collect()
    }

    /// Definitions of the enabled tools, optionally limited to one category.
    ///
    /// Disabled tools are never included, whatever the caller asks for.
    /// This is what gets offered to a planner.
    #[must_use]
    pub fn definitions(&self, category: Option<ToolCategory>) -> Vec<ToolDefinition> {
        let filter = ToolFilter {
            category,
            enabled: Some(true),
        };
        self.list(&filter)
            .into_iter()
            .map(RegisteredTool::definition)
            .collect()
    }

    /// Enables `name`; returns whether the entry exists.
    pub fn enable(&mut self, name: &str) -> bool {
        self.set_enabled(name, true)
    }

    /// Disables `name`; returns whether the entry exists.
    ///
    /// Dispatches already past the lookup are not affected.
    pub fn disable(&mut self, name: &str) -> bool {
        self.set_enabled(name, false)
    }

    fn set_enabled(&mut self, name: &str, enabled: bool) -> bool {
        let Some(entry) = self.tools.get_mut(name) else {
            return false;
        };
        if entry.enabled != enabled {
            entry.enabled = enabled;
            tracing::info!(tool_name = %name, enabled, "Tool state changed");
        }
        true
    }

    /// Number of entries, enabled and disabled.
    #[must_use]
    pub fn count(&self) -> usize {
        self.tools.len()
    }

    /// True when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        let removed = self.tools.len();
        self.tools.clear();
        self.order.clear();
        tracing::info!(removed, "Tool registry cleared");
    }

    /// Current counter values.
    #[must_use]
    pub fn metrics(&self) -> RegistryMetrics {
        self.counters.snapshot()
    }

    fn entries(&self) -> impl Iterator<Item = &RegisteredTool> {
        self.order.iter().filter_map(|name| self.tools.get(name))
    }

    /// Dispatches `params` to the tool registered as `name`.
    ///
    /// Lookup and the enabled check happen now; the returned future carries
    /// out the budget check, the invocation and the cost log. Unknown and
    /// disabled tools resolve immediately without consulting the gate.
    pub fn execute(&self, name: &str, params: Value, context: ExecutionContext) -> DispatchFuture {
        let dispatch_id = DispatchId::new();
        let span = tracing::info_span!("dispatch", tool = %name, dispatch_id = %dispatch_id);
        bump(&self.counters.dispatches_requested);

        let tool = match self.tools.get(name) {
            None => Err(ToolError::not_found(name)),
            Some(entry) if !entry.enabled => Err(ToolError::disabled(name)),
            Some(entry) => Ok(Arc::clone(&entry.tool)),
        };

        let tool = match tool {
            Ok(tool) => tool,
            Err(error) => {
                span.in_scope(|| tracing::warn!(error = %error, "Dispatch refused"));
                bump(&self.counters.dispatches_failed);
                return Box::pin(futures::future::ready(ToolResult::from_error(&error)));
            }
        };

        let dispatch = Dispatch {
            name: name.to_string(),
            tool,
            gate: Arc::clone(&self.gate),
            counters: Arc::clone(&self.counters),
            context,
            params,
        };
        Box::pin(dispatch.run().instrument(span))
    }
}

/// One dispatch past the lookup stage.
struct Dispatch {
    name: String,
    tool: Arc<dyn Tool>,
    gate: Arc<dyn BudgetGate>,
    counters: Arc<Counters>,
    context: ExecutionContext,
    params: Value,
}

impl Dispatch {
    async fn run(self) -> ToolResult {
        let Dispatch {
            name,
            tool,
            gate,
            counters,
            context,
            params,
        } = self;

        let query = BudgetQuery::new(&name, &context);
        let decision = match AssertUnwindSafe(gate.should_block(&query))
            .catch_unwind()
            .await
        {
            Ok(Ok(decision)) => decision,
            Ok(Err(error)) => BudgetDecision::block(format!("budget check failed: {error}")),
            Err(panic) => BudgetDecision::block(format!(
                "budget check panicked: {}",
                panic_message(panic.as_ref())
            )),
        };

        if decision.blocked {
            let reason = decision
                .reason
                .unwrap_or_else(|| "budget gate gave no reason".to_string());
            let error = ToolError::budget_blocked(&name, reason);
            tracing::warn!(error = %error, "Dispatch blocked by budget gate");
            bump(&counters.dispatches_blocked);
            bump(&counters.dispatches_failed);
            return ToolResult::from_error(&error);
        }

        tracing::debug!("Invoking tool");
        let logged_params = params.clone();
        let outcome = match std::panic::catch_unwind(AssertUnwindSafe(|| tool.execute(params))) {
            Ok(future) => AssertUnwindSafe(future).catch_unwind().await,
            Err(panic) => Err(panic),
        };

        let result = match outcome {
            Ok(Ok(result)) => result,
            Ok(Err(error)) => {
                tracing::warn!(error = %error, "Tool returned an error");
                bump(&counters.dispatches_failed);
                return ToolResult::from_error(&error);
            }
            Err(panic) => {
                let error = ToolError::execution_failed(
                    &name,
                    format!("panicked: {}", panic_message(panic.as_ref())),
                );
                tracing::error!(error = %error, "Tool panicked");
                bump(&counters.dispatches_failed);
                return ToolResult::from_error(&error);
            }
        };

        if let Some(cost) = result.billable_cost() {
            let entry = CostEntry::new(&name, cost.clone(), &context)
                .with_meta(json!({ "params": logged_params }));
            match AssertUnwindSafe(gate.log(entry)).catch_unwind().await {
                Ok(Ok(())) => {
                    bump(&counters.costs_logged);
                    tracing::debug!(usd = cost.usd, provider = %cost.provider, "Cost logged");
                }
                Ok(Err(error)) => {
                    bump(&counters.cost_log_failures);
                    tracing::warn!(usd = cost.usd, error = %error, "Cost log failed; result unchanged");
                }
                Err(panic) => {
                    bump(&counters.cost_log_failures);
                    tracing::warn!(
                        usd = cost.usd,
                        panic = %panic_message(panic.as_ref()),
                        "Cost log panicked; result unchanged"
                    );
                }
            }
        }

        if result.success {
            bump(&counters.dispatches_succeeded);
            tracing::debug!("Dispatch succeeded");
        } else {
            bump(&counters.dispatches_failed);
            tracing::debug!(message = %result.message, "Tool reported failure");
        }
        result
    }
}

/// Best-effort text for a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
