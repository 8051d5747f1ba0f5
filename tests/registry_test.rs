//! Dispatch pipeline tests against recording gates and scripted tools.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use toolgate::budget::{
    BudgetDecision, BudgetError, BudgetGate, BudgetLimits, BudgetQuery, CostEntry, CostLedger,
};
use toolgate::store::{DocumentStore, InMemoryDocumentStore};
use toolgate::tools::{
    BuiltinTools, ExecutionContext, RegisterOptions, Tool, ToolCategory, ToolCost, ToolError,
    ToolExecutionFuture, ToolFilter, ToolRegistry, ToolResult,
};

#[derive(Debug, Default)]
struct RecordingGate {
    block_reason: Option<String>,
    fail_checks: bool,
    fail_logs: bool,
    panic_on_log: bool,
    checks: Mutex<Vec<BudgetQuery>>,
    logs: Mutex<Vec<CostEntry>>,
}

impl RecordingGate {
    fn allowing() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn blocking(reason: &str) -> Arc<Self> {
        Arc::new(Self {
            block_reason: Some(reason.to_string()),
            ..Self::default()
        })
    }

    fn check_count(&self) -> usize {
        self.checks.lock().unwrap().len()
    }

    fn log_count(&self) -> usize {
        self.logs.lock().unwrap().len()
    }
}

#[async_trait]
impl BudgetGate for RecordingGate {
    async fn should_block(&self, query: &BudgetQuery) -> Result<BudgetDecision, BudgetError> {
        self.checks.lock().unwrap().push(query.clone());
        if self.fail_checks {
            return Err(BudgetError::unavailable("ledger offline"));
        }
        Ok(match &self.block_reason {
            Some(reason) => BudgetDecision::block(reason.clone()),
            None => BudgetDecision::allow(),
        })
    }

    async fn log(&self, entry: CostEntry) -> Result<(), BudgetError> {
        self.logs.lock().unwrap().push(entry);
        if self.panic_on_log {
            panic!("ledger exploded");
        }
        if self.fail_logs {
            return Err(BudgetError::unavailable("ledger offline"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
enum Behavior {
    Succeed(Option<ToolCost>),
    ReportFailure,
    Error(String),
    Panic(&'static str),
    PanicBeforeFuture,
}

#[derive(Debug)]
struct ScriptedTool {
    name: &'static str,
    behavior: Behavior,
    calls: AtomicUsize,
}

impl ScriptedTool {
    fn new(name: &'static str, behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            name,
            behavior,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Tool for ScriptedTool {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        "scripted test tool"
    }

    fn parameter_schema(&self) -> Value {
        json!({"type": "object", "properties": {"to": {"type": "string"}}})
    }

    fn execute(&self, params: Value) -> ToolExecutionFuture {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let name = self.name;
        let behavior = self.behavior.clone();
        if let Behavior::PanicBeforeFuture = behavior {
            panic!("refused to build future");
        }
        Box::pin(async move {
            match behavior {
                Behavior::Succeed(cost) => {
                    let result = ToolResult::ok(format!("{name} done")).with_data(params);
                    Ok(match cost {
                        Some(cost) => result.with_cost(cost),
                        None => result,
                    })
                }
                Behavior::ReportFailure => Ok(ToolResult::failure("quota exceeded upstream")
                    .with_cost(ToolCost::new(0.002, "api", 1.0, "request"))),
                Behavior::Error(reason) => Err(ToolError::execution_failed(name, reason)),
                Behavior::Panic(message) => panic!("{message}"),
                Behavior::PanicBeforeFuture => unreachable!(),
            }
        })
    }
}

fn cent() -> ToolCost {
    ToolCost::new(0.01, "mailer", 1.0, "email")
}

fn social() -> RegisterOptions {
    RegisterOptions::new().with_category(ToolCategory::Social)
}

#[tokio::test]
async fn send_x_scenario() {
    let gate = RecordingGate::allowing();
    let tool = ScriptedTool::new("send_x", Behavior::Succeed(Some(cent())));
    let mut registry = ToolRegistry::with_gate(gate.clone());
    registry.register(tool.clone(), social());

    let ctx = ExecutionContext::new()
        .with_agent("outreach")
        .with_product("prod-1")
        .with_user("u-1");
    let params = json!({"to": "someone@example.com"});

    let result = registry.execute("send_x", params.clone(), ctx.clone()).await;
    assert!(result.success, "{}", result.message);
    assert_eq!(gate.check_count(), 1);
    {
        let logs = gate.logs.lock().unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].tool, "send_x");
        assert_eq!(logs[0].cost.usd, 0.01);
        assert_eq!(logs[0].agent.as_deref(), Some("outreach"));
        assert_eq!(logs[0].product.as_deref(), Some("prod-1"));
        assert_eq!(logs[0].user.as_deref(), Some("u-1"));
        assert_eq!(logs[0].meta, Some(json!({"params": params})));
    }

    assert!(registry.disable("send_x"));
    let result = registry.execute("send_x", params, ctx).await;
    assert!(!result.success);
    assert!(result.message.contains("disabled"));
    assert_eq!(gate.check_count(), 1);
    assert_eq!(gate.log_count(), 1);
    assert_eq!(tool.calls(), 1);
}

#[tokio::test]
async fn gate_query_carries_attribution() {
    let gate = RecordingGate::allowing();
    let mut registry = ToolRegistry::with_gate(gate.clone());
    registry.register(
        ScriptedTool::new("lookup", Behavior::Succeed(None)),
        RegisterOptions::default(),
    );

    registry
        .execute("lookup", json!({}), ExecutionContext::new().with_user("u-7"))
        .await;

    let checks = gate.checks.lock().unwrap();
    assert_eq!(checks.len(), 1);
    assert_eq!(checks[0].tool, "lookup");
    assert_eq!(checks[0].user.as_deref(), Some("u-7"));
    assert!(checks[0].agent.is_none());
}

#[tokio::test]
async fn unknown_tool_touches_nothing() {
    let gate = RecordingGate::allowing();
    let tool = ScriptedTool::new("known", Behavior::Succeed(Some(cent())));
    let mut registry = ToolRegistry::with_gate(gate.clone());
    registry.register(tool.clone(), RegisterOptions::default());

    let result = registry
        .execute("unknown", json!({}), ExecutionContext::default())
        .await;

    assert!(!result.success);
    assert!(result.message.contains("unknown"));
    assert_eq!(gate.check_count(), 0);
    assert_eq!(gate.log_count(), 0);
    assert_eq!(tool.calls(), 0);
}

#[tokio::test]
async fn disabled_tool_touches_nothing() {
    let gate = RecordingGate::allowing();
    let tool = ScriptedTool::new("post", Behavior::Succeed(Some(cent())));
    let mut registry = ToolRegistry::with_gate(gate.clone());
    registry.register(tool.clone(), social().disabled());

    let result = registry.execute("post", json!({}), ExecutionContext::default()).await;

    assert!(!result.success);
    assert!(result.message.contains("disabled"));
    assert_eq!(gate.check_count(), 0);
    assert_eq!(tool.calls(), 0);
}

#[tokio::test]
async fn blocked_call_never_invokes_tool() {
    let gate = RecordingGate::blocking("daily cap of $1.00 reached");
    let tool = ScriptedTool::new("send_email", Behavior::Succeed(Some(cent())));
    let mut registry = ToolRegistry::with_gate(gate.clone());
    registry.register(tool.clone(), RegisterOptions::default());

    let result = registry
        .execute("send_email", json!({}), ExecutionContext::default())
        .await;

    assert!(!result.success);
    assert!(result.message.contains("daily cap of $1.00 reached"));
    assert_eq!(gate.check_count(), 1);
    assert_eq!(gate.log_count(), 0);
    assert_eq!(tool.calls(), 0);
    assert_eq!(registry.metrics().dispatches_blocked, 1);
}

#[tokio::test]
async fn failing_budget_check_blocks() {
    let gate = Arc::new(RecordingGate {
        fail_checks: true,
        ..RecordingGate::default()
    });
    let tool = ScriptedTool::new("send_email", Behavior::Succeed(None));
    let mut registry = ToolRegistry::with_gate(gate.clone());
    registry.register(tool.clone(), RegisterOptions::default());

    let result = registry
        .execute("send_email", json!({}), ExecutionContext::default())
        .await;

    assert!(!result.success);
    assert!(result.message.contains("ledger offline"));
    assert_eq!(tool.calls(), 0);
}

#[tokio::test]
async fn tool_error_is_folded_into_result() {
    let gate = RecordingGate::allowing();
    let mut registry = ToolRegistry::with_gate(gate.clone());
    registry.register(
        ScriptedTool::new("fetch", Behavior::Error("connection reset".into())),
        RegisterOptions::default(),
    );

    let result = registry.execute("fetch", json!({}), ExecutionContext::default()).await;

    assert!(!result.success);
    assert!(result.message.contains("connection reset"));
    assert_eq!(gate.log_count(), 0);
}

#[tokio::test]
async fn tool_panic_is_folded_into_result() {
    let mut registry = ToolRegistry::new();
    registry.register(
        ScriptedTool::new("flaky", Behavior::Panic("index out of range")),
        RegisterOptions::default(),
    );
    registry.register(
        ScriptedTool::new("broken", Behavior::PanicBeforeFuture),
        RegisterOptions::default(),
    );

    let result = registry.execute("flaky", json!({}), ExecutionContext::default()).await;
    assert!(!result.success);
    assert!(result.message.contains("index out of range"));

    let result = registry.execute("broken", json!({}), ExecutionContext::default()).await;
    assert!(!result.success);
    assert!(result.message.contains("refused to build future"));

    // The registry is still usable afterwards.
    assert_eq!(registry.count(), 2);
    assert_eq!(registry.metrics().dispatches_failed, 2);
}

#[tokio::test]
async fn zero_or_missing_cost_is_not_logged() {
    let gate = RecordingGate::allowing();
    let mut registry = ToolRegistry::with_gate(gate.clone());
    registry.register(
        ScriptedTool::new("free", Behavior::Succeed(Some(ToolCost::new(0.0, "p", 1.0, "call")))),
        RegisterOptions::default(),
    );
    registry.register(
        ScriptedTool::new("untracked", Behavior::Succeed(None)),
        RegisterOptions::default(),
    );

    assert!(registry.execute("free", json!({}), ExecutionContext::default()).await.success);
    assert!(registry.execute("untracked", json!({}), ExecutionContext::default()).await.success);

    assert_eq!(gate.check_count(), 2);
    assert_eq!(gate.log_count(), 0);
}

#[tokio::test]
async fn reported_failure_with_cost_is_still_billed() {
    let gate = RecordingGate::allowing();
    let mut registry = ToolRegistry::with_gate(gate.clone());
    registry.register(
        ScriptedTool::new("search", Behavior::ReportFailure),
        RegisterOptions::default(),
    );

    let result = registry.execute("search", json!({}), ExecutionContext::default()).await;

    assert!(!result.success);
    assert_eq!(result.message, "quota exceeded upstream");
    assert_eq!(gate.log_count(), 1);
}

#[tokio::test]
async fn log_failure_does_not_change_result() {
    for gate in [
        Arc::new(RecordingGate {
            fail_logs: true,
            ..RecordingGate::default()
        }),
        Arc::new(RecordingGate {
            panic_on_log: true,
            ..RecordingGate::default()
        }),
    ] {
        let mut registry = ToolRegistry::with_gate(gate.clone());
        registry.register(
            ScriptedTool::new("send_x", Behavior::Succeed(Some(cent()))),
            RegisterOptions::default(),
        );

        let result = registry
            .execute("send_x", json!({"n": 1}), ExecutionContext::default())
            .await;

        assert!(result.success);
        assert_eq!(result.message, "send_x done");
        assert_eq!(result.data, Some(json!({"n": 1})));
        assert_eq!(result.cost.as_ref().map(|c| c.usd), Some(0.01));
        assert_eq!(gate.log_count(), 1);

        let metrics = registry.metrics();
        assert_eq!(metrics.costs_logged, 0);
        assert_eq!(metrics.cost_log_failures, 1);
        assert_eq!(metrics.dispatches_succeeded, 1);
    }
}

#[tokio::test]
async fn result_is_returned_unchanged() {
    let mut registry = ToolRegistry::new();
    registry.register(
        ScriptedTool::new("echo", Behavior::Succeed(Some(cent()))),
        RegisterOptions::default(),
    );

    let result = registry
        .execute("echo", json!({"k": "v"}), ExecutionContext::default())
        .await;

    let expected = ToolResult::ok("echo done")
        .with_data(json!({"k": "v"}))
        .with_cost(cent());
    assert_eq!(result, expected);
}

#[tokio::test]
async fn disable_does_not_affect_call_in_flight() {
    #[derive(Debug)]
    struct Waiting(Arc<tokio::sync::Notify>);

    impl Tool for Waiting {
        fn name(&self) -> &str {
            "slow"
        }

        fn description(&self) -> &str {
            "waits to be released"
        }

        fn parameter_schema(&self) -> Value {
            json!({"type": "object"})
        }

        fn execute(&self, _params: Value) -> ToolExecutionFuture {
            let release = Arc::clone(&self.0);
            Box::pin(async move {
                release.notified().await;
                Ok(ToolResult::ok("released"))
            })
        }
    }

    let release = Arc::new(tokio::sync::Notify::new());
    let gate = RecordingGate::allowing();
    let mut registry = ToolRegistry::with_gate(gate.clone());
    registry.register(Arc::new(Waiting(Arc::clone(&release))), RegisterOptions::default());

    let in_flight = tokio::spawn(registry.execute("slow", json!({}), ExecutionContext::default()));
    while gate.check_count() == 0 {
        tokio::task::yield_now().await;
    }

    assert!(registry.disable("slow"));
    release.notify_one();

    let result = in_flight.await.unwrap();
    assert!(result.success);
    assert_eq!(result.message, "released");

    let after = registry.execute("slow", json!({}), ExecutionContext::default()).await;
    assert!(!after.success);
}

#[tokio::test]
async fn has_follows_register_and_unregister() {
    let mut registry = ToolRegistry::new();
    for name in ["a", "b", "c"] {
        registry.register(
            ScriptedTool::new(name, Behavior::Succeed(None)),
            RegisterOptions::default(),
        );
        assert!(registry.has(name));
    }
    for name in ["b", "a", "c"] {
        assert!(registry.unregister(name));
        assert!(!registry.has(name));
    }
}

#[test]
fn reregistration_resets_state() {
    let mut registry = ToolRegistry::new();
    registry.register(ScriptedTool::new("send_x", Behavior::Succeed(None)), social());
    registry.disable("send_x");
    assert!(!registry.get("send_x").unwrap().is_enabled());

    registry.register(
        ScriptedTool::new("send_x", Behavior::Succeed(None)),
        RegisterOptions::new().with_category(ToolCategory::Marketing),
    );

    let entry = registry.get("send_x").unwrap();
    assert!(entry.is_enabled());
    assert_eq!(entry.category(), Some(ToolCategory::Marketing));
}

#[test]
fn definitions_hide_what_list_shows() {
    let mut registry = ToolRegistry::new();
    registry.register(ScriptedTool::new("on", Behavior::Succeed(None)), social());
    registry.register(ScriptedTool::new("off", Behavior::Succeed(None)), social().disabled());

    let disabled = registry.list(&ToolFilter::new().with_enabled(false));
    assert_eq!(disabled.len(), 1);
    assert_eq!(disabled[0].name(), "off");

    for category in [None, Some(ToolCategory::Social)] {
        let names: Vec<_> = registry
            .definitions(category)
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["on"]);
    }
}

#[test]
fn count_after_register_unregister_clear() {
    let mut registry = ToolRegistry::new();
    registry.register(ScriptedTool::new("a", Behavior::Succeed(None)), RegisterOptions::default());
    registry.register(ScriptedTool::new("b", Behavior::Succeed(None)), RegisterOptions::default());
    registry.unregister("a");
    assert_eq!(registry.count(), 1);

    registry.clear();
    assert_eq!(registry.count(), 0);
}

#[tokio::test]
async fn ledger_blocks_once_tool_limit_is_spent() {
    let ledger = Arc::new(CostLedger::new(
        BudgetLimits::new().with_tool_limit("send_x", 0.015),
    ));
    let tool = ScriptedTool::new("send_x", Behavior::Succeed(Some(cent())));
    let mut registry = ToolRegistry::with_gate(ledger.clone());
    registry.register(tool.clone(), social());

    let ctx = ExecutionContext::new().with_agent("outreach");
    assert!(registry.execute("send_x", json!({}), ctx.clone()).await.success);
    assert!(registry.execute("send_x", json!({}), ctx.clone()).await.success);

    let blocked = registry.execute("send_x", json!({}), ctx).await;
    assert!(!blocked.success);
    assert!(blocked.message.contains("budget"));
    assert_eq!(tool.calls(), 2);

    let summary = ledger.summary().await;
    assert_eq!(summary.calls, 2);
    assert!((summary.total_usd - 0.02).abs() < 1e-9);
    assert_eq!(summary.by_agent.get("outreach").copied(), Some(summary.total_usd));
}

#[tokio::test]
async fn builtin_campaign_flow_through_registry() {
    let store: Arc<dyn DocumentStore> = Arc::new(InMemoryDocumentStore::new());
    let gate = RecordingGate::allowing();
    let mut registry = ToolRegistry::with_gate(gate.clone());
    BuiltinTools::all(store).register_into(&mut registry);

    let created = registry
        .execute(
            "create_campaign",
            json!({"name": "Spring launch", "product_id": "p1"}),
            ExecutionContext::new().with_agent("planner"),
        )
        .await;
    assert!(created.success, "{}", created.message);
    let id = created.data.unwrap()["campaign"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let fetched = registry
        .execute("get_campaign", json!({"id": id}), ExecutionContext::default())
        .await;
    assert!(fetched.success);
    assert_eq!(fetched.data.unwrap()["campaign"]["name"], "Spring launch");

    let invalid = registry
        .execute("create_campaign", json!({"name": 42}), ExecutionContext::default())
        .await;
    assert!(!invalid.success);
    assert!(invalid.message.contains("create_campaign"));

    assert_eq!(gate.check_count(), 3);
    assert_eq!(gate.log_count(), 0);
}
