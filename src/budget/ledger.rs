//! In-memory cost ledger with daily limits.

use crate::budget::error::BudgetError;
use crate::budget::gate::{BudgetDecision, BudgetGate, BudgetQuery, CostEntry};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, VecDeque};
use tokio::sync::Mutex;

/// Daily spending limits in USD.
///
/// Every configured limit that applies to a call must have headroom left for
/// the call to proceed. Days are UTC calendar days.
///
/// ```toml
/// [budget]
/// global_daily_usd = 5.0
///
/// [budget.tools]
/// send_email = 1.0
///
/// [budget.agents]
/// outreach = 2.0
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetLimits {
    /// Cap across all tools and attributions
    pub global_daily_usd: Option<f64>,
    /// Per tool name
    pub tools: HashMap<String, f64>,
    /// Per agent identifier
    pub agents: HashMap<String, f64>,
    /// Per product identifier
    pub products: HashMap<String, f64>,
    /// Per user identifier
    pub users: HashMap<String, f64>,
}

impl BudgetLimits {
    /// No limits.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the global daily cap.
    #[must_use]
    pub fn with_global_daily(mut self, usd: f64) -> Self {
        self.global_daily_usd = Some(usd);
        self
    }

    /// Caps one tool.
    #[must_use]
    pub fn with_tool_limit(mut self, tool: impl Into<String>, usd: f64) -> Self {
        self.tools.insert(tool.into(), usd);
        self
    }

    /// Caps one agent.
    #[must_use]
    pub fn with_agent_limit(mut self, agent: impl Into<String>, usd: f64) -> Self {
        self.agents.insert(agent.into(), usd);
        self
    }

    /// Caps one product.
    #[must_use]
    pub fn with_product_limit(mut self, product: impl Into<String>, usd: f64) -> Self {
        self.products.insert(product.into(), usd);
        self
    }

    /// Caps one user.
    #[must_use]
    pub fn with_user_limit(mut self, user: impl Into<String>, usd: f64) -> Self {
        self.users.insert(user.into(), usd);
        self
    }

    /// True when nothing is capped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.global_daily_usd.is_none()
            && self.tools.is_empty()
            && self.agents.is_empty()
            && self.products.is_empty()
            && self.users.is_empty()
    }
}

/// A logged cost with its timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostRecord {
    /// What was logged
    pub entry: CostEntry,
    /// When it was logged
    pub at: DateTime<Utc>,
}

/// Spending for one UTC day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostSummary {
    /// The day summarized
    pub day: NaiveDate,
    /// Sum of all costs
    pub total_usd: f64,
    /// Number of billable calls
    pub calls: usize,
    /// Spend per tool
    pub by_tool: BTreeMap<String, f64>,
    /// Spend per agent (attributed calls only)
    pub by_agent: BTreeMap<String, f64>,
    /// Spend per product (attributed calls only)
    pub by_product: BTreeMap<String, f64>,
    /// Spend per user (attributed calls only)
    pub by_user: BTreeMap<String, f64>,
}

impl CostSummary {
    /// Nothing spent on `day`.
    #[must_use]
    pub fn empty(day: NaiveDate) -> Self {
        Self {
            day,
            total_usd: 0.0,
            calls: 0,
            by_tool: BTreeMap::new(),
            by_agent: BTreeMap::new(),
            by_product: BTreeMap::new(),
            by_user: BTreeMap::new(),
        }
    }

    fn add(&mut self, entry: &CostEntry) {
        let usd = entry.cost.usd;
        self.total_usd += usd;
        self.calls += 1;
        *self.by_tool.entry(entry.tool.clone()).or_default() += usd;
        if let Some(agent) = &entry.agent {
            *self.by_agent.entry(agent.clone()).or_default() += usd;
        }
        if let Some(product) = &entry.product {
            *self.by_product.entry(product.clone()).or_default() += usd;
        }
        if let Some(user) = &entry.user {
            *self.by_user.entry(user.clone()).or_default() += usd;
        }
    }
}

/// How many raw records a ledger keeps unless told otherwise.
pub const DEFAULT_RECORD_RETENTION: usize = 1024;

/// Running totals for the newest day seen plus the most recent raw records.
#[derive(Debug)]
struct LedgerState {
    today: CostSummary,
    recent: VecDeque<CostRecord>,
}

/// An in-memory [`BudgetGate`] enforcing [`BudgetLimits`].
///
/// Only the newest UTC day is aggregated; entries for earlier days are kept
/// as raw records but never count against a limit. Raw records are capped
/// at the retention size, oldest dropped first, so memory and the cost of a
/// budget check stay constant however long the process runs.
#[derive(Debug)]
pub struct CostLedger {
    limits: BudgetLimits,
    retention: usize,
    state: Mutex<LedgerState>,
}

impl Default for CostLedger {
    fn default() -> Self {
        Self::new(BudgetLimits::default())
    }
}

impl CostLedger {
    /// Creates a ledger enforcing `limits`.
    #[must_use]
    pub fn new(limits: BudgetLimits) -> Self {
        Self {
            limits,
            retention: DEFAULT_RECORD_RETENTION,
            state: Mutex::new(LedgerState {
                today: CostSummary::empty(Utc::now().date_naive()),
                recent: VecDeque::new(),
            }),
        }
    }

    /// Keeps at most `records` raw records (minimum one).
    #[must_use]
    pub fn with_record_retention(mut self, records: usize) -> Self {
        self.retention = records.max(1);
        self
    }

    /// The configured limits.
    #[must_use]
    pub fn limits(&self) -> &BudgetLimits {
        &self.limits
    }

    /// Records `entry` as having happened at `at`.
    ///
    /// An entry dated after the current aggregate's day starts a new day.
    ///
    /// # Errors
    ///
    /// Rejects negative or non-finite amounts.
    pub async fn log_at(&self, entry: CostEntry, at: DateTime<Utc>) -> Result<(), BudgetError> {
        let usd = entry.cost.usd;
        if !usd.is_finite() || usd < 0.0 {
            return Err(BudgetError::invalid_cost(&entry.tool, usd));
        }

        let day = at.date_naive();
        let mut state = self.state.lock().await;
        if day > state.today.day {
            tracing::debug!(previous = %state.today.day, %day, "Cost ledger rolled over");
            state.today = CostSummary::empty(day);
        }
        if day == state.today.day {
            state.today.add(&entry);
        }

        if state.recent.len() == self.retention {
            state.recent.pop_front();
        }
        state.recent.push_back(CostRecord { entry, at });
        Ok(())
    }

    /// The most recent records, oldest first.
    pub async fn records(&self) -> Vec<CostRecord> {
        self.state.lock().await.recent.iter().cloned().collect()
    }

    /// Spending for the current UTC day.
    pub async fn summary(&self) -> CostSummary {
        let day = Utc::now().date_naive();
        let state = self.state.lock().await;
        if state.today.day == day {
            state.today.clone()
        } else {
            CostSummary::empty(day)
        }
    }

    /// Decides `query` against the spending of `day`.
    async fn decide(&self, query: &BudgetQuery, day: NaiveDate) -> BudgetDecision {
        if self.limits.is_empty() {
            return BudgetDecision::allow();
        }

        let state = self.state.lock().await;
        let empty;
        let spent = if state.today.day == day {
            &state.today
        } else {
            empty = CostSummary::empty(day);
            &empty
        };

        if let Some(limit) = self.limits.global_daily_usd {
            if spent.total_usd >= limit {
                return exhausted("global", None, spent.total_usd, limit);
            }
        }

        let dimensions = [
            ("tool", Some(&query.tool), &self.limits.tools, &spent.by_tool),
            ("agent", query.agent.as_ref(), &self.limits.agents, &spent.by_agent),
            ("product", query.product.as_ref(), &self.limits.products, &spent.by_product),
            ("user", query.user.as_ref(), &self.limits.users, &spent.by_user),
        ];

        for (label, key, limits, by_key) in dimensions {
            let Some(key) = key else { continue };
            let Some(&limit) = limits.get(key) else {
                continue;
            };
            let used = by_key.get(key).copied().unwrap_or(0.0);
            if used >= limit {
                return exhausted(label, Some(key), used, limit);
            }
        }

        BudgetDecision::allow()
    }
}

fn exhausted(label: &str, key: Option<&String>, spent: f64, limit: f64) -> BudgetDecision {
    let scope = match key {
        Some(key) => format!("{label} '{key}'"),
        None => label.to_string(),
    };
    BudgetDecision::block(format!(
        "daily budget for {scope} exhausted: spent ${spent:.4} of ${limit:.2}"
    ))
}

#[async_trait]
impl BudgetGate for CostLedger {
    async fn should_block(&self, query: &BudgetQuery) -> Result<BudgetDecision, BudgetError> {
        Ok(self.decide(query, Utc::now().date_naive()).await)
    }

    async fn log(&self, entry: CostEntry) -> Result<(), BudgetError> {
        self.log_at(entry, Utc::now()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{ExecutionContext, ToolCost};
    use chrono::Duration;

    fn entry(tool: &str, usd: f64, ctx: &ExecutionContext) -> CostEntry {
        CostEntry::new(tool, ToolCost::new(usd, "test", 1.0, "call"), ctx)
    }

    fn query(tool: &str, ctx: &ExecutionContext) -> BudgetQuery {
        BudgetQuery::new(tool, ctx)
    }

    #[tokio::test]
    async fn unlimited_ledger_never_blocks() {
        let ledger = CostLedger::default();
        let ctx = ExecutionContext::default();
        ledger.log(entry("send_email", 1000.0, &ctx)).await.unwrap();
        let decision = ledger.should_block(&query("send_email", &ctx)).await.unwrap();
        assert!(!decision.blocked);
    }

    #[tokio::test]
    async fn tool_limit_blocks_once_reached() {
        let ledger = CostLedger::new(BudgetLimits::new().with_tool_limit("send_email", 0.02));
        let ctx = ExecutionContext::default();

        ledger.log(entry("send_email", 0.01, &ctx)).await.unwrap();
        assert!(!ledger.should_block(&query("send_email", &ctx)).await.unwrap().blocked);

        ledger.log(entry("send_email", 0.01, &ctx)).await.unwrap();
        let decision = ledger.should_block(&query("send_email", &ctx)).await.unwrap();
        assert!(decision.blocked);
        let reason = decision.reason.unwrap();
        assert!(reason.contains("tool 'send_email'"));
        assert!(reason.contains("0.02"));

        // Other tools are unaffected.
        assert!(!ledger.should_block(&query("web_search", &ctx)).await.unwrap().blocked);
    }

    #[tokio::test]
    async fn global_limit_spans_tools() {
        let ledger = CostLedger::new(BudgetLimits::new().with_global_daily(1.0));
        let ctx = ExecutionContext::default();
        ledger.log(entry("a", 0.6, &ctx)).await.unwrap();
        ledger.log(entry("b", 0.4, &ctx)).await.unwrap();

        let decision = ledger.should_block(&query("c", &ctx)).await.unwrap();
        assert!(decision.blocked);
        assert!(decision.reason.unwrap().contains("global"));
    }

    #[tokio::test]
    async fn agent_limit_only_applies_to_that_agent() {
        let ledger = CostLedger::new(BudgetLimits::new().with_agent_limit("outreach", 0.5));
        let outreach = ExecutionContext::new().with_agent("outreach");
        let research = ExecutionContext::new().with_agent("research");

        ledger.log(entry("web_search", 0.5, &outreach)).await.unwrap();

        assert!(ledger.should_block(&query("web_search", &outreach)).await.unwrap().blocked);
        assert!(!ledger.should_block(&query("web_search", &research)).await.unwrap().blocked);
        assert!(!ledger
            .should_block(&query("web_search", &ExecutionContext::default()))
            .await
            .unwrap()
            .blocked);
    }

    #[tokio::test]
    async fn product_and_user_limits() {
        let ledger = CostLedger::new(
            BudgetLimits::new()
                .with_product_limit("p1", 0.1)
                .with_user_limit("u1", 0.2),
        );
        let ctx = ExecutionContext::new().with_product("p1").with_user("u1");
        ledger.log(entry("x", 0.1, &ctx)).await.unwrap();

        let decision = ledger.should_block(&query("x", &ctx)).await.unwrap();
        assert!(decision.reason.unwrap().contains("product 'p1'"));

        let other_product = ExecutionContext::new().with_product("p2").with_user("u1");
        assert!(!ledger.should_block(&query("x", &other_product)).await.unwrap().blocked);
    }

    #[tokio::test]
    async fn yesterday_does_not_count() {
        let ledger = CostLedger::new(BudgetLimits::new().with_tool_limit("send_email", 1.0));
        let ctx = ExecutionContext::default();
        ledger
            .log_at(entry("send_email", 5.0, &ctx), Utc::now() - Duration::days(1))
            .await
            .unwrap();

        assert!(!ledger.should_block(&query("send_email", &ctx)).await.unwrap().blocked);
        assert_eq!(ledger.records().await.len(), 1);
        assert_eq!(ledger.summary().await.calls, 0);
    }

    #[tokio::test]
    async fn retention_caps_records_and_old_days_never_count() {
        let ledger = CostLedger::new(BudgetLimits::new().with_global_daily(1.0))
            .with_record_retention(50);
        let ctx = ExecutionContext::default();
        let now = Utc::now();

        for days_ago in 1..=30 {
            for _ in 0..100 {
                ledger
                    .log_at(entry("send_email", 5.0, &ctx), now - Duration::days(days_ago))
                    .await
                    .unwrap();
            }
        }

        assert_eq!(ledger.records().await.len(), 50);
        assert_eq!(ledger.summary().await.calls, 0);
        assert!(!ledger.should_block(&query("send_email", &ctx)).await.unwrap().blocked);

        ledger.log_at(entry("send_email", 0.25, &ctx), now).await.unwrap();
        let records = ledger.records().await;
        assert_eq!(records.len(), 50);
        assert_eq!(records.last().map(|r| r.at), Some(now));
        assert_eq!(ledger.summary().await.calls, 1);
    }

    #[tokio::test]
    async fn newer_day_resets_totals() {
        let ledger = CostLedger::new(BudgetLimits::new().with_tool_limit("send_email", 1.0));
        let ctx = ExecutionContext::default();
        let today = Utc::now();

        ledger.log_at(entry("send_email", 2.0, &ctx), today).await.unwrap();
        assert!(ledger.decide(&query("send_email", &ctx), today.date_naive()).await.blocked);

        let tomorrow = today + Duration::days(1);
        ledger.log_at(entry("send_email", 0.5, &ctx), tomorrow).await.unwrap();
        assert!(!ledger.decide(&query("send_email", &ctx), tomorrow.date_naive()).await.blocked);

        // The aggregate now tracks tomorrow, so today reads as unspent.
        assert!(!ledger.decide(&query("send_email", &ctx), today.date_naive()).await.blocked);
        assert_eq!(ledger.records().await.len(), 2);
    }

    #[test]
    fn retention_has_a_floor_of_one() {
        assert_eq!(CostLedger::default().with_record_retention(0).retention, 1);
        assert_eq!(CostLedger::default().retention, DEFAULT_RECORD_RETENTION);
    }

    #[tokio::test]
    async fn rejects_invalid_amounts() {
        let ledger = CostLedger::default();
        let ctx = ExecutionContext::default();
        assert!(ledger.log(entry("x", -0.5, &ctx)).await.is_err());
        assert!(ledger.log(entry("x", f64::INFINITY, &ctx)).await.is_err());
        assert!(ledger.records().await.is_empty());
    }

    #[tokio::test]
    async fn summary_groups_by_dimension() {
        let ledger = CostLedger::default();
        let ctx = ExecutionContext::new().with_agent("a").with_user("u");
        ledger.log(entry("send_email", 0.25, &ctx)).await.unwrap();
        ledger.log(entry("send_email", 0.25, &ctx)).await.unwrap();
        ledger
            .log(entry("web_search", 0.5, &ExecutionContext::default()))
            .await
            .unwrap();

        let summary = ledger.summary().await;
        assert_eq!(summary.calls, 3);
        assert!((summary.total_usd - 1.0).abs() < 1e-9);
        assert!((summary.by_tool["send_email"] - 0.5).abs() < 1e-9);
        assert!((summary.by_agent["a"] - 0.5).abs() < 1e-9);
        assert!(summary.by_product.is_empty());
    }

    #[test]
    fn limits_deserialize_from_toml() {
        let limits: BudgetLimits = toml::from_str(
            r#"
global_daily_usd = 5.0

[tools]
send_email = 1.0

[users]
"u-1" = 0.5
"#,
        )
        .unwrap();
        assert_eq!(limits.global_daily_usd, Some(5.0));
        assert_eq!(limits.tools["send_email"], 1.0);
        assert_eq!(limits.users["u-1"], 0.5);
        assert!(limits.agents.is_empty());
    }
}
