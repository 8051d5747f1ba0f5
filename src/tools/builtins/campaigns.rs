//! Campaign CRUD built-in tools.
//!
//! Campaigns live in the `campaigns` collection of a [`DocumentStore`]. None
//! of these tools report a billable cost.

use crate::store::{DocumentStore, StoreError};
use crate::tools::{Tool, ToolError, ToolExecutionFuture, ToolResult};
use crate::types::CampaignId;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Collection campaign documents are stored under.
pub const CAMPAIGN_COLLECTION: &str = "campaigns";

/// Lifecycle state of a campaign.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    /// Being prepared
    #[default]
    Draft,
    /// Running
    Active,
    /// Temporarily stopped
    Paused,
    /// Finished
    Completed,
}

impl CampaignStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [CampaignStatus; 4] = [
        CampaignStatus::Draft,
        CampaignStatus::Active,
        CampaignStatus::Paused,
        CampaignStatus::Completed,
    ];

    /// Lowercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CampaignStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!("unknown campaign status '{s}'; expected one of: draft, active, paused, completed")
            })
    }
}

/// A stored campaign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    /// Identifier (`camp_…`)
    pub id: CampaignId,
    /// Display name
    pub name: String,
    /// Product the campaign promotes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    /// Delivery channel (e.g. "email", "linkedin")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    /// Planned spend in US dollars
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_usd: Option<f64>,
    /// Lifecycle state
    #[serde(default)]
    pub status: CampaignStatus,
    /// When it was created
    pub created_at: DateTime<Utc>,
    /// When it was last changed
    pub updated_at: DateTime<Utc>,
}

fn parse_args<T: DeserializeOwned>(tool: &str, params: Value) -> Result<T, ToolError> {
    // Absent parameters arrive as null; treat them as an empty object.
    let params = if params.is_null() { json!({}) } else { params };
    serde_json::from_value(params)
        .map_err(|e| ToolError::invalid_arguments(tool, format!("invalid arguments: {e}")))
}

fn parse_id(tool: &str, id: &str) -> Result<CampaignId, ToolError> {
    CampaignId::parse(id).map_err(|e| ToolError::invalid_arguments(tool, e.to_string()))
}

fn parse_status(tool: &str, status: &str) -> Result<CampaignStatus, ToolError> {
    status
        .parse()
        .map_err(|e: String| ToolError::invalid_arguments(tool, e))
}

fn check_budget(tool: &str, budget: Option<f64>) -> Result<(), ToolError> {
    match budget {
        Some(usd) if !usd.is_finite() || usd < 0.0 => Err(ToolError::invalid_arguments(
            tool,
            format!("budget_usd must be a non-negative amount, got {usd}"),
        )),
        _ => Ok(()),
    }
}

fn check_name(tool: &str, name: &str) -> Result<String, ToolError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ToolError::invalid_arguments(tool, "name cannot be empty"));
    }
    Ok(name.to_string())
}

fn store_failed(tool: &str, error: &StoreError) -> ToolError {
    ToolError::execution_failed(tool, error.to_string())
}

async fn load(
    store: &dyn DocumentStore,
    tool: &str,
    id: &CampaignId,
) -> Result<Option<Campaign>, ToolError> {
    let Some(document) = store
        .get(CAMPAIGN_COLLECTION, &id.to_string())
        .await
        .map_err(|e| store_failed(tool, &e))?
    else {
        return Ok(None);
    };
    decode(&id.to_string(), document)
        .map(Some)
        .map_err(|e| store_failed(tool, &e))
}

fn decode(id: &str, document: Value) -> Result<Campaign, StoreError> {
    serde_json::from_value(document)
        .map_err(|e| StoreError::serialization(CAMPAIGN_COLLECTION, format!("{id}: {e}")))
}

async fn save(store: &dyn DocumentStore, tool: &str, campaign: &Campaign) -> Result<(), ToolError> {
    let document = serde_json::to_value(campaign).map_err(|e| {
        let error = StoreError::serialization(CAMPAIGN_COLLECTION, format!("{}: {e}", campaign.id));
        store_failed(tool, &error)
    })?;
    store
        .put(CAMPAIGN_COLLECTION, &campaign.id.to_string(), document)
        .await
        .map_err(|e| store_failed(tool, &e))
}

fn not_found(id: &CampaignId) -> ToolResult {
    ToolResult::failure(format!("campaign '{id}' not found"))
}

/// Creates a campaign in `draft` state.
#[derive(Debug, Clone)]
pub struct CreateCampaignTool {
    store: Arc<dyn DocumentStore>,
}

#[derive(Debug, Deserialize)]
struct CreateCampaignArgs {
    name: String,
    #[serde(default)]
    product_id: Option<String>,
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    budget_usd: Option<f64>,
}

impl CreateCampaignTool {
    /// Registry name.
    pub const NAME: &'static str = "create_campaign";

    /// Creates the tool over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

impl Tool for CreateCampaignTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Create a marketing campaign in draft state. Returns the stored campaign including its id."
    }

    fn parameter_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "name": {"type": "string", "description": "Campaign name"},
                "product_id": {"type": "string", "description": "Product the campaign promotes"},
                "channel": {"type": "string", "description": "Delivery channel, e.g. 'email' or 'linkedin'"},
                "budget_usd": {"type": "number", "minimum": 0, "description": "Planned spend in US dollars"}
            },
            "required": ["name"]
        })
    }

    fn execute(&self, params: Value) -> ToolExecutionFuture {
        let store = Arc::clone(&self.store);
        Box::pin(async move {
            let args: CreateCampaignArgs = parse_args(Self::NAME, params)?;
            let name = check_name(Self::NAME, &args.name)?;
            check_budget(Self::NAME, args.budget_usd)?;

            let now = Utc::now();
            let campaign = Campaign {
                id: CampaignId::new(),
                name,
                product_id: args.product_id,
                channel: args.channel,
                budget_usd: args.budget_usd,
                status: CampaignStatus::Draft,
                created_at: now,
                updated_at: now,
            };
            save(store.as_ref(), Self::NAME, &campaign).await?;

            tracing::debug!(campaign_id = %campaign.id, "Campaign created");
            Ok(ToolResult::ok(format!("Created campaign '{}' ({})", campaign.name, campaign.id))
                .with_data(json!({ "campaign": campaign })))
        })
    }
}

#[derive(Debug, Deserialize)]
struct CampaignIdArgs {
    id: String,
}

/// Fetches one campaign by id.
#[derive(Debug, Clone)]
pub struct GetCampaignTool {
    store: Arc<dyn DocumentStore>,
}

impl GetCampaignTool {
    /// Registry name.
    pub const NAME: &'static str = "get_campaign";

    /// Creates the tool over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

impl Tool for GetCampaignTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Fetch a marketing campaign by id."
    }

    fn parameter_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "id": {"type": "string", "description": "Campaign id (camp_...)"}
            },
            "required": ["id"]
        })
    }

    fn execute(&self, params: Value) -> ToolExecutionFuture {
        let store = Arc::clone(&self.store);
        Box::pin(async move {
            let args: CampaignIdArgs = parse_args(Self::NAME, params)?;
            let id = parse_id(Self::NAME, &args.id)?;

            Ok(match load(store.as_ref(), Self::NAME, &id).await? {
                Some(campaign) => ToolResult::ok(format!("Campaign '{}'", campaign.name))
                    .with_data(json!({ "campaign": campaign })),
                None => not_found(&id),
            })
        })
    }
}

/// Lists campaigns, optionally filtered by product and status.
#[derive(Debug, Clone)]
pub struct ListCampaignsTool {
    store: Arc<dyn DocumentStore>,
}

#[derive(Debug, Default, Deserialize)]
struct ListCampaignsArgs {
    #[serde(default)]
    product_id: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

impl ListCampaignsTool {
    /// Registry name.
    pub const NAME: &'static str = "list_campaigns";

    /// Creates the tool over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

impl Tool for ListCampaignsTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "List marketing campaigns, oldest first. Optionally filter by product_id and status."
    }

    fn parameter_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "product_id": {"type": "string", "description": "Only campaigns for this product"},
                "status": {
                    "type": "string",
                    "enum": ["draft", "active", "paused", "completed"],
                    "description": "Only campaigns in this state"
                }
            }
        })
    }

    fn execute(&self, params: Value) -> ToolExecutionFuture {
        let store = Arc::clone(&self.store);
        Box::pin(async move {
            let args: ListCampaignsArgs = parse_args(Self::NAME, params)?;
            let status = args
                .status
                .as_deref()
                .map(|s| parse_status(Self::NAME, s))
                .transpose()?;

            let documents = store
                .list(CAMPAIGN_COLLECTION)
                .await
                .map_err(|e| store_failed(Self::NAME, &e))?;

            let mut campaigns = Vec::with_capacity(documents.len());
            for (id, document) in documents {
                match decode(&id, document) {
                    Ok(campaign) => campaigns.push(campaign),
                    Err(e) => tracing::warn!(error = %e, "Skipping corrupt campaign"),
                }
            }
            campaigns.retain(|c| {
                args.product_id
                    .as_deref()
                    .map_or(true, |p| c.product_id.as_deref() == Some(p))
                    && status.map_or(true, |s| c.status == s)
            });

            let count = campaigns.len();
            Ok(ToolResult::ok(format!("Found {count} campaign(s)"))
                .with_data(json!({ "campaigns": campaigns, "count": count })))
        })
    }
}

/// Changes name, status or budget of a campaign.
#[derive(Debug, Clone)]
pub struct UpdateCampaignTool {
    store: Arc<dyn DocumentStore>,
}

#[derive(Debug, Deserialize)]
struct UpdateCampaignArgs {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    budget_usd: Option<f64>,
}

impl UpdateCampaignTool {
    /// Registry name.
    pub const NAME: &'static str = "update_campaign";

    /// Creates the tool over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

impl Tool for UpdateCampaignTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Update the name, status or budget of a marketing campaign."
    }

    fn parameter_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "id": {"type": "string", "description": "Campaign id (camp_...)"},
                "name": {"type": "string", "description": "New name"},
                "status": {
                    "type": "string",
                    "enum": ["draft", "active", "paused", "completed"],
                    "description": "New state"
                },
                "budget_usd": {"type": "number", "minimum": 0, "description": "New planned spend in US dollars"}
            },
            "required": ["id"]
        })
    }

    fn execute(&self, params: Value) -> ToolExecutionFuture {
        let store = Arc::clone(&self.store);
        Box::pin(async move {
            let args: UpdateCampaignArgs = parse_args(Self::NAME, params)?;
            let id = parse_id(Self::NAME, &args.id)?;
            if args.name.is_none() && args.status.is_none() && args.budget_usd.is_none() {
                return Err(ToolError::invalid_arguments(
                    Self::NAME,
                    "nothing to update; pass at least one of name, status, budget_usd",
                ));
            }
            let name = args
                .name
                .as_deref()
                .map(|n| check_name(Self::NAME, n))
                .transpose()?;
            let status = args
                .status
                .as_deref()
                .map(|s| parse_status(Self::NAME, s))
                .transpose()?;
            check_budget(Self::NAME, args.budget_usd)?;

            let Some(mut campaign) = load(store.as_ref(), Self::NAME, &id).await? else {
                return Ok(not_found(&id));
            };
            if let Some(name) = name {
                campaign.name = name;
            }
            if let Some(status) = status {
                campaign.status = status;
            }
            if let Some(budget) = args.budget_usd {
                campaign.budget_usd = Some(budget);
            }
            campaign.updated_at = Utc::now();
            save(store.as_ref(), Self::NAME, &campaign).await?;

            tracing::debug!(campaign_id = %campaign.id, status = %campaign.status, "Campaign updated");
            Ok(ToolResult::ok(format!("Updated campaign '{}'", campaign.name))
                .with_data(json!({ "campaign": campaign })))
        })
    }
}

/// Removes a campaign.
#[derive(Debug, Clone)]
pub struct DeleteCampaignTool {
    store: Arc<dyn DocumentStore>,
}

impl DeleteCampaignTool {
    /// Registry name.
    pub const NAME: &'static str = "delete_campaign";

    /// Creates the tool over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

impl Tool for DeleteCampaignTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Delete a marketing campaign by id."
    }

    fn parameter_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "id": {"type": "string", "description": "Campaign id (camp_...)"}
            },
            "required": ["id"]
        })
    }

    fn execute(&self, params: Value) -> ToolExecutionFuture {
        let store = Arc::clone(&self.store);
        Box::pin(async move {
            let args: CampaignIdArgs = parse_args(Self::NAME, params)?;
            let id = parse_id(Self::NAME, &args.id)?;

            let deleted = store
                .delete(CAMPAIGN_COLLECTION, &id.to_string())
                .await
                .map_err(|e| store_failed(Self::NAME, &e))?;
            if !deleted {
                return Ok(not_found(&id));
            }
            tracing::debug!(campaign_id = %id, "Campaign deleted");
            Ok(ToolResult::ok(format!("Deleted campaign {id}"))
                .with_data(json!({ "id": id, "deleted": true })))
        })
    }
}
