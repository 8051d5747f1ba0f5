//! Built-in tools.
//!
//! Pre-built tools ready to register with a [`ToolRegistry`], each paired
//! with its default category.
//!
//! ## Available Tools
//!
//! ### Marketing
//! - **create_campaign**: Create a campaign in draft state
//! - **get_campaign**: Fetch a campaign by id
//! - **list_campaigns**: List campaigns by product and status
//! - **update_campaign**: Change name, status or budget
//! - **delete_campaign**: Remove a campaign
//!
//! ### Utility
//! - **current_time**: Current UTC time
//!
//! ## Usage
//!
//! ```rust,ignore
//! use toolgate::prelude::*;
//!
//! let store: Arc<dyn DocumentStore> = Arc::new(InMemoryDocumentStore::new());
//! let mut registry = ToolRegistry::new();
//! BuiltinTools::select(&["create_campaign", "current_time"], store)?
//!     .register_into(&mut registry);
//! ```

mod campaigns;
mod current_time;

pub use campaigns::{
    Campaign, CampaignStatus, CreateCampaignTool, DeleteCampaignTool, GetCampaignTool,
    ListCampaignsTool, UpdateCampaignTool, CAMPAIGN_COLLECTION,
};
pub use current_time::CurrentTimeTool;

use crate::store::DocumentStore;
use crate::tools::{RegisterOptions, Tool, ToolCategory, ToolError, ToolRegistry};
use std::sync::Arc;

/// A set of built-in tools with their default categories.
#[derive(Debug, Default, Clone)]
pub struct BuiltinTools {
    tools: Vec<(Arc<dyn Tool>, ToolCategory)>,
}

impl BuiltinTools {
    /// Every built-in tool, in [`available`](Self::available) order.
    #[must_use]
    pub fn all(store: Arc<dyn DocumentStore>) -> Self {
        let marketing = |tool: Arc<dyn Tool>| (tool, ToolCategory::Marketing);
        Self {
            tools: vec![
                marketing(Arc::new(CreateCampaignTool::new(Arc::clone(&store)))),
                marketing(Arc::new(GetCampaignTool::new(Arc::clone(&store)))),
                marketing(Arc::new(ListCampaignsTool::new(Arc::clone(&store)))),
                marketing(Arc::new(UpdateCampaignTool::new(Arc::clone(&store)))),
                marketing(Arc::new(DeleteCampaignTool::new(store))),
                (Arc::new(CurrentTimeTool::new()), ToolCategory::Utility),
            ],
        }
    }

    /// Only the named tools, in the order given.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError`] (not found) for a name that is not a built-in.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let tools = BuiltinTools::select(&["get_campaign", "list_campaigns"], store)?;
    /// ```
    pub fn select(names: &[&str], store: Arc<dyn DocumentStore>) -> Result<Self, ToolError> {
        let all = Self::all(store);
        let mut selected = Self::default();

        for name in names {
            let entry = all
                .tools
                .iter()
                .find(|(tool, _)| tool.name() == *name)
                .ok_or_else(|| ToolError::not_found(*name))?;
            if selected.get(name).is_none() {
                selected.tools.push(entry.clone());
            }
        }

        Ok(selected)
    }

    /// Names of every built-in tool.
    #[must_use]
    pub fn available() -> Vec<&'static str> {
        vec![
            CreateCampaignTool::NAME,
            GetCampaignTool::NAME,
            ListCampaignsTool::NAME,
            UpdateCampaignTool::NAME,
            DeleteCampaignTool::NAME,
            CurrentTimeTool::NAME,
        ]
    }

    /// Looks up a tool in this set.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools
            .iter()
            .find(|(tool, _)| tool.name() == name)
            .map(|(tool, _)| tool)
    }

    /// Tools with their default categories.
    pub fn iter(&self) -> impl Iterator<Item = &(Arc<dyn Tool>, ToolCategory)> {
        self.tools.iter()
    }

    /// Number of tools in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// True when the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Registers every tool, enabled, under its default category.
    pub fn register_into(&self, registry: &mut ToolRegistry) {
        for (tool, category) in &self.tools {
            registry.register(
                Arc::clone(tool),
                RegisterOptions::new().with_category(*category),
            );
        }
    }
}
