//! Configuration management for toolgate.
//!
//! # Configuration File Format
//!
//! Configuration is stored in TOML format. The search order is:
//! 1. `./toolgate.toml` (project-local)
//! 2. `~/.config/toolgate/config.toml` (XDG config)
//!
//! # Example Configuration
//!
//! ```toml
//! [logging]
//! enabled = true
//! level = "info"
//!
//! # Daily limits in USD, reset at midnight UTC
//! [budget]
//! global_daily_usd = 5.0
//!
//! [budget.tools]
//! send_email = 1.0
//!
//! [budget.agents]
//! outreach = 2.0
//!
//! [tools]
//! disabled = ["delete_campaign"]
//!
//! [tools.categories]
//! current_time = "scheduling"
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use toolgate::config;
//!
//! let config = config::load()?;
//! let registry = ToolRegistry::with_gate(config.budget_gate());
//! ```

mod file;
mod types;

pub use file::{from_path, from_str, load, search_paths, xdg_config_dir};
pub use types::{ToolgateConfig, ToolsConfig};
