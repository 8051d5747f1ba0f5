use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Deserialize;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use toolgate::config;
use toolgate::logging;
use toolgate::prelude::*;

#[derive(Parser)]
#[command(name = "toolgate", version, about = "Budget-gated tool registry")]
struct Cli {
    /// Config file (default: ./toolgate.toml, then ~/.config/toolgate/config.toml)
    #[arg(short, long, env = "TOOLGATE_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered tools
    List {
        /// Only tools in this category
        #[arg(short, long)]
        category: Option<ToolCategory>,

        /// Only enabled (true) or disabled (false) tools
        #[arg(long)]
        enabled: Option<bool>,
    },
    /// Print the definitions offered to a planner as JSON
    Definitions {
        /// Only tools in this category
        #[arg(short, long)]
        category: Option<ToolCategory>,
    },
    /// Dispatch one tool call and print the result as JSON
    Exec {
        /// Tool name
        name: String,

        /// Parameters as a JSON object
        #[arg(short, long, default_value = "{}")]
        params: String,

        #[command(flatten)]
        attribution: Attribution,
    },
    /// Dispatch JSON-lines calls from stdin, one result per line
    ///
    /// Each line is `{"tool": ..., "params": {...}, "agent"?, "product"?, "user"?}`.
    /// Calls share one registry, so budget spent by earlier lines counts
    /// against later ones.
    Batch,
    /// Show where configuration is looked up
    ConfigPaths,
}

#[derive(Args)]
struct Attribution {
    /// Calling agent
    #[arg(long)]
    agent: Option<String>,

    /// Product the call is for
    #[arg(long)]
    product: Option<String>,

    /// End user
    #[arg(long)]
    user: Option<String>,
}

impl From<Attribution> for ExecutionContext {
    fn from(a: Attribution) -> Self {
        Self {
            agent: a.agent,
            product: a.product,
            user: a.user,
        }
    }
}

#[derive(Deserialize)]
struct BatchCall {
    tool: String,
    #[serde(default)]
    params: Value,
    #[serde(flatten)]
    context: ExecutionContext,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => config::from_path(path)?,
        None => config::load()?,
    };
    logging::init(config.logging.as_ref())?;

    if let Commands::ConfigPaths = cli.command {
        for path in config::search_paths() {
            let marker = if path.exists() { "found" } else { "missing" };
            println!("{marker}\t{}", path.display());
        }
        return Ok(ExitCode::SUCCESS);
    }

    let registry = build_registry(&config);

    match cli.command {
        Commands::List { category, enabled } => {
            let filter = ToolFilter { category, enabled };
            for entry in registry.list(&filter) {
                let category = entry.category().map_or("-", ToolCategory::as_str);
                let state = if entry.is_enabled() { "enabled" } else { "disabled" };
                println!("{}\t{category}\t{state}\t{}", entry.name(), entry.description());
            }
        }
        Commands::Definitions { category } => {
            let definitions = registry.definitions(category);
            println!("{}", serde_json::to_string_pretty(&definitions)?);
        }
        Commands::Exec {
            name,
            params,
            attribution,
        } => {
            let params: Value = serde_json::from_str(&params)
                .with_context(|| format!("--params is not valid JSON: {params}"))?;
            let rt = tokio::runtime::Runtime::new()?;
            let result = rt.block_on(registry.execute(&name, params, attribution.into()));
            println!("{}", serde_json::to_string_pretty(&result)?);
            if !result.success {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Batch => {
            let rt = tokio::runtime::Runtime::new()?;
            let all_ok = rt.block_on(run_batch(
                &registry,
                std::io::stdin().lock(),
                std::io::stdout().lock(),
            ))?;
            if !all_ok {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::ConfigPaths => {}
    }

    Ok(ExitCode::SUCCESS)
}

fn build_registry(config: &ToolgateConfig) -> ToolRegistry {
    let mut registry = ToolRegistry::with_gate(config.budget_gate());
    let store: Arc<dyn DocumentStore> = Arc::new(InMemoryDocumentStore::new());

    for (tool, category) in BuiltinTools::all(store).iter() {
        let options = config.tools.options_for(tool.name(), Some(*category));
        registry.register(Arc::clone(tool), options);
    }

    for name in &config.tools.disabled {
        if !registry.has(name) {
            tracing::warn!(tool_name = %name, "Disabled tool in config is not registered");
        }
    }
    registry
}

/// Dispatches each JSON line of `input`, writing one result line to `output`.
/// Returns whether every call succeeded.
async fn run_batch<R: BufRead, W: Write>(
    registry: &ToolRegistry,
    input: R,
    mut output: W,
) -> Result<bool> {
    let mut all_ok = true;

    for (index, line) in input.lines().enumerate() {
        let line = line.context("failed to read batch input")?;
        if line.trim().is_empty() {
            continue;
        }

        let result = match serde_json::from_str::<BatchCall>(&line) {
            Ok(call) => registry.execute(&call.tool, call.params, call.context).await,
            Err(e) => ToolResult::failure(format!("line {}: invalid call: {e}", index + 1)),
        };
        all_ok &= result.success;
        writeln!(output, "{}", serde_json::to_string(&result)?)?;
    }

    let metrics = registry.metrics();
    tracing::info!(
        requested = metrics.dispatches_requested,
        succeeded = metrics.dispatches_succeeded,
        blocked = metrics.dispatches_blocked,
        costs_logged = metrics.costs_logged,
        "Batch finished"
    );
    Ok(all_ok)
}
