//! Tracing setup for the `toolgate` binary.
//!
//! Every dispatch runs inside a `dispatch{tool, dispatch_id}` span. Both
//! sinks print that span context in front of each event and write one
//! `close` line per dispatch carrying its busy/idle time, so a single call
//! can be followed from gate check to cost log by its dispatch id.
//!
//! With `[logging]` enabled, output goes to a daily rolling file under
//! `~/.local/share/toolgate/logs/` (or `log_dir`). Otherwise it goes to
//! stderr, keeping stdout free for JSON results.

use crate::error::ToolgateError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

/// `[logging]` section of the config file.
///
/// ```rust
/// use toolgate::logging::{LogLevel, LoggingConfig};
///
/// let config = LoggingConfig::default()
///     .with_app_name("campaign-bot")
///     .with_level(LogLevel::Debug);
/// assert!(config.enabled);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Write to a rolling file instead of stderr
    pub enabled: bool,
    /// File prefix; files rotate daily as `{app_name}.log.YYYY-MM-DD`
    pub app_name: String,
    /// Overrides the XDG data directory
    pub log_dir: Option<PathBuf>,
    /// Most verbose level written
    pub level: LogLevel,
}

impl LoggingConfig {
    #[must_use]
    pub fn with_app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = name.into();
        self
    }

    #[must_use]
    pub fn with_log_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            app_name: "toolgate".to_string(),
            log_dir: None,
            level: LogLevel::default(),
        }
    }
}

/// Verbosity. `debug` shows every dispatch stage; `warn` only blocked and
/// failed dispatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// The `EnvFilter` directive for this level.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

// Flushes the background file writer on drop, so it lives for the process.
static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Where log files for `config` are written.
///
/// # Errors
///
/// Fails when no `log_dir` is set and the platform has no data directory.
pub fn log_dir(config: &LoggingConfig) -> Result<PathBuf, ToolgateError> {
    if let Some(dir) = &config.log_dir {
        return Ok(dir.clone());
    }
    dirs::data_local_dir()
        .map(|dir| dir.join("toolgate").join("logs"))
        .ok_or_else(|| {
            ToolgateError::logging(
                "no data directory for log files; set [logging] log_dir or XDG_DATA_HOME",
            )
        })
}

/// Installs the process-wide subscriber.
///
/// An enabled `config` selects the rolling file sink; anything else selects
/// stderr filtered by `RUST_LOG`, falling back to the configured level.
///
/// # Errors
///
/// Fails when the log directory cannot be created or a global subscriber
/// is already installed.
pub fn init(config: Option<&LoggingConfig>) -> Result<(), ToolgateError> {
    match config.filter(|c| c.enabled) {
        Some(config) => init_file(config),
        None => {
            let level = config.map_or(LogLevel::default(), |c| c.level);
            let filter = EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(level.as_str()));
            tracing_subscriber::registry()
                .with(dispatch_layer(std::io::stderr, true))
                .with(filter)
                .try_init()
                .map_err(already_installed)
        }
    }
}

fn init_file(config: &LoggingConfig) -> Result<(), ToolgateError> {
    if FILE_GUARD.get().is_some() {
        return Ok(());
    }

    let dir = log_dir(config)?;
    std::fs::create_dir_all(&dir).map_err(|e| {
        ToolgateError::logging(format!(
            "cannot create log directory '{}': {e}; check permissions or set [logging] log_dir",
            dir.display()
        ))
    })?;

    let appender = tracing_appender::rolling::daily(&dir, format!("{}.log", config.app_name));
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(dispatch_layer(writer, false))
        .with(LevelFilter::from(config.level))
        .try_init()
        .map_err(already_installed)?;

    // Losing this race means another thread installed the same sink.
    let _ = FILE_GUARD.set(guard);
    tracing::info!(dir = %dir.display(), "File logging started");
    Ok(())
}

/// A `fmt` layer that prefixes events with their span context and logs
/// each span's close with timing.
fn dispatch_layer<S, W>(writer: W, ansi: bool) -> impl Layer<S> + Send + Sync
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(ansi)
        .with_target(false)
        .with_span_events(FmtSpan::CLOSE)
}

fn already_installed(error: impl std::fmt::Display) -> ToolgateError {
    ToolgateError::logging(format!("a global subscriber is already installed: {error}"))
}
