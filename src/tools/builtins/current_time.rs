//! Current time built-in tool.

use crate::tools::{Tool, ToolExecutionFuture, ToolResult};
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};

/// Reports the current UTC time.
///
/// Takes no parameters; anything passed is ignored.
#[derive(Debug, Default, Clone, Copy)]
pub struct CurrentTimeTool;

impl CurrentTimeTool {
    /// Registry name.
    pub const NAME: &'static str = "current_time";

    /// Creates the tool.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Tool for CurrentTimeTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Get the current date and time in UTC, as RFC 3339 text and unix seconds."
    }

    fn parameter_schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    fn execute(&self, _params: Value) -> ToolExecutionFuture {
        Box::pin(async move {
            let now = Utc::now();
            let rfc3339 = now.to_rfc3339_opts(SecondsFormat::Secs, true);
            Ok(ToolResult::ok(format!("It is {rfc3339}")).with_data(json!({
                "utc": rfc3339,
                "unix": now.timestamp(),
            })))
        })
    }
}
