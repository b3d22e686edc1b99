pub mod commit;
pub mod search;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use commit::*;
pub use search::*;

#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct MarkdownContent(pub String);

/// Format a UTC datetime for display
pub fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Render any serializable value as a pretty JSON string
pub fn pretty_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(value)
}
