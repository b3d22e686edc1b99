//! Error types for the GitLab MCP tools
//!
//! This module defines error types that provide more structured
//! information about failures that might occur during tool execution.

use std::fmt;

/// Error types that can occur in the GitLab tools
#[derive(Debug)]
pub enum ToolError {
    /// No project id given and none configured
    MissingProject,

    /// A tool argument has an unsupported value
    InvalidArgument(String),

    /// Error building the GitLab client from configuration
    ClientError(String),

    /// Error in a search operation
    SearchError(String),

    /// Error in a passthrough GitLab API call
    ApiError(String),

    /// Error serializing response
    SerializationError(String),
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolError::MissingProject => write!(
                f,
                "No project specified. Pass 'project_id' or configure a default project (GITLAB_INSIGHT_PROJECT_ID)."
            ),
            ToolError::InvalidArgument(details) => write!(f, "Invalid argument: {}", details),
            ToolError::ClientError(details) => write!(f, "GitLab client error: {}", details),
            ToolError::SearchError(details) => write!(f, "Search error: {}", details),
            ToolError::ApiError(details) => write!(f, "GitLab API error: {}", details),
            ToolError::SerializationError(details) => write!(f, "Serialization error: {}", details),
        }
    }
}

impl std::error::Error for ToolError {}
