//! Core type system and domain definitions
//!
//! This module provides the central type definitions for the GitLab Insight system.
//! Identifiers are wrapped in newtypes so that project ids, refs and numeric
//! resource ids cannot be mixed up when building endpoints.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

pub mod project;
pub mod repository;
pub mod search;

pub use project::*;
pub use repository::*;
pub use search::*;

/// HTTP verbs accepted by the project host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

/// A single request against the project host.
///
/// Constructed per request and dropped once the call completes. The path is
/// relative to the host base URL and already carries its query string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteCall {
    pub method: HttpMethod,
    pub path: String,
    pub body: Option<serde_json::Value>,
}

impl RemoteCall {
    pub fn new<P: Into<String>>(
        method: HttpMethod,
        path: P,
        body: Option<serde_json::Value>,
    ) -> Self {
        Self {
            method,
            path: path.into(),
            body,
        }
    }

    pub fn get<P: Into<String>>(path: P) -> Self {
        Self::new(HttpMethod::Get, path, None)
    }

    pub fn post<P: Into<String>>(path: P, body: Option<serde_json::Value>) -> Self {
        Self::new(HttpMethod::Post, path, body)
    }

    pub fn put<P: Into<String>>(path: P, body: Option<serde_json::Value>) -> Self {
        Self::new(HttpMethod::Put, path, body)
    }

    pub fn delete<P: Into<String>>(path: P) -> Self {
        Self::new(HttpMethod::Delete, path, None)
    }

    /// Human readable endpoint identifier used in logs and errors, e.g. `GET /api/v4/projects/1`
    pub fn endpoint(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

impl std::fmt::Display for RemoteCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// Output format options for CLI results
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown for human readable display
    #[default]
    Markdown,
    /// Pretty printed JSON for programmatic use
    Json,
}
