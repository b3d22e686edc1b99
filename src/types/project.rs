//! Project and resource identifiers
//!
//! GitLab addresses a project either by its numeric id or by its full
//! `namespace/project` path. A path must travel as a single percent-encoded
//! URL segment, which `ProjectId::path_segment` takes care of.

use std::borrow::Cow;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Project identifier, numeric id or `namespace/path`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct ProjectId(pub String);

impl ProjectId {
    pub fn new<T: Into<String>>(id: T) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this id is a plain numeric project id
    pub fn is_numeric(&self) -> bool {
        !self.0.is_empty() && self.0.chars().all(|c| c.is_ascii_digit())
    }

    /// Encoded form usable as one segment of `/api/v4/projects/{id}`
    pub fn path_segment(&self) -> Cow<'_, str> {
        if self.is_numeric() {
            Cow::Borrowed(self.0.as_str())
        } else {
            urlencoding::encode(&self.0)
        }
    }
}

impl std::fmt::Display for ProjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ProjectId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ProjectId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Branch, tag or commit id selecting a point in history
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct GitRef(pub String);

pub const DEFAULT_GIT_REF: &str = "main";

impl GitRef {
    pub fn new<T: Into<String>>(git_ref: T) -> Self {
        Self(git_ref.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for GitRef {
    fn default() -> Self {
        Self(DEFAULT_GIT_REF.to_string())
    }
}

impl std::fmt::Display for GitRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for GitRef {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for GitRef {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Project-scoped merge request number (`iid`, not the global id)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct MergeRequestIid(pub u64);

impl std::fmt::Display for MergeRequestIid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct PipelineId(pub u64);

impl std::fmt::Display for PipelineId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct JobId(pub u64);

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
