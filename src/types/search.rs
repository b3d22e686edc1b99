use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{GitRef, TreeEntry};

pub const DEFAULT_FIND_MAX_RESULTS: usize = 100;
pub const DEFAULT_GREP_MAX_FILES: usize = 50;
pub const DEFAULT_COMMIT_SEARCH_LIMIT: usize = 20;

/// One line matching a content grep
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SearchMatch {
    pub file: String,
    /// 1-based line number
    pub line_number: usize,
    /// Matching line with surrounding whitespace trimmed
    pub line_text: String,
    /// First substring of the line matched by the pattern
    pub matched: String,
    /// Surrounding lines including the matching line, clamped to file bounds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Vec<String>>,
}

/// Parameters of a content grep over one ref
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrepRequest {
    pub pattern: String,
    pub file_filter: Option<String>,
    pub git_ref: GitRef,
    pub case_insensitive: bool,
    pub context_lines: usize,
    pub max_files: usize,
}

impl GrepRequest {
    pub fn new<P: Into<String>>(pattern: P, git_ref: GitRef) -> Self {
        Self {
            pattern: pattern.into(),
            file_filter: None,
            git_ref,
            case_insensitive: false,
            context_lines: 0,
            max_files: DEFAULT_GREP_MAX_FILES,
        }
    }

    pub fn with_file_filter<F: Into<String>>(mut self, file_filter: F) -> Self {
        self.file_filter = Some(file_filter.into());
        self
    }

    pub fn case_insensitive(mut self, case_insensitive: bool) -> Self {
        self.case_insensitive = case_insensitive;
        self
    }

    pub fn with_context_lines(mut self, context_lines: usize) -> Self {
        self.context_lines = context_lines;
        self
    }

    pub fn with_max_files(mut self, max_files: usize) -> Self {
        self.max_files = max_files;
        self
    }
}

/// A candidate file that could not be scanned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFile {
    pub path: String,
    pub reason: String,
}

/// Best-effort result of a grep pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrepOutcome {
    pub matches: Vec<SearchMatch>,
    pub skipped: Vec<SkippedFile>,
    pub files_scanned: usize,
}

/// Files found by a glob search
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSearchResult {
    pub pattern: String,
    pub files: Vec<TreeEntry>,
}

/// Client-side commit filters applied on top of the server-side date window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSearch {
    /// Regular expression matched case-insensitively against the full message
    pub message_pattern: Option<String>,
    /// Case-insensitive substring of author name or email
    pub author: Option<String>,
    /// ISO 8601 lower bound, applied by the host
    pub since: Option<String>,
    /// ISO 8601 upper bound, applied by the host
    pub until: Option<String>,
    pub ref_name: Option<GitRef>,
    pub limit: usize,
}

impl Default for CommitSearch {
    fn default() -> Self {
        Self {
            message_pattern: None,
            author: None,
            since: None,
            until: None,
            ref_name: None,
            limit: DEFAULT_COMMIT_SEARCH_LIMIT,
        }
    }
}
