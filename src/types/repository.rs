//! Repository content types: tree entries, file blobs and commits

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Kind of a tree listing entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

impl EntryKind {
    /// Maps GitLab tree `type` values. `commit` entries are submodules and
    /// cannot be fetched as files, so they are listed as directories.
    pub fn from_gitlab_type(kind: &str) -> Self {
        match kind {
            "blob" => Self::File,
            _ => Self::Directory,
        }
    }
}

/// Raw node shape of `GET /projects/:id/repository/tree`
#[derive(Debug, Clone, Deserialize)]
struct TreeNode {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "type")]
    kind: String,
    path: String,
}

/// One entry of a tree listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TreeNode")]
pub struct TreeEntry {
    pub path: String,
    pub kind: EntryKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl TreeEntry {
    pub fn file<P: Into<String>>(path: P) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::File,
            id: None,
            name: None,
        }
    }

    pub fn directory<P: Into<String>>(path: P) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::Directory,
            id: None,
            name: None,
        }
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }
}

impl From<TreeNode> for TreeEntry {
    fn from(node: TreeNode) -> Self {
        Self {
            kind: EntryKind::from_gitlab_type(&node.kind),
            path: node.path,
            id: node.id,
            name: node.name,
        }
    }
}

/// Decoded content of one repository file at a ref
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileBlob {
    pub path: String,
    pub content: String,
}

impl FileBlob {
    pub fn new<P: Into<String>, C: Into<String>>(path: P, content: C) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// Read-only snapshot of a commit as returned by the commits API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CommitRecord {
    pub id: String,
    #[serde(default)]
    pub short_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub author_email: String,
    #[serde(default, alias = "created_at")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_url: Option<String>,
}

impl CommitRecord {
    /// Case-insensitive substring match against author name and email.
    /// `needle_lowercase` must already be lowercased.
    pub fn authored_by(&self, needle_lowercase: &str) -> bool {
        self.author_name.to_lowercase().contains(needle_lowercase)
            || self.author_email.to_lowercase().contains(needle_lowercase)
    }

    /// First line of the message, falling back to the title field
    pub fn headline(&self) -> &str {
        match self.message.lines().next() {
            Some(line) if !line.trim().is_empty() => line,
            _ => self.title.as_deref().unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_entry_from_gitlab_json() {
        let json = r#"[
            {"id": "a1", "name": "src", "type": "tree", "path": "src", "mode": "040000"},
            {"id": "b2", "name": "main.rs", "type": "blob", "path": "src/main.rs", "mode": "100644"},
            {"id": "c3", "name": "vendor", "type": "commit", "path": "vendor", "mode": "160000"}
        ]"#;
        let entries: Vec<TreeEntry> = serde_json::from_str(json).unwrap();

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].kind, EntryKind::Directory);
        assert_eq!(entries[1].kind, EntryKind::File);
        assert_eq!(entries[1].path, "src/main.rs");
        assert_eq!(entries[1].name.as_deref(), Some("main.rs"));
        assert_eq!(entries[2].kind, EntryKind::Directory);
    }

    #[test]
    fn test_commit_record_from_gitlab_json() {
        let json = r#"{
            "id": "ed899a2f4b50b4370feeea94676502b42383c746",
            "short_id": "ed899a2f",
            "title": "Replace sanitize with escape once",
            "author_name": "Example User",
            "author_email": "user@example.com",
            "created_at": "2021-09-20T11:50:22.001+03:00",
            "message": "Replace sanitize with escape once\n\nbody",
            "web_url": "https://gitlab.example.com/group/project/-/commit/ed899a2f"
        }"#;
        let commit: CommitRecord = serde_json::from_str(json).unwrap();

        assert_eq!(commit.short_id, "ed899a2f");
        assert_eq!(commit.headline(), "Replace sanitize with escape once");
        let timestamp = commit.timestamp.unwrap();
        assert_eq!(timestamp.to_rfc3339(), "2021-09-20T08:50:22.001+00:00");
    }

    #[test]
    fn test_authored_by_matches_name_or_email() {
        let commit = CommitRecord {
            id: "1".to_string(),
            short_id: "1".to_string(),
            title: None,
            message: "fix".to_string(),
            author_name: "Jane Doe".to_string(),
            author_email: "jdoe@Example.com".to_string(),
            timestamp: None,
            web_url: None,
        };

        assert!(commit.authored_by("jane"));
        assert!(commit.authored_by("example.com"));
        assert!(!commit.authored_by("john"));
    }
}
