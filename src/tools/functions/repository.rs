use anyhow::{Result, anyhow};
use serde_json::Value;

use crate::gitlab::GitLabClient;
use crate::gitlab::client::{CommitQuery, FileWrite, TreeQuery};
use crate::gitlab::host::ProjectHost;
use crate::types::{CommitRecord, FileBlob, GitRef, ProjectId, TreeEntry};

pub async fn create_branch<H: ProjectHost>(
    client: &GitLabClient<H>,
    project: &ProjectId,
    branch: &str,
    git_ref: &GitRef,
) -> Result<Value> {
    if branch.trim().is_empty() {
        return Err(anyhow!("Branch name must not be empty"));
    }
    client.create_branch(project, branch, git_ref).await
}

pub async fn delete_branch<H: ProjectHost>(
    client: &GitLabClient<H>,
    project: &ProjectId,
    branch: &str,
) -> Result<()> {
    let branch = branch.trim();
    if branch.is_empty() {
        return Err(anyhow!("Branch name must not be empty"));
    }
    client.delete_branch(project, branch).await
}

pub async fn get_file<H: ProjectHost>(
    client: &GitLabClient<H>,
    project: &ProjectId,
    file_path: &str,
    git_ref: &GitRef,
) -> Result<FileBlob> {
    client
        .get_file(project, normalize_path(file_path), git_ref)
        .await
}

pub async fn put_file<H: ProjectHost>(
    client: &GitLabClient<H>,
    project: &ProjectId,
    mut write: FileWrite,
) -> Result<Value> {
    write.path = normalize_path(&write.path).to_string();
    if write.path.is_empty() {
        return Err(anyhow!("File path must not be empty"));
    }
    client.put_file(project, &write).await
}

pub async fn list_commits<H: ProjectHost>(
    client: &GitLabClient<H>,
    project: &ProjectId,
    query: CommitQuery,
) -> Result<Vec<CommitRecord>> {
    client.list_commits(project, &query).await
}

/// Entries directly under `path`, or the whole tree when `recursive`
pub async fn list_tree<H: ProjectHost>(
    client: &GitLabClient<H>,
    project: &ProjectId,
    path: Option<&str>,
    git_ref: GitRef,
    recursive: bool,
) -> Result<Vec<TreeEntry>> {
    let mut query = TreeQuery::recursive(git_ref);
    query.recursive = recursive;
    query.path = path
        .map(normalize_path)
        .filter(|path| !path.is_empty())
        .map(str::to_string);
    client.list_tree(project, &query).await
}

/// Repository paths never start with a slash
fn normalize_path(path: &str) -> &str {
    path.trim().trim_start_matches('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/src/lib.rs"), "src/lib.rs");
        assert_eq!(normalize_path(" docs/a.md "), "docs/a.md");
        assert_eq!(normalize_path("/"), "");
    }
}
