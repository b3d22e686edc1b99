use anyhow::Result;

use crate::gitlab::GitLabClient;
use crate::gitlab::host::ProjectHost;
use crate::services::SearchService;
use crate::types::{CommitRecord, CommitSearch, FileSearchResult, GitRef, GrepOutcome, GrepRequest, ProjectId};

/// Note appended to commit search output when a file path filter was requested
pub const FILE_PATH_NOT_APPLIED: &str =
    "Note: filtering commits by file path is not supported; the `file_path` argument was ignored.";

/// Find files by glob pattern across the project tree
pub async fn find_files<H: ProjectHost + Clone>(
    client: &GitLabClient<H>,
    project: &ProjectId,
    pattern: &str,
    git_ref: &GitRef,
    max_results: usize,
) -> Result<FileSearchResult> {
    let search_service = SearchService::new(client.clone());

    let files = search_service
        .find_files(project, pattern, git_ref, max_results)
        .await?;

    Ok(FileSearchResult {
        pattern: pattern.to_string(),
        files,
    })
}

/// Search file contents for a pattern
pub async fn grep_content<H: ProjectHost + Clone>(
    client: &GitLabClient<H>,
    project: &ProjectId,
    request: &GrepRequest,
) -> Result<GrepOutcome> {
    let search_service = SearchService::new(client.clone());

    search_service.grep(project, request).await
}

/// Search recent commits by message and author.
///
/// Returns the matching commits plus an optional note for the caller when a
/// requested filter could not be applied.
pub async fn search_commits<H: ProjectHost + Clone>(
    client: &GitLabClient<H>,
    project: &ProjectId,
    search: &CommitSearch,
    file_path: Option<&str>,
) -> Result<(Vec<CommitRecord>, Option<&'static str>)> {
    let note = match file_path.filter(|path| !path.trim().is_empty()) {
        Some(path) => {
            tracing::warn!(
                "Commit search requested file path filter '{}', which is not applied",
                path
            );
            Some(FILE_PATH_NOT_APPLIED)
        }
        None => None,
    };

    let search_service = SearchService::new(client.clone());
    let commits = search_service.search_commits(project, search).await?;

    Ok((commits, note))
}
