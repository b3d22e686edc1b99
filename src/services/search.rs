use anyhow::Result;
use futures::stream::{self, StreamExt};

use crate::gitlab::GitLabClient;
use crate::gitlab::client::{CommitQuery, MAX_COMMIT_PAGE_SIZE, TreeQuery};
use crate::gitlab::host::{HttpProjectHost, ProjectHost};
use crate::services::pattern::{CompiledPattern, FileGlob};
use crate::types::{
    CommitRecord, CommitSearch, FileBlob, GitRef, GrepOutcome, GrepRequest, ProjectId,
    SearchMatch, SkippedFile, TreeEntry,
};

/// Commits scanned per requested result, to leave room for client-side filtering
pub const COMMIT_OVERFETCH_FACTOR: usize = 3;

/// Default number of file fetches in flight during a grep
pub const DEFAULT_FETCH_CONCURRENCY: usize = 4;

/// Suffixes of files that are never fetched by grep
pub const BINARY_EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".gif", ".bmp", ".ico", ".pdf", ".zip", ".gz", ".tar", ".7z", ".jar",
    ".exe", ".dll", ".bin", ".so", ".dylib", ".o", ".a", ".class",
];

pub fn is_binary_path(path: &str) -> bool {
    let lower = path.to_lowercase();
    BINARY_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Service emulating filesystem search over a remote project.
///
/// The host offers only a tree listing and per-file fetches, so `find_files`,
/// `grep` and `search_commits` are built from those primitives. Nothing is
/// cached between calls and the host is never written to.
#[derive(Clone)]
pub struct SearchService<H = HttpProjectHost> {
    client: GitLabClient<H>,
    fetch_concurrency: usize,
}

impl<H: ProjectHost> SearchService<H> {
    pub fn new(client: GitLabClient<H>) -> Self {
        Self {
            client,
            fetch_concurrency: DEFAULT_FETCH_CONCURRENCY,
        }
    }

    /// Number of per-file fetches allowed in flight. `1` scans strictly sequentially.
    pub fn with_fetch_concurrency(mut self, fetch_concurrency: usize) -> Self {
        self.fetch_concurrency = fetch_concurrency.max(1);
        self
    }

    /// Finds files whose path matches `pattern`, in tree order, up to `max_results`
    pub async fn find_files(
        &self,
        project: &ProjectId,
        pattern: &str,
        git_ref: &GitRef,
        max_results: usize,
    ) -> Result<Vec<TreeEntry>> {
        let tree = self
            .client
            .list_tree(project, &TreeQuery::recursive(git_ref.clone()))
            .await?;
        let glob = FileGlob::new(pattern);

        Ok(tree
            .into_iter()
            .filter(|entry| entry.is_file() && glob.matches(&entry.path))
            .take(max_results)
            .collect())
    }

    /// Searches file contents like `grep -rn`.
    ///
    /// A file that cannot be fetched is recorded in `GrepOutcome::skipped`
    /// and the remaining files are still scanned.
    pub async fn grep(&self, project: &ProjectId, request: &GrepRequest) -> Result<GrepOutcome> {
        let tree = self
            .client
            .list_tree(project, &TreeQuery::recursive(request.git_ref.clone()))
            .await?;
        let candidates = grep_candidates(tree, request.file_filter.as_deref(), request.max_files);
        let pattern = CompiledPattern::compile(&request.pattern, request.case_insensitive);

        tracing::debug!(
            "Scanning {} files of {} at {} for '{}'",
            candidates.len(),
            project,
            request.git_ref,
            request.pattern
        );

        // `buffered` yields in input order, so matches stay in scan order
        let fetched: Vec<(TreeEntry, Result<FileBlob>)> =
            stream::iter(candidates.into_iter().map(|entry| async move {
                let blob = self
                    .client
                    .get_file(project, &entry.path, &request.git_ref)
                    .await;
                (entry, blob)
            }))
            .buffered(self.fetch_concurrency)
            .collect()
            .await;

        Ok(fetched
            .into_iter()
            .fold(GrepOutcome::default(), |mut outcome, (entry, blob)| {
                match blob {
                    Ok(blob) => {
                        outcome.files_scanned += 1;
                        outcome
                            .matches
                            .extend(scan_blob(&blob, &pattern, request.context_lines));
                    }
                    Err(e) => {
                        tracing::warn!("Failed to search in {}: {}", entry.path, e);
                        outcome.skipped.push(SkippedFile {
                            path: entry.path,
                            reason: e.to_string(),
                        });
                    }
                }
                outcome
            }))
    }

    /// Filters recent commits by message regex and author like `git log --grep --author`.
    ///
    /// At most `limit * COMMIT_OVERFETCH_FACTOR` commits are examined.
    pub async fn search_commits(
        &self,
        project: &ProjectId,
        search: &CommitSearch,
    ) -> Result<Vec<CommitRecord>> {
        if search.limit == 0 {
            return Ok(Vec::new());
        }

        let window = search.limit.saturating_mul(COMMIT_OVERFETCH_FACTOR);
        let query = CommitQuery {
            ref_name: search.ref_name.clone(),
            since: search.since.clone(),
            until: search.until.clone(),
            per_page: Some(window.min(MAX_COMMIT_PAGE_SIZE)),
        };
        let commits = self.client.list_commits(project, &query).await?;

        let message_pattern = search
            .message_pattern
            .as_deref()
            .map(|pattern| CompiledPattern::compile(pattern, true));
        let author = search.author.as_deref().map(str::to_lowercase);

        Ok(commits
            .into_iter()
            .take(window)
            .filter(|commit| {
                message_pattern
                    .as_ref()
                    .is_none_or(|pattern| pattern.is_match(&commit.message))
            })
            .filter(|commit| {
                author
                    .as_deref()
                    .is_none_or(|author| commit.authored_by(author))
            })
            .take(search.limit)
            .collect())
    }
}

/// Files eligible for grep, in tree order, capped at `max_files`
pub fn grep_candidates(
    tree: Vec<TreeEntry>,
    file_filter: Option<&str>,
    max_files: usize,
) -> Vec<TreeEntry> {
    let glob = file_filter.map(FileGlob::new);
    tree.into_iter()
        .filter(TreeEntry::is_file)
        .filter(|entry| glob.as_ref().is_none_or(|glob| glob.matches(&entry.path)))
        .filter(|entry| !is_binary_path(&entry.path))
        .take(max_files)
        .collect()
}

/// Matching lines of one file, with optional context windows
pub fn scan_blob(
    blob: &FileBlob,
    pattern: &CompiledPattern,
    context_lines: usize,
) -> Vec<SearchMatch> {
    let lines: Vec<&str> = blob.content.lines().collect();

    lines
        .iter()
        .enumerate()
        .filter_map(|(index, line)| {
            let matched = pattern.find(line)?;
            Some(SearchMatch {
                file: blob.path.clone(),
                line_number: index + 1,
                line_text: line.trim().to_string(),
                matched: matched.to_string(),
                context: (context_lines > 0).then(|| context_window(&lines, index, context_lines)),
            })
        })
        .collect()
}

/// Lines `index - radius ..= index + radius`, clamped to the file
pub fn context_window(lines: &[&str], index: usize, radius: usize) -> Vec<String> {
    let start = index.saturating_sub(radius);
    let end = index.saturating_add(radius).saturating_add(1).min(lines.len());
    lines[start.min(end)..end]
        .iter()
        .map(|line| line.to_string())
        .collect()
}
