//! MCP (Model Context Protocol) tool implementations for GitLab Insight
//!
//! This module provides the MCP server interface, exposing GitLab project
//! operations as tools that can be used by AI assistants and other MCP clients.
//!
//! ## Features
//!
//! - Merge request, pipeline, job, branch, file and commit passthroughs
//! - Filesystem-style search over a remote project: find files by glob,
//!   grep file contents, filter commits by message and author

use crate::formatter::{commits_markdown, file_search_markdown, grep_outcome_markdown, job_log_markdown, pretty_json};
use crate::gitlab::GitLabClient;
use crate::gitlab::client::{CommitQuery, FileWrite, MergeOptions, NewMergeRequest, PipelineFilter};
use crate::services::HostConfig;
use crate::types::{
    CommitSearch, DEFAULT_COMMIT_SEARCH_LIMIT, DEFAULT_FIND_MAX_RESULTS, DEFAULT_GREP_MAX_FILES,
    GitRef, GrepRequest, JobId, MergeRequestIid, PipelineId, ProjectId,
};
use anyhow::Result;
use rmcp::{Error as McpError, ServerHandler, model::*, tool};
use serde::Serialize;

/// Error types specific to tool operations
pub mod error;

/// Tool function implementations organized by functionality
pub mod functions;

use error::ToolError;

/// Wrapper for GitLab tools exposed through the MCP protocol
#[derive(Clone)]
pub struct GitLabTools {
    config: HostConfig,
    client: GitLabClient,
}

fn git_ref_or_default(git_ref: Option<String>) -> GitRef {
    git_ref
        .filter(|r| !r.trim().is_empty())
        .map(GitRef::new)
        .unwrap_or_default()
}

fn api_error(e: anyhow::Error) -> McpError {
    McpError::internal_error(ToolError::ApiError(format!("{:#}", e)).to_string(), None)
}

fn search_error(e: anyhow::Error) -> McpError {
    McpError::internal_error(ToolError::SearchError(format!("{:#}", e)).to_string(), None)
}

fn invalid_argument(e: anyhow::Error) -> McpError {
    McpError::invalid_params(ToolError::InvalidArgument(e.to_string()).to_string(), None)
}

fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let text = pretty_json(value).map_err(|e| {
        McpError::internal_error(ToolError::SerializationError(e.to_string()).to_string(), None)
    })?;
    Ok(CallToolResult {
        content: vec![Content::text(text)],
        is_error: Some(false),
    })
}

fn markdown_result(markdown: String) -> CallToolResult {
    CallToolResult {
        content: vec![Content::text(markdown)],
        is_error: Some(false),
    }
}

impl GitLabTools {
    /// Creates a new GitLabTools instance from a resolved configuration
    pub fn new(config: HostConfig) -> Result<Self> {
        let client = GitLabClient::from_config(&config)
            .map_err(|e| ToolError::ClientError(format!("{:#}", e)))?;
        Ok(Self { config, client })
    }

    /// Logs the effective connection settings before serving
    pub async fn initialize(&self) -> Result<()> {
        tracing::info!("Initializing GitLabTools for {}", self.config.gitlab_url);

        match self.config.default_project() {
            Some(project) => tracing::info!("Default project: {}", project),
            None => tracing::info!("No default project configured"),
        }
        if self.config.token.is_none() {
            tracing::warn!("No GitLab token configured, only public projects are reachable");
        }

        tracing::info!("GitLabTools initialization complete");
        Ok(())
    }

    /// Project named by the call, falling back to the configured default
    fn resolve_project(&self, project_id: Option<String>) -> Result<ProjectId, McpError> {
        project_id
            .filter(|id| !id.trim().is_empty())
            .map(|id| ProjectId::new(id.trim()))
            .or_else(|| self.config.default_project())
            .ok_or_else(|| McpError::invalid_request(ToolError::MissingProject.to_string(), None))
    }
}

#[tool(tool_box)]
impl GitLabTools {
    #[tool(
        description = "Get project details. Returns the GitLab project as JSON including name, path, default branch, visibility and URLs. Examples: `{}` (configured default project), `{\"project_id\": \"group/subgroup/project\"}`, `{\"project_id\": \"42\"}`"
    )]
    async fn gitlab_get_project(
        &self,
        #[tool(param)]
        #[schemars(
            description = "Optional project id or full path. Defaults to the configured project. Examples: '42', 'gitlab-org/gitlab'"
        )]
        project_id: Option<String>,
    ) -> Result<CallToolResult, McpError> {
        let project = self.resolve_project(project_id)?;
        let value = self
            .client
            .get_project(&project)
            .await
            .map_err(api_error)?;
        json_result(&value)
    }

    #[tool(
        description = "List merge requests of a project as JSON. Examples: `{}` (open merge requests), `{\"state\": \"merged\", \"scope\": \"created_by_me\"}`"
    )]
    async fn gitlab_list_merge_requests(
        &self,
        #[tool(param)]
        #[schemars(description = "Optional project id or full path. Defaults to the configured project.")]
        project_id: Option<String>,
        #[tool(param)]
        #[schemars(
            description = "Optional state filter: opened, closed, locked, merged or all (default: opened)"
        )]
        state: Option<String>,
        #[tool(param)]
        #[schemars(
            description = "Optional scope filter: created_by_me, assigned_to_me or all (default: all)"
        )]
        scope: Option<String>,
    ) -> Result<CallToolResult, McpError> {
        let project = self.resolve_project(project_id)?;
        let state = functions::merge_request::parse_state(state.as_deref()).map_err(invalid_argument)?;
        let scope = functions::merge_request::parse_scope(scope.as_deref()).map_err(invalid_argument)?;

        let value = functions::merge_request::list_merge_requests(&self.client, &project, state, scope)
            .await
            .map_err(api_error)?;
        json_result(&value)
    }

    #[tool(description = "Get a single merge request by its project-scoped IID, as JSON.")]
    async fn gitlab_get_merge_request(
        &self,
        #[tool(param)]
        #[schemars(description = "Optional project id or full path. Defaults to the configured project.")]
        project_id: Option<String>,
        #[tool(param)]
        #[schemars(description = "Merge request IID (the number shown as !123). Example: 123")]
        merge_request_iid: u64,
    ) -> Result<CallToolResult, McpError> {
        let project = self.resolve_project(project_id)?;
        let value = self
            .client
            .get_merge_request(&project, MergeRequestIid(merge_request_iid))
            .await
            .map_err(api_error)?;
        json_result(&value)
    }

    #[tool(
        description = "Create a merge request. Returns the created merge request as JSON. Example: `{\"source_branch\": \"feature/login\", \"target_branch\": \"main\", \"title\": \"Add login page\"}`"
    )]
    async fn gitlab_create_merge_request(
        &self,
        #[tool(param)]
        #[schemars(description = "Optional project id or full path. Defaults to the configured project.")]
        project_id: Option<String>,
        #[tool(param)]
        #[schemars(description = "Branch containing the changes")]
        source_branch: String,
        #[tool(param)]
        #[schemars(description = "Branch to merge into")]
        target_branch: String,
        #[tool(param)]
        #[schemars(description = "Merge request title")]
        title: String,
        #[tool(param)]
        #[schemars(description = "Optional markdown description")]
        description: Option<String>,
        #[tool(param)]
        #[schemars(description = "Remove the source branch after merge (default: true)")]
        remove_source_branch: Option<bool>,
    ) -> Result<CallToolResult, McpError> {
        let project = self.resolve_project(project_id)?;
        let request = NewMergeRequest {
            source_branch,
            target_branch,
            title,
            description,
            remove_source_branch: remove_source_branch.unwrap_or(true),
        };

        let value = functions::merge_request::create_merge_request(&self.client, &project, request)
            .await
            .map_err(api_error)?;
        json_result(&value)
    }

    #[tool(description = "Approve a merge request as the authenticated user. Returns the approval state as JSON.")]
    async fn gitlab_approve_merge_request(
        &self,
        #[tool(param)]
        #[schemars(description = "Optional project id or full path. Defaults to the configured project.")]
        project_id: Option<String>,
        #[tool(param)]
        #[schemars(description = "Merge request IID. Example: 123")]
        merge_request_iid: u64,
    ) -> Result<CallToolResult, McpError> {
        let project = self.resolve_project(project_id)?;
        let value = self
            .client
            .approve_merge_request(&project, MergeRequestIid(merge_request_iid))
            .await
            .map_err(api_error)?;
        json_result(&value)
    }

    #[tool(
        description = "Merge a merge request. Returns the merged merge request as JSON. Example: `{\"merge_request_iid\": 123, \"merge_when_pipeline_succeeds\": true}`"
    )]
    async fn gitlab_merge_merge_request(
        &self,
        #[tool(param)]
        #[schemars(description = "Optional project id or full path. Defaults to the configured project.")]
        project_id: Option<String>,
        #[tool(param)]
        #[schemars(description = "Merge request IID. Example: 123")]
        merge_request_iid: u64,
        #[tool(param)]
        #[schemars(description = "Optional custom merge commit message")]
        merge_commit_message: Option<String>,
        #[tool(param)]
        #[schemars(description = "Remove the source branch after merge (default: true)")]
        should_remove_source_branch: Option<bool>,
        #[tool(param)]
        #[schemars(description = "Merge once the pipeline succeeds instead of immediately (default: false)")]
        merge_when_pipeline_succeeds: Option<bool>,
    ) -> Result<CallToolResult, McpError> {
        let project = self.resolve_project(project_id)?;
        let defaults = MergeOptions::default();
        let options = MergeOptions {
            merge_commit_message,
            should_remove_source_branch: should_remove_source_branch
                .unwrap_or(defaults.should_remove_source_branch),
            merge_when_pipeline_succeeds: merge_when_pipeline_succeeds
                .unwrap_or(defaults.merge_when_pipeline_succeeds),
        };

        let value = functions::merge_request::merge_merge_request(
            &self.client,
            &project,
            MergeRequestIid(merge_request_iid),
            options,
        )
        .await
        .map_err(api_error)?;
        json_result(&value)
    }

    #[tool(description = "Add a comment to a merge request. Returns the created note as JSON.")]
    async fn gitlab_add_merge_request_note(
        &self,
        #[tool(param)]
        #[schemars(description = "Optional project id or full path. Defaults to the configured project.")]
        project_id: Option<String>,
        #[tool(param)]
        #[schemars(description = "Merge request IID. Example: 123")]
        merge_request_iid: u64,
        #[tool(param)]
        #[schemars(description = "Comment body in markdown")]
        body: String,
    ) -> Result<CallToolResult, McpError> {
        if body.trim().is_empty() {
            return Err(McpError::invalid_params(
                ToolError::InvalidArgument("Note body must not be empty".to_string()).to_string(),
                None,
            ));
        }
        let project = self.resolve_project(project_id)?;
        let value = self
            .client
            .add_merge_request_note(&project, MergeRequestIid(merge_request_iid), &body)
            .await
            .map_err(api_error)?;
        json_result(&value)
    }

    #[tool(description = "Get the diffs of a merge request, as JSON including each changed file's diff.")]
    async fn gitlab_get_merge_request_changes(
        &self,
        #[tool(param)]
        #[schemars(description = "Optional project id or full path. Defaults to the configured project.")]
        project_id: Option<String>,
        #[tool(param)]
        #[schemars(description = "Merge request IID. Example: 123")]
        merge_request_iid: u64,
    ) -> Result<CallToolResult, McpError> {
        let project = self.resolve_project(project_id)?;
        let value = self
            .client
            .get_merge_request_changes(&project, MergeRequestIid(merge_request_iid))
            .await
            .map_err(api_error)?;
        json_result(&value)
    }

    #[tool(
        description = "List recent pipelines as JSON. Examples: `{}`, `{\"status\": \"failed\", \"git_ref\": \"main\"}`"
    )]
    async fn gitlab_list_pipelines(
        &self,
        #[tool(param)]
        #[schemars(description = "Optional project id or full path. Defaults to the configured project.")]
        project_id: Option<String>,
        #[tool(param)]
        #[schemars(
            description = "Optional status filter. Examples: 'running', 'success', 'failed', 'canceled'"
        )]
        status: Option<String>,
        #[tool(param)]
        #[schemars(description = "Optional branch or tag to filter by")]
        git_ref: Option<String>,
        #[tool(param)]
        #[schemars(description = "Optional page size (default: 20)")]
        per_page: Option<u32>,
    ) -> Result<CallToolResult, McpError> {
        let project = self.resolve_project(project_id)?;
        let defaults = PipelineFilter::default();
        let filter = PipelineFilter {
            status,
            git_ref: git_ref.map(GitRef::new),
            per_page: per_page.unwrap_or(defaults.per_page),
        };

        let value = self
            .client
            .list_pipelines(&project, &filter)
            .await
            .map_err(api_error)?;
        json_result(&value)
    }

    #[tool(description = "Get a single pipeline by id, as JSON.")]
    async fn gitlab_get_pipeline(
        &self,
        #[tool(param)]
        #[schemars(description = "Optional project id or full path. Defaults to the configured project.")]
        project_id: Option<String>,
        #[tool(param)]
        #[schemars(description = "Pipeline id. Example: 987654")]
        pipeline_id: u64,
    ) -> Result<CallToolResult, McpError> {
        let project = self.resolve_project(project_id)?;
        let value = self
            .client
            .get_pipeline(&project, PipelineId(pipeline_id))
            .await
            .map_err(api_error)?;
        json_result(&value)
    }

    #[tool(
        description = "List jobs of a pipeline, or of the whole project when no pipeline is given, as JSON. Example: `{\"pipeline_id\": 987654, \"scope\": [\"failed\"]}`"
    )]
    async fn gitlab_list_jobs(
        &self,
        #[tool(param)]
        #[schemars(description = "Optional project id or full path. Defaults to the configured project.")]
        project_id: Option<String>,
        #[tool(param)]
        #[schemars(description = "Optional pipeline id")]
        pipeline_id: Option<u64>,
        #[tool(param)]
        #[schemars(
            description = "Optional job statuses to include. Examples: ['failed'], ['running', 'pending']"
        )]
        scope: Option<Vec<String>>,
    ) -> Result<CallToolResult, McpError> {
        let project = self.resolve_project(project_id)?;
        let scopes = functions::pipeline::normalize_job_scopes(scope.unwrap_or_default())
            .map_err(invalid_argument)?;

        let value = functions::pipeline::list_jobs(
            &self.client,
            &project,
            pipeline_id.map(PipelineId),
            scopes,
        )
        .await
        .map_err(api_error)?;
        json_result(&value)
    }

    #[tool(description = "Get a single job by id, as JSON.")]
    async fn gitlab_get_job(
        &self,
        #[tool(param)]
        #[schemars(description = "Optional project id or full path. Defaults to the configured project.")]
        project_id: Option<String>,
        #[tool(param)]
        #[schemars(description = "Job id. Example: 1234567")]
        job_id: u64,
    ) -> Result<CallToolResult, McpError> {
        let project = self.resolve_project(project_id)?;
        let value = self
            .client
            .get_job(&project, JobId(job_id))
            .await
            .map_err(api_error)?;
        json_result(&value)
    }

    #[tool(
        description = "Get the log (trace) of a job as markdown. Use tail_lines to limit output to the end of long logs. Example: `{\"job_id\": 1234567, \"tail_lines\": 200}`"
    )]
    async fn gitlab_get_job_log(
        &self,
        #[tool(param)]
        #[schemars(description = "Optional project id or full path. Defaults to the configured project.")]
        project_id: Option<String>,
        #[tool(param)]
        #[schemars(description = "Job id. Example: 1234567")]
        job_id: u64,
        #[tool(param)]
        #[schemars(description = "Optional number of trailing lines to return")]
        tail_lines: Option<usize>,
    ) -> Result<CallToolResult, McpError> {
        let project = self.resolve_project(project_id)?;
        let log = functions::pipeline::get_job_log(&self.client, &project, JobId(job_id), tail_lines)
            .await
            .map_err(api_error)?;
        Ok(markdown_result(job_log_markdown(job_id, &log).0))
    }

    #[tool(description = "List repository branches as JSON, optionally filtered by a search term.")]
    async fn gitlab_list_branches(
        &self,
        #[tool(param)]
        #[schemars(description = "Optional project id or full path. Defaults to the configured project.")]
        project_id: Option<String>,
        #[tool(param)]
        #[schemars(description = "Optional substring of the branch name. Example: 'release'")]
        search: Option<String>,
    ) -> Result<CallToolResult, McpError> {
        let project = self.resolve_project(project_id)?;
        let value = self
            .client
            .list_branches(&project, search.as_deref())
            .await
            .map_err(api_error)?;
        json_result(&value)
    }

    #[tool(
        description = "Create a branch from an existing ref. Example: `{\"branch\": \"feature/login\", \"git_ref\": \"main\"}`"
    )]
    async fn gitlab_create_branch(
        &self,
        #[tool(param)]
        #[schemars(description = "Optional project id or full path. Defaults to the configured project.")]
        project_id: Option<String>,
        #[tool(param)]
        #[schemars(description = "Name of the new branch")]
        branch: String,
        #[tool(param)]
        #[schemars(description = "Branch, tag or commit to branch from (default: main)")]
        git_ref: Option<String>,
    ) -> Result<CallToolResult, McpError> {
        let project = self.resolve_project(project_id)?;
        let value = functions::repository::create_branch(
            &self.client,
            &project,
            &branch,
            &git_ref_or_default(git_ref),
        )
        .await
        .map_err(api_error)?;
        json_result(&value)
    }

    #[tool(description = "Delete a branch. Protected branches are refused by GitLab. Example: `{\"branch\": \"feature/login\"}`")]
    async fn gitlab_delete_branch(
        &self,
        #[tool(param)]
        #[schemars(description = "Optional project id or full path. Defaults to the configured project.")]
        project_id: Option<String>,
        #[tool(param)]
        #[schemars(description = "Name of the branch to delete")]
        branch: String,
    ) -> Result<CallToolResult, McpError> {
        let project = self.resolve_project(project_id)?;
        functions::repository::delete_branch(&self.client, &project, &branch)
            .await
            .map_err(api_error)?;
        json_result(&serde_json::json!({ "deleted": branch.trim() }))
    }

    #[tool(
        description = "Get the decoded text content of a file at a ref. Example: `{\"file_path\": \"src/main.rs\", \"git_ref\": \"develop\"}`"
    )]
    async fn gitlab_get_file(
        &self,
        #[tool(param)]
        #[schemars(description = "Optional project id or full path. Defaults to the configured project.")]
        project_id: Option<String>,
        #[tool(param)]
        #[schemars(description = "Path of the file in the repository")]
        file_path: String,
        #[tool(param)]
        #[schemars(description = "Branch, tag or commit (default: main)")]
        git_ref: Option<String>,
    ) -> Result<CallToolResult, McpError> {
        let project = self.resolve_project(project_id)?;
        let blob = functions::repository::get_file(
            &self.client,
            &project,
            &file_path,
            &git_ref_or_default(git_ref),
        )
        .await
        .map_err(api_error)?;
        json_result(&blob)
    }

    #[tool(
        description = "Create or update a file with a commit. Example: `{\"file_path\": \"docs/notes.md\", \"content\": \"# Notes\", \"branch\": \"main\", \"commit_message\": \"Add notes\", \"create\": true}`"
    )]
    async fn gitlab_put_file(
        &self,
        #[tool(param)]
        #[schemars(description = "Optional project id or full path. Defaults to the configured project.")]
        project_id: Option<String>,
        #[tool(param)]
        #[schemars(description = "Path of the file in the repository")]
        file_path: String,
        #[tool(param)]
        #[schemars(description = "Full new file content")]
        content: String,
        #[tool(param)]
        #[schemars(description = "Branch to commit to")]
        branch: String,
        #[tool(param)]
        #[schemars(description = "Commit message")]
        commit_message: String,
        #[tool(param)]
        #[schemars(description = "Create a new file instead of updating an existing one (default: false)")]
        create: Option<bool>,
    ) -> Result<CallToolResult, McpError> {
        let project = self.resolve_project(project_id)?;
        let write = FileWrite {
            path: file_path,
            content,
            branch,
            commit_message,
            create: create.unwrap_or(false),
        };

        let value = functions::repository::put_file(&self.client, &project, write)
            .await
            .map_err(api_error)?;
        json_result(&value)
    }

    #[tool(
        description = "List commits as JSON, newest first. Example: `{\"ref_name\": \"main\", \"since\": \"2024-01-01T00:00:00Z\", \"per_page\": 20}`"
    )]
    async fn gitlab_list_commits(
        &self,
        #[tool(param)]
        #[schemars(description = "Optional project id or full path. Defaults to the configured project.")]
        project_id: Option<String>,
        #[tool(param)]
        #[schemars(description = "Optional branch or tag")]
        ref_name: Option<String>,
        #[tool(param)]
        #[schemars(description = "Optional ISO 8601 lower bound")]
        since: Option<String>,
        #[tool(param)]
        #[schemars(description = "Optional ISO 8601 upper bound")]
        until: Option<String>,
        #[tool(param)]
        #[schemars(description = "Optional page size (max 100)")]
        per_page: Option<usize>,
    ) -> Result<CallToolResult, McpError> {
        let project = self.resolve_project(project_id)?;
        let query = CommitQuery {
            ref_name: ref_name.map(GitRef::new),
            since,
            until,
            per_page,
        };

        let commits = functions::repository::list_commits(&self.client, &project, query)
            .await
            .map_err(api_error)?;
        json_result(&commits)
    }

    #[tool(description = "Get a single commit by SHA, as JSON including stats.")]
    async fn gitlab_get_commit(
        &self,
        #[tool(param)]
        #[schemars(description = "Optional project id or full path. Defaults to the configured project.")]
        project_id: Option<String>,
        #[tool(param)]
        #[schemars(description = "Commit SHA, short SHA, branch or tag")]
        sha: String,
    ) -> Result<CallToolResult, McpError> {
        let project = self.resolve_project(project_id)?;
        let value = self
            .client
            .get_commit(&project, &sha)
            .await
            .map_err(api_error)?;
        json_result(&value)
    }

    #[tool(
        description = "Find files by glob pattern, like `find`. `*` matches within one path segment and `**` across segments. Returns matching paths as markdown. Examples: `{\"pattern\": \"**/*.py\"}`, `{\"pattern\": \"src/**/mod.rs\", \"git_ref\": \"develop\", \"max_results\": 20}`"
    )]
    async fn gitlab_search_files(
        &self,
        #[tool(param)]
        #[schemars(description = "Optional project id or full path. Defaults to the configured project.")]
        project_id: Option<String>,
        #[tool(param)]
        #[schemars(description = "Glob pattern matched against full file paths")]
        pattern: String,
        #[tool(param)]
        #[schemars(description = "Branch, tag or commit (default: main)")]
        git_ref: Option<String>,
        #[tool(param)]
        #[schemars(description = "Optional maximum number of files to return (default: 100)")]
        max_results: Option<usize>,
    ) -> Result<CallToolResult, McpError> {
        let project = self.resolve_project(project_id)?;
        let git_ref = git_ref_or_default(git_ref);

        let result = functions::search::find_files(
            &self.client,
            &project,
            &pattern,
            &git_ref,
            max_results.unwrap_or(DEFAULT_FIND_MAX_RESULTS),
        )
        .await
        .map_err(search_error)?;

        Ok(markdown_result(
            file_search_markdown(&result.pattern, &git_ref, &result.files).0,
        ))
    }

    #[tool(
        description = "Search file contents like `grep -rn`. The pattern is a regular expression; invalid expressions are matched literally. Binary files are skipped and files that fail to download are listed as skipped. Returns matches grouped by file as markdown. Examples: `{\"pattern\": \"fn main\"}`, `{\"pattern\": \"TODO|FIXME\", \"file_pattern\": \"src/**/*.rs\", \"case_insensitive\": true, \"context_lines\": 2}`"
    )]
    async fn gitlab_grep_content(
        &self,
        #[tool(param)]
        #[schemars(description = "Optional project id or full path. Defaults to the configured project.")]
        project_id: Option<String>,
        #[tool(param)]
        #[schemars(description = "Regular expression to search for")]
        pattern: String,
        #[tool(param)]
        #[schemars(description = "Optional glob limiting which files are scanned. Example: '**/*.rs'")]
        file_pattern: Option<String>,
        #[tool(param)]
        #[schemars(description = "Branch, tag or commit (default: main)")]
        git_ref: Option<String>,
        #[tool(param)]
        #[schemars(description = "Match case-insensitively (default: false)")]
        case_insensitive: Option<bool>,
        #[tool(param)]
        #[schemars(description = "Lines of context before and after each match (default: 0)")]
        context_lines: Option<usize>,
        #[tool(param)]
        #[schemars(description = "Maximum number of files to scan (default: 50)")]
        max_files: Option<usize>,
    ) -> Result<CallToolResult, McpError> {
        let project = self.resolve_project(project_id)?;
        let git_ref = git_ref_or_default(git_ref);

        let mut request = GrepRequest::new(pattern, git_ref.clone())
            .case_insensitive(case_insensitive.unwrap_or(false))
            .with_context_lines(context_lines.unwrap_or(0))
            .with_max_files(max_files.unwrap_or(DEFAULT_GREP_MAX_FILES));
        if let Some(file_pattern) = file_pattern.filter(|p| !p.trim().is_empty()) {
            request = request.with_file_filter(file_pattern);
        }

        let outcome = functions::search::grep_content(&self.client, &project, &request)
            .await
            .map_err(search_error)?;

        Ok(markdown_result(
            grep_outcome_markdown(&request.pattern, &git_ref, &outcome).0,
        ))
    }

    #[tool(
        description = "Search recent commits like `git log --grep --author`. The message pattern is a case-insensitive regular expression; author is a case-insensitive substring of the author name or email. At most three times `limit` recent commits are examined. Returns commits as markdown. Examples: `{\"message_pattern\": \"fix(es)?\\\\b\", \"limit\": 10}`, `{\"author\": \"jane\", \"since\": \"2024-01-01T00:00:00Z\"}`"
    )]
    async fn gitlab_search_commits(
        &self,
        #[tool(param)]
        #[schemars(description = "Optional project id or full path. Defaults to the configured project.")]
        project_id: Option<String>,
        #[tool(param)]
        #[schemars(description = "Optional regular expression matched against the full commit message")]
        message_pattern: Option<String>,
        #[tool(param)]
        #[schemars(description = "Optional author name or email substring")]
        author: Option<String>,
        #[tool(param)]
        #[schemars(description = "Optional ISO 8601 lower bound")]
        since: Option<String>,
        #[tool(param)]
        #[schemars(description = "Optional ISO 8601 upper bound")]
        until: Option<String>,
        #[tool(param)]
        #[schemars(description = "Optional branch or tag (default: the project's default branch)")]
        ref_name: Option<String>,
        #[tool(param)]
        #[schemars(description = "Not supported; accepted and ignored with a note in the output")]
        file_path: Option<String>,
        #[tool(param)]
        #[schemars(description = "Maximum number of commits to return (default: 20)")]
        limit: Option<usize>,
    ) -> Result<CallToolResult, McpError> {
        let project = self.resolve_project(project_id)?;
        let search = CommitSearch {
            message_pattern: message_pattern.filter(|p| !p.is_empty()),
            author: author.filter(|a| !a.trim().is_empty()),
            since,
            until,
            ref_name: ref_name.map(GitRef::new),
            limit: limit.unwrap_or(DEFAULT_COMMIT_SEARCH_LIMIT),
        };

        let (commits, note) =
            functions::search::search_commits(&self.client, &project, &search, file_path.as_deref())
                .await
                .map_err(search_error)?;

        let mut content = vec![Content::text(commits_markdown(&commits).0)];
        if let Some(note) = note {
            content.push(Content::text(note.to_string()));
        }

        Ok(CallToolResult {
            content,
            is_error: Some(false),
        })
    }
}

#[tool(tool_box)]
impl ServerHandler for GitLabTools {
    /// Provides information about this MCP server
    fn get_info(&self) -> ServerInfo {
        let auth_status = match &self.config.token {
            Some(_) => "Authenticated with GitLab token",
            None => "Not authenticated (public projects only)",
        };
        let default_project = self
            .config
            .project_id
            .clone()
            .unwrap_or_else(|| "none (pass project_id on every call)".to_string());

        let instructions = format!(
            r#"GitLab Insight MCP Server - {}

## Overview
GitLab Insight exposes one GitLab project ({}) as tools. Every tool takes an optional `project_id` (numeric id or full path such as `group/project`); when omitted the configured default project is used (default: {}).

Transient network failures are retried; a tool error means the host kept failing or rejected the request.

## Search Tools (markdown output)

### gitlab_search_files
Find files by glob over the whole tree of a ref.
```json
{{"name": "gitlab_search_files", "arguments": {{"pattern": "**/*.py"}}}}
```

### gitlab_grep_content
Search file contents with a regular expression. Binary files are never downloaded; files that fail to download are listed under "Skipped Files".
```json
{{"name": "gitlab_grep_content", "arguments": {{"pattern": "fn main", "file_pattern": "src/**/*.rs", "context_lines": 2}}}}
```

### gitlab_search_commits
Filter recent commits by message regex and author.
```json
{{"name": "gitlab_search_commits", "arguments": {{"message_pattern": "hotfix", "author": "jane", "limit": 5}}}}
```

## Passthrough Tools (JSON output)

- Project: gitlab_get_project
- Merge requests: gitlab_list_merge_requests, gitlab_get_merge_request, gitlab_create_merge_request, gitlab_approve_merge_request, gitlab_merge_merge_request, gitlab_add_merge_request_note, gitlab_get_merge_request_changes
- Pipelines and jobs: gitlab_list_pipelines, gitlab_get_pipeline, gitlab_list_jobs, gitlab_get_job, gitlab_get_job_log (markdown)
- Repository: gitlab_list_branches, gitlab_create_branch, gitlab_delete_branch, gitlab_get_file, gitlab_put_file, gitlab_list_commits, gitlab_get_commit

## Common Workflows

1. **Investigating a failed pipeline**: gitlab_list_pipelines with `status: failed`, then gitlab_list_jobs with `scope: ["failed"]`, then gitlab_get_job_log with `tail_lines`.
2. **Understanding code**: gitlab_search_files to locate files, gitlab_grep_content to find usages, gitlab_get_file to read them.
3. **Shipping a change**: gitlab_create_branch, gitlab_put_file, gitlab_create_merge_request.
"#,
            auth_status, self.config.gitlab_url, default_project
        );

        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(instructions),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tools_with_project(project_id: Option<&str>) -> GitLabTools {
        let config = HostConfig {
            project_id: project_id.map(str::to_string),
            ..Default::default()
        };
        GitLabTools::new(config).unwrap()
    }

    #[test]
    fn test_resolve_project_prefers_argument() {
        let tools = tools_with_project(Some("platform/api"));

        let project = tools.resolve_project(Some(" 42 ".to_string())).unwrap();
        assert_eq!(project.as_str(), "42");

        let project = tools.resolve_project(None).unwrap();
        assert_eq!(project.as_str(), "platform/api");

        let project = tools.resolve_project(Some(String::new())).unwrap();
        assert_eq!(project.as_str(), "platform/api");
    }

    #[test]
    fn test_resolve_project_requires_some_project() {
        let tools = tools_with_project(None);
        assert!(tools.resolve_project(None).is_err());
    }

    #[test]
    fn test_git_ref_or_default() {
        assert_eq!(git_ref_or_default(None).as_str(), "main");
        assert_eq!(git_ref_or_default(Some("  ".to_string())).as_str(), "main");
        assert_eq!(git_ref_or_default(Some("v1.2.0".to_string())).as_str(), "v1.2.0");
    }

    #[test]
    fn test_server_info_lists_search_tools() {
        let info = tools_with_project(Some("platform/api")).get_info();
        let instructions = info.instructions.unwrap();

        assert!(instructions.contains("gitlab_search_files"));
        assert!(instructions.contains("gitlab_grep_content"));
        assert!(instructions.contains("gitlab_search_commits"));
        assert!(instructions.contains("platform/api"));
    }
}
