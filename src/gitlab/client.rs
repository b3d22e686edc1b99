use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::gitlab::decode::decode_text;
use crate::gitlab::endpoint;
use crate::gitlab::host::{HttpProjectHost, ProjectHost};
use crate::gitlab::transport::{Transport, TransportPolicy};
use crate::services::config::HostConfig;
use crate::types::{
    CommitRecord, FileBlob, GitRef, JobId, MergeRequestIid, PipelineId, ProjectId, RemoteCall,
    TreeEntry,
};

/// Page size requested for recursive tree listings
pub const TREE_PAGE_SIZE: u32 = 1000;

/// Largest page size the commits API honours
pub const MAX_COMMIT_PAGE_SIZE: usize = 100;

const DEFAULT_PIPELINE_PAGE_SIZE: u32 = 20;

/// Fields of a new merge request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMergeRequest {
    pub source_branch: String,
    pub target_branch: String,
    pub title: String,
    pub description: Option<String>,
    pub remove_source_branch: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOptions {
    pub merge_commit_message: Option<String>,
    pub should_remove_source_branch: bool,
    pub merge_when_pipeline_succeeds: bool,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            merge_commit_message: None,
            should_remove_source_branch: true,
            merge_when_pipeline_succeeds: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineFilter {
    pub status: Option<String>,
    pub git_ref: Option<GitRef>,
    pub per_page: u32,
}

impl Default for PipelineFilter {
    fn default() -> Self {
        Self {
            status: None,
            git_ref: None,
            per_page: DEFAULT_PIPELINE_PAGE_SIZE,
        }
    }
}

/// Create or update a file through the repository files API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileWrite {
    pub path: String,
    pub content: String,
    pub branch: String,
    pub commit_message: String,
    /// POST when creating, PUT when updating an existing file
    pub create: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitQuery {
    pub ref_name: Option<GitRef>,
    pub since: Option<String>,
    pub until: Option<String>,
    pub per_page: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeQuery {
    pub path: Option<String>,
    pub git_ref: GitRef,
    pub recursive: bool,
    pub per_page: u32,
}

impl TreeQuery {
    /// Full recursive listing of a ref in one large page
    pub fn recursive(git_ref: GitRef) -> Self {
        Self {
            path: None,
            git_ref,
            recursive: true,
            per_page: TREE_PAGE_SIZE,
        }
    }
}

/// Payload of `GET /projects/:id/repository/files/:path`
#[derive(Debug, Deserialize)]
struct FilePayload {
    #[serde(default)]
    file_path: Option<String>,
    #[serde(default)]
    content: String,
    #[serde(default)]
    encoding: Option<String>,
}

/// GitLab REST client built on a retrying transport.
///
/// Every method maps to exactly one call. The search engine composes the
/// tree, file and commit primitives; the rest are passthroughs returning the
/// host payload untouched.
#[derive(Clone)]
pub struct GitLabClient<H = HttpProjectHost> {
    transport: Transport<H>,
}

impl GitLabClient<HttpProjectHost> {
    pub fn from_config(config: &HostConfig) -> Result<Self> {
        let host = HttpProjectHost::new(config)?;
        Ok(Self::new(host, config.transport_policy()))
    }
}

impl<H: ProjectHost> GitLabClient<H> {
    pub fn new(host: H, policy: TransportPolicy) -> Self {
        Self {
            transport: Transport::new(host, policy),
        }
    }

    async fn json(&self, call: RemoteCall) -> Result<Value> {
        let response = self.transport.call(&call).await?;
        Ok(response.into_json())
    }

    pub async fn get_project(&self, project: &ProjectId) -> Result<Value> {
        self.json(RemoteCall::get(endpoint::project(project))).await
    }

    pub async fn list_merge_requests(
        &self,
        project: &ProjectId,
        state: &str,
        scope: &str,
    ) -> Result<Value> {
        let path = endpoint::with_query(
            endpoint::merge_requests(project),
            &[("state", state.to_string()), ("scope", scope.to_string())],
        );
        self.json(RemoteCall::get(path)).await
    }

    pub async fn get_merge_request(
        &self,
        project: &ProjectId,
        iid: MergeRequestIid,
    ) -> Result<Value> {
        self.json(RemoteCall::get(endpoint::merge_request(project, iid)))
            .await
    }

    pub async fn create_merge_request(
        &self,
        project: &ProjectId,
        request: &NewMergeRequest,
    ) -> Result<Value> {
        let mut body = json!({
            "source_branch": request.source_branch,
            "target_branch": request.target_branch,
            "title": request.title,
            "remove_source_branch": request.remove_source_branch,
        });
        if let Some(description) = &request.description {
            body["description"] = Value::String(description.clone());
        }
        self.json(RemoteCall::post(endpoint::merge_requests(project), Some(body)))
            .await
    }

    pub async fn approve_merge_request(
        &self,
        project: &ProjectId,
        iid: MergeRequestIid,
    ) -> Result<Value> {
        let path = endpoint::merge_request_action(project, iid, "approve");
        self.json(RemoteCall::post(path, None)).await
    }

    pub async fn merge_merge_request(
        &self,
        project: &ProjectId,
        iid: MergeRequestIid,
        options: &MergeOptions,
    ) -> Result<Value> {
        let mut body = json!({
            "should_remove_source_branch": options.should_remove_source_branch,
            "merge_when_pipeline_succeeds": options.merge_when_pipeline_succeeds,
        });
        if let Some(message) = &options.merge_commit_message {
            body["merge_commit_message"] = Value::String(message.clone());
        }
        let path = endpoint::merge_request_action(project, iid, "merge");
        self.json(RemoteCall::put(path, Some(body))).await
    }

    pub async fn add_merge_request_note(
        &self,
        project: &ProjectId,
        iid: MergeRequestIid,
        note: &str,
    ) -> Result<Value> {
        let path = endpoint::merge_request_action(project, iid, "notes");
        self.json(RemoteCall::post(path, Some(json!({ "body": note }))))
            .await
    }

    /// Diffs of a merge request
    pub async fn get_merge_request_changes(
        &self,
        project: &ProjectId,
        iid: MergeRequestIid,
    ) -> Result<Value> {
        let path = endpoint::merge_request_action(project, iid, "changes");
        self.json(RemoteCall::get(path)).await
    }

    pub async fn list_pipelines(
        &self,
        project: &ProjectId,
        filter: &PipelineFilter,
    ) -> Result<Value> {
        let mut query = vec![("per_page", filter.per_page.to_string())];
        if let Some(status) = &filter.status {
            query.push(("status", status.clone()));
        }
        if let Some(git_ref) = &filter.git_ref {
            query.push(("ref", git_ref.as_str().to_string()));
        }
        let path = endpoint::with_query(endpoint::pipelines(project), &query);
        self.json(RemoteCall::get(path)).await
    }

    pub async fn get_pipeline(&self, project: &ProjectId, pipeline_id: PipelineId) -> Result<Value> {
        self.json(RemoteCall::get(endpoint::pipeline(project, pipeline_id)))
            .await
    }

    /// Jobs of one pipeline or of the whole project, optionally limited to `scope` states
    pub async fn list_jobs(
        &self,
        project: &ProjectId,
        pipeline_id: Option<PipelineId>,
        scope: &[String],
    ) -> Result<Value> {
        let query: Vec<(&str, String)> = scope.iter().map(|s| ("scope[]", s.clone())).collect();
        let path = endpoint::with_query(endpoint::jobs(project, pipeline_id), &query);
        self.json(RemoteCall::get(path)).await
    }

    pub async fn get_job(&self, project: &ProjectId, job_id: JobId) -> Result<Value> {
        self.json(RemoteCall::get(endpoint::job(project, job_id)))
            .await
    }

    /// Raw job trace. Logs are plain text and may be in any encoding.
    pub async fn get_job_log(&self, project: &ProjectId, job_id: JobId) -> Result<String> {
        let call = RemoteCall::get(endpoint::job_trace(project, job_id));
        Ok(self.transport.call_text(&call).await?)
    }

    pub async fn list_branches(&self, project: &ProjectId, search: Option<&str>) -> Result<Value> {
        let query: Vec<(&str, String)> = search
            .map(|s| vec![("search", s.to_string())])
            .unwrap_or_default();
        let path = endpoint::with_query(endpoint::branches(project), &query);
        self.json(RemoteCall::get(path)).await
    }

    pub async fn create_branch(
        &self,
        project: &ProjectId,
        branch: &str,
        git_ref: &GitRef,
    ) -> Result<Value> {
        let body = json!({ "branch": branch, "ref": git_ref.as_str() });
        self.json(RemoteCall::post(endpoint::branches(project), Some(body)))
            .await
    }

    /// GitLab answers 204 with no body on success
    pub async fn delete_branch(&self, project: &ProjectId, branch: &str) -> Result<()> {
        self.transport
            .call(&RemoteCall::delete(endpoint::branch(project, branch)))
            .await?;
        Ok(())
    }

    /// Fetches one file and decodes its base64 content as text
    pub async fn get_file(
        &self,
        project: &ProjectId,
        file_path: &str,
        git_ref: &GitRef,
    ) -> Result<FileBlob> {
        let call = RemoteCall::get(endpoint::file_at_ref(project, file_path, git_ref));
        let payload: FilePayload = self.transport.call_json(&call).await?;

        let content = match payload.encoding.as_deref() {
            Some("base64") => {
                let compact: String = payload
                    .content
                    .chars()
                    .filter(|c| !c.is_ascii_whitespace())
                    .collect();
                let bytes = BASE64
                    .decode(compact.as_bytes())
                    .with_context(|| format!("Invalid base64 content for {}", file_path))?;
                decode_text(&bytes).text
            }
            _ => payload.content,
        };

        Ok(FileBlob::new(
            payload.file_path.unwrap_or_else(|| file_path.to_string()),
            content,
        ))
    }

    /// Creates or updates a file, sending the content base64 encoded
    pub async fn put_file(&self, project: &ProjectId, write: &FileWrite) -> Result<Value> {
        let body = json!({
            "branch": write.branch,
            "content": BASE64.encode(write.content.as_bytes()),
            "commit_message": write.commit_message,
            "encoding": "base64",
        });
        let path = endpoint::file(project, &write.path);
        let call = if write.create {
            RemoteCall::post(path, Some(body))
        } else {
            RemoteCall::put(path, Some(body))
        };
        self.json(call).await
    }

    pub async fn list_commits(
        &self,
        project: &ProjectId,
        query: &CommitQuery,
    ) -> Result<Vec<CommitRecord>> {
        let mut pairs = Vec::new();
        if let Some(ref_name) = &query.ref_name {
            pairs.push(("ref_name", ref_name.as_str().to_string()));
        }
        if let Some(since) = &query.since {
            pairs.push(("since", since.clone()));
        }
        if let Some(until) = &query.until {
            pairs.push(("until", until.clone()));
        }
        if let Some(per_page) = query.per_page {
            pairs.push(("per_page", per_page.to_string()));
        }
        let call = RemoteCall::get(endpoint::with_query(endpoint::commits(project), &pairs));
        Ok(self.transport.call_json(&call).await?)
    }

    pub async fn get_commit(&self, project: &ProjectId, sha: &str) -> Result<Value> {
        self.json(RemoteCall::get(endpoint::commit(project, sha)))
            .await
    }

    pub async fn list_tree(&self, project: &ProjectId, query: &TreeQuery) -> Result<Vec<TreeEntry>> {
        let mut pairs = vec![
            ("ref", query.git_ref.as_str().to_string()),
            ("per_page", query.per_page.to_string()),
        ];
        if let Some(path) = &query.path {
            pairs.push(("path", path.clone()));
        }
        if query.recursive {
            pairs.push(("recursive", "true".to_string()));
        }
        let call = RemoteCall::get(endpoint::with_query(endpoint::tree(project), &pairs));
        Ok(self.transport.call_json(&call).await?)
    }
}
