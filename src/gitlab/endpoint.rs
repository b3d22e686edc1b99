//! REST path construction for the GitLab v4 API

use url::form_urlencoded;

use crate::types::{GitRef, JobId, MergeRequestIid, PipelineId, ProjectId};

pub const API_PREFIX: &str = "/api/v4";

/// Appends an url-encoded query string. Pairs with empty keys are dropped.
pub fn with_query(path: String, pairs: &[(&str, String)]) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    let mut has_pairs = false;
    for (key, value) in pairs.iter().filter(|(key, _)| !key.is_empty()) {
        serializer.append_pair(key, value);
        has_pairs = true;
    }
    if !has_pairs {
        return path;
    }
    format!("{}?{}", path, serializer.finish())
}

pub fn project(project: &ProjectId) -> String {
    format!("{}/projects/{}", API_PREFIX, project.path_segment())
}

pub fn merge_requests(project_id: &ProjectId) -> String {
    format!("{}/merge_requests", project(project_id))
}

pub fn merge_request(project_id: &ProjectId, iid: MergeRequestIid) -> String {
    format!("{}/{}", merge_requests(project_id), iid)
}

pub fn merge_request_action(project_id: &ProjectId, iid: MergeRequestIid, action: &str) -> String {
    format!("{}/{}", merge_request(project_id, iid), action)
}

pub fn pipelines(project_id: &ProjectId) -> String {
    format!("{}/pipelines", project(project_id))
}

pub fn pipeline(project_id: &ProjectId, pipeline_id: PipelineId) -> String {
    format!("{}/{}", pipelines(project_id), pipeline_id)
}

/// Jobs of a pipeline, or of the whole project when no pipeline is given
pub fn jobs(project_id: &ProjectId, pipeline_id: Option<PipelineId>) -> String {
    match pipeline_id {
        Some(pipeline_id) => format!("{}/jobs", pipeline(project_id, pipeline_id)),
        None => format!("{}/jobs", project(project_id)),
    }
}

pub fn job(project_id: &ProjectId, job_id: JobId) -> String {
    format!("{}/jobs/{}", project(project_id), job_id)
}

pub fn job_trace(project_id: &ProjectId, job_id: JobId) -> String {
    format!("{}/trace", job(project_id, job_id))
}

pub fn branches(project_id: &ProjectId) -> String {
    format!("{}/repository/branches", project(project_id))
}

pub fn branch(project_id: &ProjectId, name: &str) -> String {
    format!("{}/{}", branches(project_id), urlencoding::encode(name))
}

pub fn file(project_id: &ProjectId, file_path: &str) -> String {
    format!(
        "{}/repository/files/{}",
        project(project_id),
        urlencoding::encode(file_path)
    )
}

pub fn file_at_ref(project_id: &ProjectId, file_path: &str, git_ref: &GitRef) -> String {
    with_query(
        file(project_id, file_path),
        &[("ref", git_ref.as_str().to_string())],
    )
}

pub fn tree(project_id: &ProjectId) -> String {
    format!("{}/repository/tree", project(project_id))
}

pub fn commits(project_id: &ProjectId) -> String {
    format!("{}/repository/commits", project(project_id))
}

pub fn commit(project_id: &ProjectId, sha: &str) -> String {
    format!("{}/{}", commits(project_id), urlencoding::encode(sha))
}
