use anyhow::{Result, anyhow};
use serde_json::Value;

use crate::gitlab::GitLabClient;
use crate::gitlab::host::ProjectHost;
use crate::types::{JobId, PipelineId, ProjectId};

/// Job statuses accepted by the `scope[]` filter of the jobs endpoints
pub const JOB_SCOPES: &[&str] = &[
    "created",
    "pending",
    "running",
    "failed",
    "success",
    "canceled",
    "skipped",
    "waiting_for_resource",
    "manual",
];

/// Validates and normalizes job scope arguments to lowercase
pub fn normalize_job_scopes(scopes: Vec<String>) -> Result<Vec<String>> {
    scopes
        .into_iter()
        .map(|scope| {
            let normalized = scope.trim().to_lowercase();
            if JOB_SCOPES.contains(&normalized.as_str()) {
                Ok(normalized)
            } else {
                Err(anyhow!(
                    "Unknown job scope '{}'. Expected one of: {}",
                    scope,
                    JOB_SCOPES.join(", ")
                ))
            }
        })
        .collect()
}

pub async fn list_jobs<H: ProjectHost>(
    client: &GitLabClient<H>,
    project: &ProjectId,
    pipeline_id: Option<PipelineId>,
    scopes: Vec<String>,
) -> Result<Value> {
    let scopes = normalize_job_scopes(scopes)?;
    client.list_jobs(project, pipeline_id, &scopes).await
}

/// Job log text, truncated to the last `tail_lines` lines when given
pub async fn get_job_log<H: ProjectHost>(
    client: &GitLabClient<H>,
    project: &ProjectId,
    job_id: JobId,
    tail_lines: Option<usize>,
) -> Result<String> {
    let log = client.get_job_log(project, job_id).await?;
    Ok(match tail_lines {
        Some(tail_lines) => tail(&log, tail_lines),
        None => log,
    })
}

fn tail(log: &str, tail_lines: usize) -> String {
    let lines: Vec<&str> = log.lines().collect();
    let start = lines.len().saturating_sub(tail_lines);
    lines[start..].join("\n")
}
