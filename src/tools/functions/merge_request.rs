use anyhow::{Result, anyhow};
use serde_json::Value;
use strum::{Display, EnumString};

use crate::gitlab::GitLabClient;
use crate::gitlab::client::{MergeOptions, NewMergeRequest};
use crate::gitlab::host::ProjectHost;
use crate::types::{MergeRequestIid, ProjectId};

/// Merge request states accepted by the list endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, Default)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum MergeRequestState {
    #[default]
    Opened,
    Closed,
    Locked,
    Merged,
    All,
}

/// Merge request scopes accepted by the list endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, Default)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum MergeRequestScope {
    CreatedByMe,
    AssignedToMe,
    #[default]
    All,
}

/// Parse an optional state argument, defaulting to `opened`
pub fn parse_state(state: Option<&str>) -> Result<MergeRequestState> {
    match state {
        Some(state) => state
            .parse()
            .map_err(|_| anyhow!("Unknown merge request state '{}'", state)),
        None => Ok(MergeRequestState::default()),
    }
}

/// Parse an optional scope argument, defaulting to `all`
pub fn parse_scope(scope: Option<&str>) -> Result<MergeRequestScope> {
    match scope {
        Some(scope) => scope
            .parse()
            .map_err(|_| anyhow!("Unknown merge request scope '{}'", scope)),
        None => Ok(MergeRequestScope::default()),
    }
}

pub async fn list_merge_requests<H: ProjectHost>(
    client: &GitLabClient<H>,
    project: &ProjectId,
    state: MergeRequestState,
    scope: MergeRequestScope,
) -> Result<Value> {
    client
        .list_merge_requests(project, &state.to_string(), &scope.to_string())
        .await
}

pub async fn create_merge_request<H: ProjectHost>(
    client: &GitLabClient<H>,
    project: &ProjectId,
    request: NewMergeRequest,
) -> Result<Value> {
    if request.source_branch == request.target_branch {
        return Err(anyhow!(
            "Source and target branch are both '{}'",
            request.source_branch
        ));
    }
    client.create_merge_request(project, &request).await
}

pub async fn merge_merge_request<H: ProjectHost>(
    client: &GitLabClient<H>,
    project: &ProjectId,
    iid: MergeRequestIid,
    options: MergeOptions,
) -> Result<Value> {
    client.merge_merge_request(project, iid, &options).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_state() {
        assert_eq!(parse_state(None).unwrap(), MergeRequestState::Opened);
        assert_eq!(parse_state(Some("MERGED")).unwrap(), MergeRequestState::Merged);
        assert!(parse_state(Some("draft")).is_err());
    }

    #[test]
    fn test_parse_scope() {
        assert_eq!(parse_scope(None).unwrap().to_string(), "all");
        assert_eq!(
            parse_scope(Some("assigned_to_me")).unwrap(),
            MergeRequestScope::AssignedToMe
        );
        assert!(parse_scope(Some("mine")).is_err());
    }
}
