//! Scripted in-memory GitLab hosts shared by the integration tests
//!
//! `FakeGitLab` answers the tree, file and commit endpoints from fixtures and
//! records every call so tests can assert which files were fetched.
//! `FlakyHost` fails a fixed number of attempts before answering.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::{Value, json};

use gitlab_insight::gitlab::{ApiRetryableError, GitLabClient, ProjectHost, TransportPolicy};
use gitlab_insight::types::{ProjectId, RemoteCall};

pub const TEST_PROJECT: &str = "group/demo";

pub fn test_project() -> ProjectId {
    ProjectId::from(TEST_PROJECT)
}

/// Policy without waiting between attempts
pub fn fast_policy(max_attempts: u32) -> TransportPolicy {
    TransportPolicy {
        max_attempts,
        backoff: Duration::ZERO,
        attempt_timeout: Duration::from_secs(5),
    }
}

#[derive(Clone)]
enum FakeFile {
    Content(Vec<u8>),
    Fail(ApiRetryableError),
}

#[derive(Default)]
struct FakeState {
    tree: Vec<Value>,
    files: HashMap<String, FakeFile>,
    commits: Vec<Value>,
    calls: Mutex<Vec<RemoteCall>>,
}

/// In-memory project serving `repository/tree`, `repository/files` and `repository/commits`
#[derive(Clone, Default)]
pub struct FakeGitLab {
    state: Arc<FakeState>,
}

#[derive(Default)]
pub struct FakeGitLabBuilder {
    state: FakeState,
}

impl FakeGitLabBuilder {
    pub fn file(self, path: &str, content: &str) -> Self {
        self.file_bytes(path, content.as_bytes())
    }

    pub fn file_bytes(mut self, path: &str, content: &[u8]) -> Self {
        self.state.tree.push(json!({
            "id": format!("blob-{}", self.state.tree.len()),
            "name": path.rsplit('/').next().unwrap_or(path),
            "type": "blob",
            "path": path,
            "mode": "100644",
        }));
        self.state
            .files
            .insert(path.to_string(), FakeFile::Content(content.to_vec()));
        self
    }

    /// A file listed in the tree whose fetch always fails with `error`
    pub fn failing_file(mut self, path: &str, error: ApiRetryableError) -> Self {
        self.state.tree.push(json!({
            "id": format!("blob-{}", self.state.tree.len()),
            "name": path.rsplit('/').next().unwrap_or(path),
            "type": "blob",
            "path": path,
            "mode": "100644",
        }));
        self.state
            .files
            .insert(path.to_string(), FakeFile::Fail(error));
        self
    }

    pub fn directory(mut self, path: &str) -> Self {
        self.state.tree.push(json!({
            "id": format!("tree-{}", self.state.tree.len()),
            "name": path.rsplit('/').next().unwrap_or(path),
            "type": "tree",
            "path": path,
            "mode": "040000",
        }));
        self
    }

    pub fn commit(mut self, id: &str, author_name: &str, author_email: &str, message: &str) -> Self {
        self.state.commits.push(json!({
            "id": id,
            "short_id": &id[..id.len().min(8)],
            "title": message.lines().next().unwrap_or_default(),
            "message": message,
            "author_name": author_name,
            "author_email": author_email,
            "created_at": "2024-05-01T12:00:00Z",
            "web_url": format!("https://gitlab.example.com/{}/-/commit/{}", TEST_PROJECT, id),
        }));
        self
    }

    pub fn build(self) -> FakeGitLab {
        FakeGitLab {
            state: Arc::new(self.state),
        }
    }
}

impl FakeGitLab {
    pub fn builder() -> FakeGitLabBuilder {
        FakeGitLabBuilder::default()
    }

    pub fn client(&self) -> GitLabClient<FakeGitLab> {
        GitLabClient::new(self.clone(), fast_policy(1))
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.state.calls.lock().unwrap().clone()
    }

    /// Decoded paths of every file fetch, in request order
    pub fn fetched_files(&self) -> Vec<String> {
        self.calls()
            .iter()
            .filter_map(|call| {
                let (base, _) = split_query(&call.path);
                file_path_of(base)
            })
            .collect()
    }

    /// `per_page` values of every commit listing request
    pub fn commit_page_sizes(&self) -> Vec<usize> {
        self.calls()
            .iter()
            .filter(|call| split_query(&call.path).0.ends_with("/repository/commits"))
            .filter_map(|call| query_value(&call.path, "per_page"))
            .filter_map(|value| value.parse().ok())
            .collect()
    }

    fn respond(&self, call: &RemoteCall) -> Result<Vec<u8>, ApiRetryableError> {
        let (base, _) = split_query(&call.path);

        if base.ends_with("/repository/tree") {
            return Ok(Value::Array(self.state.tree.clone()).to_string().into_bytes());
        }

        if base.ends_with("/repository/commits") {
            let per_page = query_value(&call.path, "per_page")
                .and_then(|value| value.parse::<usize>().ok())
                .unwrap_or(20);
            let page: Vec<Value> = self.state.commits.iter().take(per_page).cloned().collect();
            return Ok(Value::Array(page).to_string().into_bytes());
        }

        if let Some(path) = file_path_of(base) {
            return match self.state.files.get(&path) {
                Some(FakeFile::Content(bytes)) => Ok(json!({
                    "file_path": path,
                    "encoding": "base64",
                    "content": BASE64.encode(bytes),
                })
                .to_string()
                .into_bytes()),
                Some(FakeFile::Fail(error)) => Err(error.clone()),
                None => Err(not_found()),
            };
        }

        Err(not_found())
    }
}

impl ProjectHost for FakeGitLab {
    async fn execute(&self, call: &RemoteCall) -> Result<Vec<u8>, ApiRetryableError> {
        self.state.calls.lock().unwrap().push(call.clone());
        self.respond(call)
    }
}

/// Fails the first `failures` attempts with a retryable error, then answers `body`
#[derive(Clone)]
pub struct FlakyHost {
    failures: usize,
    body: Vec<u8>,
    attempts: Arc<AtomicUsize>,
    delay: Option<Duration>,
}

impl FlakyHost {
    pub fn new(failures: usize, body: &[u8]) -> Self {
        Self {
            failures,
            body: body.to_vec(),
            attempts: Arc::new(AtomicUsize::new(0)),
            delay: None,
        }
    }

    /// Failing attempts hang for `delay` instead of returning an error
    pub fn hanging(failures: usize, delay: Duration, body: &[u8]) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new(failures, body)
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl ProjectHost for FlakyHost {
    async fn execute(&self, _call: &RemoteCall) -> Result<Vec<u8>, ApiRetryableError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if attempt < self.failures {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            return Err(ApiRetryableError::Retryable(format!(
                "connection reset on attempt {}",
                attempt + 1
            )));
        }
        Ok(self.body.clone())
    }
}

/// Always rejects with a 404
#[derive(Clone, Default)]
pub struct RejectingHost {
    attempts: Arc<AtomicUsize>,
}

impl RejectingHost {
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl ProjectHost for RejectingHost {
    async fn execute(&self, _call: &RemoteCall) -> Result<Vec<u8>, ApiRetryableError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(not_found())
    }
}

fn not_found() -> ApiRetryableError {
    ApiRetryableError::NonRetryable(
        r#"GitLab API error - Status: 404, Body: {"message":"404 Not Found"}"#.to_string(),
    )
}

fn split_query(path: &str) -> (&str, &str) {
    path.split_once('?').unwrap_or((path, ""))
}

fn query_value(path: &str, key: &str) -> Option<String> {
    let (_, query) = split_query(path);
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

fn file_path_of(base: &str) -> Option<String> {
    let (_, encoded) = base.split_once("/repository/files/")?;
    urlencoding::decode(encoded).ok().map(|path| path.into_owned())
}
