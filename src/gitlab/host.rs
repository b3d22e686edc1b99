//! The project host: one outbound attempt, no retry, no decoding
//!
//! `ProjectHost` is the seam between the transport and the network. The
//! production implementation talks to the GitLab REST API with `reqwest`;
//! tests substitute scripted hosts.

use std::future::Future;

use anyhow::{Context, Result};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};

use crate::gitlab::error::ApiRetryableError;
use crate::services::config::HostConfig;
use crate::types::{HttpMethod, RemoteCall};

/// Executes one attempt of a call and returns the raw response body
pub trait ProjectHost: Send + Sync {
    fn execute(
        &self,
        call: &RemoteCall,
    ) -> impl Future<Output = std::result::Result<Vec<u8>, ApiRetryableError>> + Send;
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// GitLab REST host authenticated with a static bearer token
#[derive(Clone)]
pub struct HttpProjectHost {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpProjectHost {
    pub fn new(config: &HostConfig) -> Result<Self> {
        config.validate()?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .user_agent(concat!("gitlab-insight/", env!("CARGO_PKG_VERSION")))
            .default_headers(default_headers)
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout())
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .context("Failed to build GitLab HTTP client")?;

        if config.accept_invalid_certs {
            tracing::warn!("TLS certificate verification is disabled for {}", config.gitlab_url);
        }

        Ok(Self {
            client,
            base_url: config.gitlab_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

impl ProjectHost for HttpProjectHost {
    async fn execute(
        &self,
        call: &RemoteCall,
    ) -> std::result::Result<Vec<u8>, ApiRetryableError> {
        let mut request = self
            .client
            .request(call.method.into(), self.url_for(&call.path));

        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = &call.body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(ApiRetryableError::from_reqwest_error)?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(ApiRetryableError::from_reqwest_error)?;

        if let Some(error) = ApiRetryableError::from_status(status, &body) {
            return Err(error);
        }

        Ok(body.to_vec())
    }
}
