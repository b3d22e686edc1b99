use serde::de::DeserializeOwned;
use tokio::time::{Duration, sleep};
use tracing::{debug, warn};

use crate::gitlab::decode::decode_text;
use crate::gitlab::error::{ApiRetryableError, TransportError};
use crate::gitlab::host::ProjectHost;
use crate::types::RemoteCall;

/// Default number of attempts for one logical call
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Fixed wait between attempts
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_secs(2);

/// Upper bound of a single attempt, including reading the body
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(20);

/// Longest excerpt of a text body quoted in payload errors
const TEXT_EXCERPT_LEN: usize = 120;

/// Retry and timeout policy for one logical call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
    pub attempt_timeout: Duration,
}

impl Default for TransportPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: DEFAULT_RETRY_BACKOFF,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
        }
    }
}

/// Decoded body of a successful call
#[derive(Debug, Clone, PartialEq)]
pub enum HostResponse {
    Json(serde_json::Value),
    /// Bodies that are not JSON, such as job logs, are returned verbatim
    Text(String),
}

impl HostResponse {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let decoded = decode_text(bytes);
        if decoded.text.trim().is_empty() {
            return Self::Text(decoded.text);
        }
        match serde_json::from_str(&decoded.text) {
            Ok(value) => Self::Json(value),
            Err(_) => Self::Text(decoded.text),
        }
    }

    pub fn into_json(self) -> serde_json::Value {
        match self {
            Self::Json(value) => value,
            Self::Text(text) => serde_json::Value::String(text),
        }
    }

}

/// Executes calls against a host with bounded retry and text decoding
#[derive(Clone)]
pub struct Transport<H> {
    host: H,
    policy: TransportPolicy,
}

impl<H: ProjectHost> Transport<H> {
    pub fn new(host: H, policy: TransportPolicy) -> Self {
        Self { host, policy }
    }

    pub async fn call(&self, call: &RemoteCall) -> Result<HostResponse, TransportError> {
        let bytes = self.call_bytes(call).await?;
        Ok(HostResponse::from_bytes(&bytes))
    }

    /// Calls and decodes the body as text without interpreting it as JSON
    pub async fn call_text(&self, call: &RemoteCall) -> Result<String, TransportError> {
        let bytes = self.call_bytes(call).await?;
        Ok(decode_text(&bytes).text)
    }

    async fn call_bytes(&self, call: &RemoteCall) -> Result<Vec<u8>, TransportError> {
        let endpoint = call.endpoint();
        let attempt_timeout = self.policy.attempt_timeout;
        let host = &self.host;

        retry_with_backoff(&endpoint, &self.policy, || async move {
            match tokio::time::timeout(attempt_timeout, host.execute(call)).await {
                Ok(result) => result,
                Err(_) => Err(ApiRetryableError::Retryable(format!(
                    "Request timed out after {:?}",
                    attempt_timeout
                ))),
            }
        })
        .await
    }

    /// Calls and deserializes a JSON body into `T`
    pub async fn call_json<T: DeserializeOwned>(
        &self,
        call: &RemoteCall,
    ) -> Result<T, TransportError> {
        match self.call(call).await? {
            HostResponse::Json(value) => {
                serde_json::from_value(value).map_err(|e| TransportError::UnexpectedPayload {
                    endpoint: call.endpoint(),
                    reason: e.to_string(),
                })
            }
            HostResponse::Text(text) => Err(TransportError::UnexpectedPayload {
                endpoint: call.endpoint(),
                reason: format!("expected JSON, got text: {}", excerpt(&text)),
            }),
        }
    }
}

fn excerpt(text: &str) -> String {
    match text.char_indices().nth(TEXT_EXCERPT_LEN) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

pub(crate) async fn retry_with_backoff<F, Fut, T>(
    operation_name: &str,
    policy: &TransportPolicy,
    execute_operation: F,
) -> Result<T, TransportError>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = std::result::Result<T, ApiRetryableError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        match execute_operation().await {
            Ok(result) => {
                debug!(
                    "Operation {} succeeded on attempt {}",
                    operation_name, attempt
                );
                return Ok(result);
            }
            Err(ApiRetryableError::NonRetryable(reason)) => {
                warn!(
                    "Operation {} returned non-retryable error, failing immediately: {}",
                    operation_name, reason
                );
                return Err(TransportError::Rejected {
                    endpoint: operation_name.to_string(),
                    reason,
                });
            }
            Err(ApiRetryableError::Retryable(reason)) => {
                warn!(
                    "Operation {} failed on attempt {}/{}: {}",
                    operation_name, attempt, max_attempts, reason
                );

                if attempt >= max_attempts {
                    return Err(TransportError::Exhausted {
                        endpoint: operation_name.to_string(),
                        attempts: attempt,
                        last_error: reason,
                    });
                }

                debug!(
                    "Retrying {} in {:?}",
                    operation_name, policy.backoff
                );
                sleep(policy.backoff).await;
            }
        }
    }
}
