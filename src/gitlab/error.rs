/// Classification of a single failed attempt for retry logic
#[derive(Debug, Clone, PartialEq)]
pub enum ApiRetryableError {
    /// Errors that should be retried (timeouts, connection failures, 5xx, 429)
    Retryable(String),
    /// Answers from the host that retrying cannot change (4xx except 429)
    NonRetryable(String),
}

/// Longest excerpt of an error body kept in error messages
const ERROR_BODY_EXCERPT_LEN: usize = 300;

impl ApiRetryableError {
    /// Convert a reqwest error to the appropriate retry category
    pub fn from_reqwest_error(error: reqwest::Error) -> Self {
        tracing::debug!("Raw reqwest error: {:?}", error);

        if error.is_timeout() {
            Self::Retryable(format!("Request timed out: {}", error))
        } else if error.is_connect() {
            Self::Retryable(format!("Connection error: {}", error))
        } else if error.is_request() || error.is_body() || error.is_decode() {
            Self::Retryable(format!("HTTP transport error: {}", error))
        } else if error.is_builder() {
            Self::NonRetryable(format!("Invalid request: {}", error))
        } else {
            Self::Retryable(format!("HTTP error: {}", error))
        }
    }

    /// Classify a response status. Returns `None` for success statuses.
    pub fn from_status(status: u16, body: &[u8]) -> Option<Self> {
        if (200..300).contains(&status) {
            return None;
        }

        let excerpt = body_excerpt(body);
        let detailed_error = format!("GitLab API error - Status: {}, Body: {}", status, excerpt);

        let result = match status {
            429 => {
                tracing::warn!("Rate limit (429) detected for GitLab API request");
                Self::Retryable(detailed_error)
            }
            500..=599 => {
                tracing::warn!("Server error ({}) - will retry: {}", status, detailed_error);
                Self::Retryable(detailed_error)
            }
            _ => {
                tracing::debug!("Non-retryable response ({}): {}", status, detailed_error);
                Self::NonRetryable(detailed_error)
            }
        };
        Some(result)
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Retryable(_))
    }
}

fn body_excerpt(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let trimmed = text.trim();
    match trimmed.char_indices().nth(ERROR_BODY_EXCERPT_LEN) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}

impl std::fmt::Display for ApiRetryableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Retryable(msg) => write!(f, "Retryable error: {}", msg),
            Self::NonRetryable(msg) => write!(f, "Non-retryable error: {}", msg),
        }
    }
}

impl std::error::Error for ApiRetryableError {}

/// Terminal outcome of one logical call
#[derive(Debug, Clone, PartialEq)]
pub enum TransportError {
    /// Every attempt of the retry budget failed
    Exhausted {
        endpoint: String,
        attempts: u32,
        last_error: String,
    },
    /// The host answered with a non-retryable error
    Rejected { endpoint: String, reason: String },
    /// The response did not have the shape the caller asked for
    UnexpectedPayload { endpoint: String, reason: String },
}

impl TransportError {
    pub fn endpoint(&self) -> &str {
        match self {
            Self::Exhausted { endpoint, .. }
            | Self::Rejected { endpoint, .. }
            | Self::UnexpectedPayload { endpoint, .. } => endpoint,
        }
    }
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exhausted {
                endpoint,
                attempts,
                last_error,
            } => write!(
                f,
                "API request failed after {} attempts: {} (last error: {})",
                attempts, endpoint, last_error
            ),
            Self::Rejected { endpoint, reason } => {
                write!(f, "API request rejected: {}: {}", endpoint, reason)
            }
            Self::UnexpectedPayload { endpoint, reason } => {
                write!(f, "Unexpected response from {}: {}", endpoint, reason)
            }
        }
    }
}

impl std::error::Error for TransportError {}
