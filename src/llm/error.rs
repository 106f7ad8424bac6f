//! Reasoning-service error types with retry classification.
//!
//! Distinguishes transient errors (retry with backoff) from permanent ones
//! (fail the call immediately).

use std::time::Duration;

/// Error from a reasoning-service call.
#[derive(Debug, Clone)]
pub struct ReasoningError {
    /// The kind of error
    pub kind: ReasoningErrorKind,
    /// HTTP status code, if applicable
    pub status_code: Option<u16>,
    /// Error message
    pub message: String,
    /// Suggested retry delay (from Retry-After header, when present)
    pub retry_after: Option<Duration>,
}

impl ReasoningError {
    /// Create a rate limit error.
    pub fn rate_limited(message: impl Into<String>, retry_after: Option<Duration>) -> Self {
        Self {
            kind: ReasoningErrorKind::RateLimited,
            status_code: Some(429),
            message: message.into(),
            retry_after,
        }
    }

    /// Create a server error.
    pub fn server_error(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            kind: ReasoningErrorKind::ServerError,
            status_code: Some(status_code),
            message: message.into(),
            retry_after: None,
        }
    }

    /// Create a client error (bad request, auth, unknown model).
    pub fn client_error(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            kind: ReasoningErrorKind::ClientError,
            status_code: Some(status_code),
            message: message.into(),
            retry_after: None,
        }
    }

    /// Create a network error.
    pub fn network_error(message: impl Into<String>) -> Self {
        Self {
            kind: ReasoningErrorKind::NetworkError,
            status_code: None,
            message: message.into(),
            retry_after: None,
        }
    }

    /// Create a parse error (malformed response body or non-JSON output in JSON mode).
    pub fn parse_error(message: impl Into<String>) -> Self {
        Self {
            kind: ReasoningErrorKind::ParseError,
            status_code: None,
            message: message.into(),
            retry_after: None,
        }
    }

    /// Create a timeout error (the call's wall-clock budget elapsed).
    pub fn timed_out(message: impl Into<String>) -> Self {
        Self {
            kind: ReasoningErrorKind::Timeout,
            status_code: None,
            message: message.into(),
            retry_after: None,
        }
    }

    /// Create a cancellation error (the invocation's token was cancelled mid-call).
    pub fn cancelled(message: impl Into<String>) -> Self {
        Self {
            kind: ReasoningErrorKind::Cancelled,
            status_code: None,
            message: message.into(),
            retry_after: None,
        }
    }

    /// Check if this error is transient and worth retrying.
    pub fn is_transient(&self) -> bool {
        self.kind.is_transient()
    }

    /// Suggested delay before retrying `attempt` (0-based).
    ///
    /// Uses `retry_after` when the provider supplied one, otherwise
    /// exponential backoff with a small deterministic jitter, capped at 60s.
    pub fn suggested_delay(&self, attempt: u32) -> Duration {
        if let Some(retry_after) = self.retry_after {
            return retry_after;
        }

        let base_delay = match self.kind {
            ReasoningErrorKind::RateLimited => Duration::from_secs(5),
            ReasoningErrorKind::ServerError => Duration::from_secs(2),
            _ => Duration::from_secs(1),
        };

        let multiplier = 2u64.saturating_pow(attempt);
        let delay_secs = base_delay.as_secs().saturating_mul(multiplier);

        let jitter_range = delay_secs / 4;
        let jitter = if jitter_range > 0 {
            (attempt as u64 * 7) % jitter_range
        } else {
            0
        };

        Duration::from_secs((delay_secs + jitter).min(60))
    }
}

impl std::fmt::Display for ReasoningError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status_code {
            Some(code) => write!(f, "{} (HTTP {}): {}", self.kind, code, self.message),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for ReasoningError {}

/// Classification of reasoning-service errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReasoningErrorKind {
    /// Rate limited (429) - transient, retry with backoff
    RateLimited,
    /// Server error (500, 502, 503, 504) - transient
    ServerError,
    /// Client error (400, 401, 403, 404) - permanent
    ClientError,
    /// Network error (connection failed, transport timeout) - transient
    NetworkError,
    /// Response parsing error - permanent for this call
    ParseError,
    /// The call's wall-clock budget elapsed - never retried (retrying would
    /// start a fresh call with the budget already spent)
    Timeout,
    /// The invocation was cancelled (agent timeout or pipeline deadline) - never retried
    Cancelled,
}

impl ReasoningErrorKind {
    /// Check if this error kind is transient.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ReasoningErrorKind::RateLimited
                | ReasoningErrorKind::ServerError
                | ReasoningErrorKind::NetworkError
        )
    }
}

impl std::fmt::Display for ReasoningErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReasoningErrorKind::RateLimited => write!(f, "Rate limited"),
            ReasoningErrorKind::ServerError => write!(f, "Server error"),
            ReasoningErrorKind::ClientError => write!(f, "Client error"),
            ReasoningErrorKind::NetworkError => write!(f, "Network error"),
            ReasoningErrorKind::ParseError => write!(f, "Parse error"),
            ReasoningErrorKind::Timeout => write!(f, "Timed out"),
            ReasoningErrorKind::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// Configuration for transport-level retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Maximum total time to spend retrying one call
    pub max_retry_duration: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            max_retry_duration: Duration::from_secs(120),
        }
    }
}

impl RetryConfig {
    /// Check whether the given error should be retried under this config.
    pub fn should_retry(&self, error: &ReasoningError) -> bool {
        error.is_transient()
    }
}

/// Map an HTTP status code to an error kind.
pub fn classify_http_status(status: u16) -> ReasoningErrorKind {
    match status {
        429 => ReasoningErrorKind::RateLimited,
        500 | 502 | 503 | 504 => ReasoningErrorKind::ServerError,
        400..=499 => ReasoningErrorKind::ClientError,
        _ => ReasoningErrorKind::ServerError,
    }
}
