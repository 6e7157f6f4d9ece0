//! Search error types.

use thiserror::Error;
use turbo_data::FetchError;

/// Failure of a catalog search operation.
///
/// `Clone` so that one shared in-flight fetch can hand the same outcome to
/// every waiter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// The backend rejected the request (4xx). User-correctable, never retried.
    #[error("Invalid search parameters{}: {}", status_suffix(.status), .message)]
    InvalidParameter {
        status: Option<u16>,
        message: String,
    },

    /// Network failure, timeout or 5xx. Retried with backoff by the session.
    #[error("Temporary search failure{}: {}", status_suffix(.status), .message)]
    Transient {
        status: Option<u16>,
        message: String,
    },

    /// The payload did not match the expected schema.
    #[error("Malformed search response: {0}")]
    MalformedResponse(String),

    /// The response belongs to a search state that is no longer current.
    #[error("Search response superseded by newer parameters")]
    Stale,
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default()
}

impl SearchError {
    /// Create a malformed-response error.
    pub fn malformed(message: impl Into<String>) -> Self {
        SearchError::MalformedResponse(message.into())
    }

    /// Whether the UI should ever show this error.
    pub fn is_user_visible(&self) -> bool {
        !matches!(self, SearchError::Stale)
    }

    /// Whether the failure is worth another attempt at all.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SearchError::Transient { .. } | SearchError::MalformedResponse(_)
        )
    }
}

impl From<FetchError> for SearchError {
    fn from(e: FetchError) -> Self {
        match e {
            // Request timeout and rate limiting are 4xx but clear up on their own.
            FetchError::HttpError { status, message } if status == 408 || status == 429 => {
                SearchError::Transient {
                    status: Some(status),
                    message,
                }
            }
            FetchError::HttpError { status, message } if (400..500).contains(&status) => {
                SearchError::InvalidParameter {
                    status: Some(status),
                    message,
                }
            }
            FetchError::HttpError { status, message } => SearchError::Transient {
                status: Some(status),
                message,
            },
            FetchError::Timeout => SearchError::Transient {
                status: None,
                message: "request timed out".to_string(),
            },
            FetchError::Connection(message) | FetchError::RequestError(message) => {
                SearchError::Transient {
                    status: None,
                    message,
                }
            }
            FetchError::InvalidUrl(message) => SearchError::InvalidParameter {
                status: None,
                message,
            },
            FetchError::ParseError(message) | FetchError::JsonError(message) => {
                SearchError::MalformedResponse(message)
            }
        }
    }
}

impl From<serde_json::Error> for SearchError {
    fn from(e: serde_json::Error) -> Self {
        SearchError::MalformedResponse(e.to_string())
    }
}

/// Errors raised while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file.
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse the config file.
    #[error("Failed to parse config {path}: {message}")]
    Parse { path: String, message: String },

    /// A value is out of range or missing.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http(status: u16) -> FetchError {
        FetchError::HttpError {
            status,
            message: "boom".to_string(),
        }
    }

    #[test]
    fn test_client_errors_are_invalid_parameters() {
        let err: SearchError = http(400).into();
        assert!(matches!(err, SearchError::InvalidParameter { status: Some(400), .. }));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_server_errors_are_transient() {
        let err: SearchError = http(503).into();
        assert!(matches!(err, SearchError::Transient { status: Some(503), .. }));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_rate_limit_is_transient() {
        assert!(SearchError::from(http(429)).is_retryable());
        assert!(SearchError::from(http(408)).is_retryable());
    }

    #[test]
    fn test_timeout_and_parse_mapping() {
        assert!(matches!(
            SearchError::from(FetchError::Timeout),
            SearchError::Transient { status: None, .. }
        ));
        assert!(matches!(
            SearchError::from(FetchError::ParseError("eof".into())),
            SearchError::MalformedResponse(_)
        ));
    }

    #[test]
    fn test_dropped_connection_is_transient() {
        let err = SearchError::from(FetchError::Connection(
            "connection closed before message completed".into(),
        ));
        assert!(matches!(err, SearchError::Transient { status: None, .. }));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_stale_is_hidden() {
        assert!(!SearchError::Stale.is_user_visible());
        assert!(SearchError::malformed("x").is_user_visible());
    }

    #[test]
    fn test_display_includes_status() {
        let err: SearchError = http(400).into();
        assert_eq!(err.to_string(), "Invalid search parameters (HTTP 400): boom");
    }
}
