//! HTTP client error types.

use thiserror::Error;

/// Errors that can occur when making HTTP requests.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Failed to send the request.
    #[error("Request failed: {0}")]
    RequestError(String),

    /// Could not reach the remote host.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// HTTP error response.
    #[error("HTTP {status}: {message}")]
    HttpError { status: u16, message: String },

    /// Failed to parse response body.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Request timeout.
    #[error("Request timed out")]
    Timeout,

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(String),
}

impl FetchError {
    /// HTTP status carried by the error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::HttpError { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        FetchError::JsonError(e.to_string())
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        TransportFailure::of(&e).into_error(e.to_string())
    }
}

/// Failure class of a `reqwest` error, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TransportFailure {
    Timeout,
    Connect,
    Builder,
    /// The connection failed while the body was being read.
    Body,
    Decode,
    Other,
}

impl TransportFailure {
    fn of(e: &reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_connect() {
            Self::Connect
        } else if e.is_builder() {
            Self::Builder
        } else if e.is_body() {
            Self::Body
        } else if e.is_decode() {
            Self::Decode
        } else {
            Self::Other
        }
    }

    fn into_error(self, message: String) -> FetchError {
        match self {
            Self::Timeout => FetchError::Timeout,
            Self::Connect | Self::Body => FetchError::Connection(message),
            Self::Builder => FetchError::InvalidUrl(message),
            Self::Decode => FetchError::ParseError(message),
            Self::Other => FetchError::RequestError(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_failure_is_connection_error() {
        let err = TransportFailure::Body.into_error("connection closed before message completed".into());
        assert!(matches!(err, FetchError::Connection(_)));
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_decode_failure_stays_parse_error() {
        let err = TransportFailure::Decode.into_error("invalid gzip header".into());
        assert!(matches!(err, FetchError::ParseError(_)));
    }

    #[test]
    fn test_transport_failure_mapping() {
        assert!(matches!(TransportFailure::Timeout.into_error(String::new()), FetchError::Timeout));
        assert!(matches!(
            TransportFailure::Connect.into_error("refused".into()),
            FetchError::Connection(_)
        ));
        assert!(matches!(
            TransportFailure::Builder.into_error("bad url".into()),
            FetchError::InvalidUrl(_)
        ));
        assert!(matches!(
            TransportFailure::Other.into_error("reset".into()),
            FetchError::RequestError(_)
        ));
    }
}
