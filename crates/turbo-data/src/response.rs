//! HTTP response handling.

use std::collections::HashMap;

use serde::de::DeserializeOwned;

use crate::FetchError;

/// A fully buffered HTTP response.
#[derive(Debug, Clone)]
pub struct Response {
    /// The HTTP status code.
    pub status: u16,
    /// The response headers, names lowercased.
    pub headers: HashMap<String, String>,
    /// The response body.
    pub body: Vec<u8>,
}

impl Response {
    /// Create a new response.
    pub fn new(status: u16, headers: HashMap<String, String>, body: Vec<u8>) -> Self {
        let headers = headers
            .into_iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v))
            .collect();
        Self {
            status,
            headers,
            body,
        }
    }

    /// Check if the response was successful (2xx status).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Check if the response was a client error (4xx status).
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }

    /// Check if the response was a server error (5xx status).
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }

    /// Get the response body as text.
    pub fn text(&self) -> Result<String, FetchError> {
        String::from_utf8(self.body.clone())
            .map_err(|e| FetchError::ParseError(format!("Invalid UTF-8: {}", e)))
    }

    /// Parse the response body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, FetchError> {
        serde_json::from_slice(&self.body).map_err(|e| FetchError::ParseError(e.to_string()))
    }

    /// Get a header value (case-insensitive).
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .get(&key.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Convert to a Result, returning an error for non-2xx status codes.
    ///
    /// The error message is the body text, truncated so a large HTML error
    /// page does not end up verbatim in logs.
    pub fn error_for_status(self) -> Result<Self, FetchError> {
        if self.is_success() {
            return Ok(self);
        }
        let mut message = self.text().unwrap_or_else(|_| "Unknown error".to_string());
        if message.len() > 256 {
            let cut = (0..=256).rev().find(|i| message.is_char_boundary(*i)).unwrap_or(0);
            message.truncate(cut);
        }
        Err(FetchError::HttpError {
            status: self.status,
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_response(status: u16, body: &[u8]) -> Response {
        Response::new(status, HashMap::new(), body.to_vec())
    }

    #[test]
    fn test_status_classes() {
        assert!(make_response(200, b"").is_success());
        assert!(!make_response(304, b"").is_success());
        assert!(make_response(400, b"").is_client_error());
        assert!(make_response(503, b"").is_server_error());
        assert!(!make_response(503, b"").is_client_error());
    }

    #[test]
    fn test_json_search_payload() {
        use serde::Deserialize;

        #[derive(Deserialize, Debug, PartialEq)]
        struct Page {
            total: u32,
            offset: u32,
        }

        let resp = make_response(200, br#"{"total": 100, "offset": 25, "limit": 25}"#);
        let page: Page = resp.json().unwrap();
        assert_eq!(page, Page { total: 100, offset: 25 });
    }

    #[test]
    fn test_json_invalid_is_parse_error() {
        let resp = make_response(200, b"<html>maintenance</html>");
        let result: Result<serde_json::Value, _> = resp.json();
        assert!(matches!(result, Err(FetchError::ParseError(_))));
    }

    #[test]
    fn test_text_invalid_utf8() {
        let resp = make_response(200, &[0xff, 0xfe]);
        assert!(resp.text().is_err());
    }

    #[test]
    fn test_header_case_insensitive() {
        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        let resp = Response::new(200, headers, Vec::new());
        assert_eq!(resp.header("content-type"), Some("application/json"));
        assert_eq!(resp.header("CONTENT-TYPE"), Some("application/json"));
        assert_eq!(resp.header("x-missing"), None);
    }

    #[test]
    fn test_error_for_status_keeps_status() {
        let err = make_response(400, br#"{"title":"Invalid Refinement"}"#)
            .error_for_status()
            .unwrap_err();
        assert_eq!(err.status(), Some(400));
    }

    #[test]
    fn test_error_for_status_truncates_long_bodies() {
        let body = "x".repeat(1000);
        match make_response(502, body.as_bytes()).error_for_status() {
            Err(FetchError::HttpError { status, message }) => {
                assert_eq!(status, 502);
                assert_eq!(message.len(), 256);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_error_for_status_success_passthrough() {
        assert!(make_response(200, b"{}").error_for_status().is_ok());
    }
}
