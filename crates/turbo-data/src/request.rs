//! HTTP request builder.

use std::collections::HashMap;
use std::time::Duration;

use serde::Serialize;

use crate::FetchError;

/// HTTP methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    /// Convert to HTTP method string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }

    pub(crate) fn to_reqwest(self) -> reqwest::Method {
        match self {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// A builder for constructing HTTP requests.
///
/// Query parameters keep their insertion order and may repeat, which the
/// catalog search endpoint relies on for multi-valued `refine` parameters.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    pub(crate) method: Method,
    pub(crate) url: String,
    pub(crate) headers: HashMap<String, String>,
    pub(crate) query: Vec<(String, String)>,
    pub(crate) body: Option<Vec<u8>>,
    pub(crate) timeout: Option<Duration>,
}

impl RequestBuilder {
    /// Create a new request builder.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HashMap::new(),
            query: Vec::new(),
            body: None,
            timeout: None,
        }
    }

    /// Add a header to the request.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Append a query parameter. Repeated keys are preserved.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Append several query parameters in order.
    pub fn query_pairs(mut self, pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        self.query.extend(pairs);
        self
    }

    /// Set the request body as JSON.
    pub fn json<T: Serialize>(mut self, value: &T) -> Result<Self, FetchError> {
        let json = serde_json::to_vec(value)?;
        self.headers
            .insert("Content-Type".to_string(), "application/json".to_string());
        self.body = Some(json);
        Ok(self)
    }

    /// Add a bearer token authorization header.
    pub fn bearer_auth(self, token: impl AsRef<str>) -> Self {
        self.header("Authorization", format!("Bearer {}", token.as_ref()))
    }

    /// Set the Accept header.
    pub fn accept(self, content_type: impl Into<String>) -> Self {
        self.header("Accept", content_type)
    }

    /// Override the client timeout for this request only.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Render the URL with its query string, as it would go on the wire.
    pub fn full_url(&self) -> String {
        if self.query.is_empty() {
            return self.url.clone();
        }
        let qs = self
            .query
            .iter()
            .map(|(k, v)| format!("{}={}", encode_component(k), encode_component(v)))
            .collect::<Vec<_>>()
            .join("&");
        let sep = if self.url.contains('?') { '&' } else { '?' };
        format!("{}{}{}", self.url, sep, qs)
    }

    /// Query parameters in insertion order.
    pub fn query_params(&self) -> &[(String, String)] {
        &self.query
    }
}

fn encode_component(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_query_params_keep_order() {
        let req = RequestBuilder::new(Method::Get, "https://api.example.com/product-search")
            .query("refine", "color=red|blue")
            .query("refine", "size=M")
            .query("limit", "25");

        let keys: Vec<&str> = req.query_params().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["refine", "refine", "limit"]);
    }

    #[test]
    fn test_full_url_encodes_values() {
        let req = RequestBuilder::new(Method::Get, "https://api.example.com/search")
            .query("q", "red shoes")
            .query("refine", "color=red|blue");

        assert_eq!(
            req.full_url(),
            "https://api.example.com/search?q=red%20shoes&refine=color%3Dred%7Cblue"
        );
    }

    #[test]
    fn test_full_url_appends_to_existing_query() {
        let req = RequestBuilder::new(Method::Get, "https://api.example.com/search?siteId=RefArch")
            .query("limit", "25");
        assert_eq!(
            req.full_url(),
            "https://api.example.com/search?siteId=RefArch&limit=25"
        );
    }

    #[test]
    fn test_bearer_auth_header() {
        let req = RequestBuilder::new(Method::Get, "https://api.example.com").bearer_auth("tok");
        assert_eq!(req.headers.get("Authorization").map(String::as_str), Some("Bearer tok"));
    }

    #[test]
    fn test_json_body_sets_content_type() {
        let req = RequestBuilder::new(Method::Post, "https://api.example.com")
            .json(&serde_json::json!({"q": "shoes"}))
            .unwrap();
        assert_eq!(
            req.headers.get("Content-Type").map(String::as_str),
            Some("application/json")
        );
        assert!(req.body.is_some());
    }
}
