//! HTTP request types and builders.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, USER_AGENT};
use reqwest::Method;
use std::time::Duration;

/// Common HTTP headers.
pub mod headers {
    pub const CONTENT_TYPE_FORM: &str = "application/x-www-form-urlencoded";
    pub const X_RATELIMIT_LIMIT: &str = "x-ratelimit-limit";
    pub const X_RATELIMIT_REMAINING: &str = "x-ratelimit-remaining";
    pub const X_RATELIMIT_RESET: &str = "x-ratelimit-reset";
    pub const DATE: &str = "date";
}

/// A file sent as one part of a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Form field name.
    pub field: String,
    /// File name reported to the server.
    pub file_name: String,
    /// MIME type of the payload.
    pub mime_type: String,
    /// Raw file contents.
    pub data: Vec<u8>,
}

/// Request body as handed to a transport.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RequestBody {
    /// No body.
    #[default]
    Empty,
    /// An already form-encoded body.
    Form(String),
    /// Text fields plus file attachments.
    Multipart {
        fields: Vec<(String, String)>,
        attachments: Vec<Attachment>,
    },
}

/// Everything a transport needs to perform one exchange.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    pub url: String,
    pub body: RequestBody,
    pub headers: HeaderMap,
    pub timeout: Duration,
}

/// A request header builder with common patterns.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    headers: HeaderMap,
    base_url: Option<String>,
}

impl RequestBuilder {
    /// Create a new request builder.
    pub fn new() -> Self {
        Self {
            headers: HeaderMap::new(),
            base_url: None,
        }
    }

    /// Set the base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Add a header. Invalid names or values are skipped.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::try_from(name.as_ref()),
            HeaderValue::try_from(value.as_ref()),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Add bearer token authorization.
    pub fn bearer_auth(mut self, token: impl AsRef<str>) -> Self {
        if let Ok(mut value) = HeaderValue::try_from(format!("Bearer {}", token.as_ref())) {
            value.set_sensitive(true);
            self.headers.insert(AUTHORIZATION, value);
        }
        self
    }

    /// Set the user agent.
    pub fn user_agent(self, agent: impl AsRef<str>) -> Self {
        self.header(USER_AGENT.as_str(), agent)
    }

    /// Get the built headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Consume the builder, returning the headers.
    pub fn into_headers(self) -> HeaderMap {
        self.headers
    }

    /// Build the URL.
    pub fn url(&self, path: &str) -> String {
        match &self.base_url {
            Some(base) => format!("{}{}", base.trim_end_matches('/'), path),
            None => path.to_string(),
        }
    }
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder_url() {
        let builder = RequestBuilder::new().base_url("https://social.example");
        assert_eq!(
            builder.url("/api/v1/statuses"),
            "https://social.example/api/v1/statuses"
        );
    }

    #[test]
    fn test_request_builder_url_trailing_slash() {
        let builder = RequestBuilder::new().base_url("https://social.example/");
        assert_eq!(
            builder.url("/api/v1/statuses"),
            "https://social.example/api/v1/statuses"
        );
    }

    #[test]
    fn test_request_builder_no_base_url() {
        let builder = RequestBuilder::new();
        assert_eq!(builder.url("/api/v1/test"), "/api/v1/test");
    }

    #[test]
    fn test_bearer_auth() {
        let builder = RequestBuilder::new().bearer_auth("token123");
        let auth = builder.headers().get(AUTHORIZATION).unwrap();
        assert_eq!(auth.to_str().unwrap(), "Bearer token123");
        assert!(auth.is_sensitive());
    }

    #[test]
    fn test_user_agent() {
        let builder = RequestBuilder::new().user_agent("tusk/0.1.0");
        let agent = builder.headers().get(USER_AGENT).unwrap();
        assert_eq!(agent.to_str().unwrap(), "tusk/0.1.0");
    }

    #[test]
    fn test_invalid_header_is_skipped() {
        let builder = RequestBuilder::new().header("bad header", "value");
        assert!(builder.headers().is_empty());
    }

    #[test]
    fn test_builder_chaining() {
        let builder = RequestBuilder::new()
            .base_url("https://social.example")
            .bearer_auth("token")
            .header("Custom", "value");

        assert_eq!(builder.url("/test"), "https://social.example/test");
        assert!(builder.headers().contains_key(AUTHORIZATION));
        assert!(builder.headers().contains_key("Custom"));
        assert_eq!(builder.into_headers().len(), 2);
    }

    #[test]
    fn test_request_body_default_is_empty() {
        assert_eq!(RequestBody::default(), RequestBody::Empty);
    }
}
