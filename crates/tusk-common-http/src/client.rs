//! HTTP client configuration and the `reqwest` transport.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, ClientBuilder};
use std::time::Duration;

use crate::request::{headers, Attachment, RequestBody, TransportRequest};
use crate::response::TransportResponse;
use crate::Transport;

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Default request timeout, overridden per request by the session.
    pub request_timeout: Duration,
    /// User agent string.
    pub user_agent: String,
    /// Maximum idle connections per host.
    pub pool_max_idle_per_host: usize,
    /// Enable gzip decompression.
    pub gzip: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(300),
            user_agent: format!("tusk/{}", env!("CARGO_PKG_VERSION")),
            pool_max_idle_per_host: 10,
            gzip: true,
        }
    }
}

/// Build a configured HTTP client.
pub fn build_client(config: HttpConfig) -> Result<Client, HttpError> {
    let mut builder = ClientBuilder::new()
        .connect_timeout(config.connect_timeout)
        .timeout(config.request_timeout)
        .user_agent(&config.user_agent)
        .pool_max_idle_per_host(config.pool_max_idle_per_host);

    if config.gzip {
        builder = builder.gzip(true);
    }

    builder.build().map_err(HttpError::ClientBuild)
}

/// HTTP errors.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("request timed out")]
    Timeout,

    #[error("invalid attachment {file_name}: {source}")]
    Attachment {
        file_name: String,
        #[source]
        source: reqwest::Error,
    },
}

impl From<reqwest::Error> for HttpError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            HttpError::Timeout
        } else {
            HttpError::Request(e)
        }
    }
}

/// Shared HTTP client.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client,
}

impl HttpClient {
    /// Create a new HTTP client with default config.
    pub fn new() -> Result<Self, HttpError> {
        Self::with_config(HttpConfig::default())
    }

    /// Create a new HTTP client with custom config.
    pub fn with_config(config: HttpConfig) -> Result<Self, HttpError> {
        let inner = build_client(config)?;
        Ok(Self { inner })
    }

    /// Get the inner reqwest client.
    pub fn inner(&self) -> &Client {
        &self.inner
    }
}

fn multipart_form(
    fields: Vec<(String, String)>,
    attachments: Vec<Attachment>,
) -> Result<Form, HttpError> {
    let mut form = Form::new();
    for (name, value) in fields {
        form = form.text(name, value);
    }
    for attachment in attachments {
        let Attachment {
            field,
            file_name,
            mime_type,
            data,
        } = attachment;
        let part = Part::bytes(data)
            .file_name(file_name.clone())
            .mime_str(&mime_type)
            .map_err(|source| HttpError::Attachment { file_name, source })?;
        form = form.part(field, part);
    }
    Ok(form)
}

#[async_trait]
impl Transport for HttpClient {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, HttpError> {
        let TransportRequest {
            method,
            url,
            body,
            headers: header_map,
            timeout,
        } = request;

        tracing::debug!("Making {} request to: {}", method, url);
        let mut builder = self
            .inner
            .request(method.clone(), &url)
            .headers(header_map)
            .timeout(timeout);

        builder = match body {
            RequestBody::Empty => builder,
            RequestBody::Form(encoded) => builder
                .header(CONTENT_TYPE, headers::CONTENT_TYPE_FORM)
                .body(encoded),
            RequestBody::Multipart {
                fields,
                attachments,
            } => builder.multipart(multipart_form(fields, attachments)?),
        };

        let response = builder.send().await.map_err(HttpError::from)?;
        let status = response.status().as_u16();
        let response_headers = response.headers().clone();
        let body = response.bytes().await.map_err(HttpError::from)?;
        tracing::debug!("{} response: {} {}", method, status, url);

        Ok(TransportResponse {
            status,
            headers: response_headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_default_config() {
        let config = HttpConfig::default();
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.request_timeout, Duration::from_secs(300));
        assert!(config.user_agent.starts_with("tusk/"));
        assert_eq!(config.pool_max_idle_per_host, 10);
        assert!(config.gzip);
    }

    #[test]
    fn test_client_creation() {
        let client = HttpClient::new();
        assert!(client.is_ok());
    }

    #[test]
    fn test_client_with_custom_config() {
        let config = HttpConfig {
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(15),
            user_agent: "test-agent".to_string(),
            pool_max_idle_per_host: 5,
            gzip: false,
        };

        let client = HttpClient::with_config(config);
        assert!(client.is_ok());
    }

    #[test]
    fn test_multipart_rejects_bad_mime() {
        let attachment = Attachment {
            field: "file".to_string(),
            file_name: "upload.bin".to_string(),
            mime_type: "not a mime type".to_string(),
            data: vec![1, 2, 3],
        };
        let err = multipart_form(vec![], vec![attachment]).unwrap_err();
        assert!(matches!(err, HttpError::Attachment { .. }));
        assert!(err.to_string().contains("upload.bin"));
    }
}
