//! HTTP mocking utilities using wiremock.

use crate::fixtures::RateLimitHeaders;
use serde::Serialize;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

/// HTTP mock server wrapper with convenience methods
pub struct TestHttpServer {
    server: MockServer,
}

impl TestHttpServer {
    /// Start a new mock server
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Get the server URL
    pub fn url(&self) -> String {
        self.server.uri()
    }

    /// Get URL for a specific path
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.server.uri(), path)
    }

    /// Access the underlying MockServer
    pub fn inner(&self) -> &MockServer {
        &self.server
    }

    /// Register an endpoint that returns JSON for the given method
    pub async fn json<T: Serialize>(&self, http_method: &str, endpoint: &str, response: &T) {
        Mock::given(method(http_method))
            .and(path(endpoint))
            .respond_with(ResponseTemplate::new(200).set_body_json(response))
            .mount(&self.server)
            .await;
    }

    /// Register a GET endpoint that returns JSON
    pub async fn get_json<T: Serialize>(&self, endpoint: &str, response: &T) {
        self.json("GET", endpoint, response).await;
    }

    /// Register a POST endpoint that returns JSON
    pub async fn post_json<T: Serialize>(&self, endpoint: &str, response: &T) {
        self.json("POST", endpoint, response).await;
    }

    /// Register a JSON endpoint that also reports rate-limit headers
    pub async fn rate_limited_json<T: Serialize>(
        &self,
        http_method: &str,
        endpoint: &str,
        response: &T,
        headers: &RateLimitHeaders,
    ) {
        Mock::given(method(http_method))
            .and(path(endpoint))
            .respond_with(headers.apply(ResponseTemplate::new(200).set_body_json(response)))
            .mount(&self.server)
            .await;
    }

    /// Register an endpoint that returns an error body
    pub async fn error(&self, endpoint: &str, status: u16, message: &str) {
        Mock::given(path(endpoint))
            .respond_with(
                ResponseTemplate::new(status)
                    .set_body_json(serde_json::json!({ "error": message })),
            )
            .mount(&self.server)
            .await;
    }

    /// Response a throttling server sends once the window is exhausted
    pub fn throttled(headers: &RateLimitHeaders) -> ResponseTemplate {
        headers.apply(
            ResponseTemplate::new(429).set_body_json(serde_json::json!({ "error": "Throttled" })),
        )
    }

    /// Register a sequence of responses, served in order
    pub async fn sequence(&self, endpoint: &str, responses: Vec<ResponseTemplate>) {
        for (i, response) in responses.into_iter().enumerate() {
            Mock::given(path(endpoint))
                .respond_with(response)
                .up_to_n_times(1)
                .with_priority(i as u8 + 1)
                .mount(&self.server)
                .await;
        }
    }

    /// Verify that a request was received
    pub async fn verify_received(&self, endpoint: &str, times: u64) {
        let received = self.received_requests().await;
        let count = received
            .iter()
            .filter(|r| r.url.path() == endpoint)
            .count() as u64;
        assert_eq!(
            count, times,
            "Expected {} requests to {}, got {}",
            times, endpoint, count
        );
    }

    /// Get all received requests
    pub async fn received_requests(&self) -> Vec<Request> {
        self.server.received_requests().await.unwrap_or_default()
    }

    /// Body of the last request received on `endpoint`, as text
    pub async fn last_body(&self, endpoint: &str) -> Option<String> {
        self.received_requests()
            .await
            .into_iter()
            .rev()
            .find(|r| r.url.path() == endpoint)
            .map(|r| String::from_utf8_lossy(&r.body).into_owned())
    }

    /// Clear all mocks and recorded requests
    pub async fn reset(&self) {
        self.server.reset().await;
    }
}
