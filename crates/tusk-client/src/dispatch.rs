//! The request dispatcher.
//!
//! Every API call funnels through [`Session::dispatch`], which paces the
//! call, sends it, maps HTTP failures onto [`Error`], refreshes the
//! rate-limit window, and resubmits throttled calls when the session's
//! policy allows it.

use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::params::Params;
use crate::ratelimit::MAX_SLEEP;
use crate::session::Session;
use reqwest::header::HeaderMap;
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tusk_common_http::{
    form, Attachment, RequestBody, RequestBuilder, Transport, TransportRequest, TransportResponse,
};
use tusk_common_log::spans::{instrument_future, record_error, request_span, Timer};

/// HTTP methods the API is called with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
        }
    }

    fn to_reqwest(self) -> reqwest::Method {
        match self {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

impl FromStr for HttpMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "DELETE" => Ok(HttpMethod::Delete),
            _ => Err(Error::InvalidMethod(s.to_string())),
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One API call, before it is sent.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub endpoint: String,
    pub params: Params,
    pub attachments: Vec<Attachment>,
    /// Whether the call counts against the rate limit.
    pub rate_limited: bool,
}

impl ApiRequest {
    pub fn new(method: HttpMethod, endpoint: impl Into<String>) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            params: Params::new(),
            attachments: Vec::new(),
            rate_limited: true,
        }
    }

    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, endpoint)
    }

    pub fn post(endpoint: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, endpoint)
    }

    pub fn delete(endpoint: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, endpoint)
    }

    pub fn params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    pub fn attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Exempt the call from rate-limit accounting.
    pub fn unmetered(mut self) -> Self {
        self.rate_limited = false;
        self
    }
}

/// Outcome of one pass through the dispatcher.
#[derive(Debug)]
pub(crate) enum Attempt {
    Completed(Value),
    Retry(Duration),
    Failed(Error),
}

/// Build the transport request for `request` against `base_url`.
pub(crate) fn transport_request(
    base_url: &str,
    request: &ApiRequest,
    headers: HeaderMap,
    timeout: Duration,
) -> TransportRequest {
    let url = RequestBuilder::new().base_url(base_url).url(&request.endpoint);
    let pairs = request.params.to_pairs();

    let (url, body) = if !request.attachments.is_empty() {
        (
            url,
            RequestBody::Multipart {
                fields: pairs,
                attachments: request.attachments.clone(),
            },
        )
    } else if pairs.is_empty() {
        (url, RequestBody::Empty)
    } else if request.method == HttpMethod::Get {
        (format!("{url}?{}", form::encode_pairs(pairs)), RequestBody::Empty)
    } else {
        (url, RequestBody::Form(form::encode_pairs(pairs)))
    };

    TransportRequest {
        method: request.method.to_reqwest(),
        url,
        body,
        headers,
        timeout,
    }
}

/// Map a raw response to parsed JSON, failing on statuses the API treats as fatal.
pub(crate) fn interpret(endpoint: &str, response: &TransportResponse) -> Result<Value> {
    match response.status {
        404 => {
            return Err(Error::NotFound {
                endpoint: endpoint.to_string(),
            })
        }
        500 => {
            return Err(Error::ServerError {
                endpoint: endpoint.to_string(),
            })
        }
        _ => {}
    }

    if response.body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Map::new()));
    }

    match serde_json::from_slice(&response.body) {
        Ok(value) => Ok(value),
        // A 429 is a throttle signal whatever its body looks like.
        Err(_) if response.status == 429 => Ok(Value::Object(Map::new())),
        Err(_) => Err(Error::MalformedResponse {
            status: response.status,
            body: response.text(),
        }),
    }
}

pub(crate) fn is_throttled(status: u16, body: &Value) -> bool {
    status == 429 || body.get("error").and_then(Value::as_str) == Some("Throttled")
}

pub(crate) fn api_error(status: u16, body: &Value) -> Option<Error> {
    if (200..300).contains(&status) {
        return None;
    }
    let message = body.get("error").and_then(Value::as_str)?;
    Some(Error::Api {
        status,
        message: message.to_string(),
    })
}

/// Send a call outside any session: no pacing, no retry.
///
/// A throttled response fails with a reset time of `clock.now()`.
pub(crate) async fn send_once(
    transport: &dyn Transport,
    clock: &dyn Clock,
    base_url: &str,
    request: &ApiRequest,
    headers: HeaderMap,
    timeout: Duration,
) -> Result<Value> {
    let response = transport
        .send(transport_request(base_url, request, headers, timeout))
        .await?;
    let body = interpret(&request.endpoint, &response)?;
    if is_throttled(response.status, &body) {
        return Err(Error::RateLimited {
            reset_at: clock.now(),
        });
    }
    match api_error(response.status, &body) {
        Some(error) => Err(error),
        None => Ok(body),
    }
}

impl Session {
    /// Send one API call, honouring the session's rate-limit policy.
    pub async fn dispatch(&mut self, request: &ApiRequest) -> Result<Value> {
        let span = request_span(request.method.as_str(), &request.endpoint);
        let timer = Timer::start("api_request");
        let result = instrument_future(self.dispatch_loop(request), span).await;
        timer.finish();
        result
    }

    /// Call an endpoint that has no typed wrapper.
    ///
    /// `method` must be GET, POST or DELETE (any case).
    pub async fn request(&mut self, method: &str, endpoint: &str, params: Params) -> Result<Value> {
        let method: HttpMethod = method.parse()?;
        self.dispatch(&ApiRequest::new(method, endpoint).params(params))
            .await
    }

    async fn dispatch_loop(&mut self, request: &ApiRequest) -> Result<Value> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            tracing::Span::current().record("attempt", attempt);

            if request.rate_limited {
                self.pace().await;
            }

            match self.attempt(request).await {
                Attempt::Completed(value) => return Ok(value),
                Attempt::Failed(error) => {
                    record_error(&error);
                    tracing::debug!(error = %error, "request failed");
                    return Err(error);
                }
                Attempt::Retry(wait) => {
                    tracing::warn!(
                        wait_ms = wait.as_millis() as u64,
                        reset_at = %self.window.reset_at,
                        "throttled, waiting for rate limit reset"
                    );
                    self.clock.sleep(wait).await;
                }
            }
        }
    }

    /// Sleep as the policy requires before the next call.
    async fn pace(&mut self) {
        loop {
            let wait = self
                .policy
                .pre_call_wait(&self.window, self.pace_factor, self.clock.now());
            if wait.is_zero() {
                return;
            }
            if self.window.remaining == 0 {
                tracing::warn!(
                    wait_ms = wait.as_millis() as u64,
                    "rate limit exhausted, waiting for reset"
                );
            } else {
                tracing::debug!(wait_ms = wait.as_millis() as u64, "pacing request");
            }
            self.clock.sleep(wait).await;
            if wait < MAX_SLEEP {
                return;
            }
        }
    }

    fn headers(&self) -> HeaderMap {
        let mut builder = RequestBuilder::new().user_agent(&self.user_agent);
        if let Some(token) = &self.access_token {
            builder = builder.bearer_auth(token.expose());
        }
        builder.into_headers()
    }

    async fn attempt(&mut self, request: &ApiRequest) -> Attempt {
        if request.rate_limited {
            self.window.last_call_at = self.clock.now();
        }

        let outgoing = transport_request(&self.base_url, request, self.headers(), self.request_timeout);
        tracing::debug!(url = %outgoing.url, "dispatching");

        let response = match self.transport.send(outgoing).await {
            Ok(response) => response,
            Err(e) => return Attempt::Failed(Error::Transport(e)),
        };
        tracing::debug!(status = response.status, "response received");

        let body = match interpret(&request.endpoint, &response) {
            Ok(body) => body,
            Err(e) => return Attempt::Failed(e),
        };

        if request.rate_limited {
            if let Err(e) = self
                .window
                .update_from_headers(&response.headers, self.clock.now())
            {
                return Attempt::Failed(e);
            }
        }

        if is_throttled(response.status, &body) {
            return match self.policy.throttle_wait(&self.window, self.clock.now()) {
                Some(wait) => Attempt::Retry(wait),
                None => Attempt::Failed(Error::RateLimited {
                    reset_at: self.window.reset_at,
                }),
            };
        }

        if let Some(error) = api_error(response.status, &body) {
            return Attempt::Failed(error);
        }

        Attempt::Completed(body)
    }
}
