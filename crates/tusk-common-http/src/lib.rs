//! HTTP transport utilities for Tusk.
//!
//! The client crate never talks to `reqwest` directly: every exchange goes
//! through the [`Transport`] trait, which [`HttpClient`] implements.

pub mod client;
pub mod form;
pub mod request;
pub mod response;

pub use client::{build_client, HttpClient, HttpConfig, HttpError};
pub use request::{headers, Attachment, RequestBody, RequestBuilder, TransportRequest};
pub use response::TransportResponse;

use async_trait::async_trait;

/// Something that can carry one HTTP exchange.
///
/// Implementations perform exactly one attempt: retries and rate-limit
/// handling belong to the caller.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request and return the raw response.
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, HttpError>;
}
