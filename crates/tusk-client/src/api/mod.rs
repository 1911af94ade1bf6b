//! Typed wrappers over the REST endpoints.
//!
//! Each wrapper builds an [`ApiRequest`](crate::ApiRequest) and hands it to
//! [`Session::dispatch`](crate::Session::dispatch). Responses are returned
//! as parsed JSON.

mod accounts;
mod apps;
mod instance;
mod media;
mod notifications;
mod oauth;
mod search;
mod statuses;
mod timelines;

pub use apps::{AppRegistration, DEFAULT_SCOPES, OOB_REDIRECT_URI};
pub use media::{MediaOptions, MediaSource};
pub use oauth::LoginRequest;
pub use statuses::StatusOptions;
pub use timelines::Timeline;

use crate::dispatch::ApiRequest;
use crate::error::Result;
use crate::params::{project_options, Params};
use crate::session::Session;
use serde::Serialize;
use serde_json::Value;

/// Pagination bounds shared by list endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageOptions {
    pub max_id: Option<String>,
    pub min_id: Option<String>,
    pub since_id: Option<String>,
    pub limit: Option<u32>,
}

impl PageOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn max_id(mut self, id: impl Into<String>) -> Self {
        self.max_id = Some(id.into());
        self
    }

    pub fn min_id(mut self, id: impl Into<String>) -> Self {
        self.min_id = Some(id.into());
        self
    }

    pub fn since_id(mut self, id: impl Into<String>) -> Self {
        self.since_id = Some(id.into());
        self
    }

    pub(crate) fn to_params(&self) -> Result<Params> {
        project_options(self, &[])
    }
}

impl Session {
    pub(crate) async fn get(&mut self, endpoint: String, params: Params) -> Result<Value> {
        self.dispatch(&ApiRequest::get(endpoint).params(params)).await
    }

    pub(crate) async fn post(&mut self, endpoint: String, params: Params) -> Result<Value> {
        self.dispatch(&ApiRequest::post(endpoint).params(params)).await
    }

    pub(crate) async fn delete(&mut self, endpoint: String) -> Result<Value> {
        self.dispatch(&ApiRequest::delete(endpoint)).await
    }
}
