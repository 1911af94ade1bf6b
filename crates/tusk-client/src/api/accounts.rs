//! Accounts, relationships, and the social actions on them.

use super::PageOptions;
use crate::error::{Error, Result};
use crate::params::Params;
use crate::session::Session;
use serde_json::Value;

impl Session {
    pub async fn account(&mut self, id: &str) -> Result<Value> {
        self.get(format!("/api/v1/accounts/{id}"), Params::new()).await
    }

    /// The account the access token belongs to.
    pub async fn account_verify_credentials(&mut self) -> Result<Value> {
        self.get(
            "/api/v1/accounts/verify_credentials".to_string(),
            Params::new(),
        )
        .await
    }

    pub async fn account_statuses(&mut self, id: &str, page: &PageOptions) -> Result<Value> {
        self.get(format!("/api/v1/accounts/{id}/statuses"), page.to_params()?)
            .await
    }

    pub async fn account_followers(&mut self, id: &str, page: &PageOptions) -> Result<Value> {
        self.get(format!("/api/v1/accounts/{id}/followers"), page.to_params()?)
            .await
    }

    pub async fn account_following(&mut self, id: &str, page: &PageOptions) -> Result<Value> {
        self.get(format!("/api/v1/accounts/{id}/following"), page.to_params()?)
            .await
    }

    /// Relationships between the authenticated user and each of `ids`.
    pub async fn account_relationships(&mut self, ids: &[&str]) -> Result<Value> {
        if ids.is_empty() {
            return Err(Error::InvalidArguments(
                "account_relationships needs at least one id".to_string(),
            ));
        }
        let mut params = Params::new();
        params.insert_list("id", ids.iter().copied());
        self.get("/api/v1/accounts/relationships".to_string(), params)
            .await
    }

    pub async fn account_search(&mut self, query: &str, limit: Option<u32>) -> Result<Value> {
        let mut params = Params::new();
        params
            .insert("q", query)
            .insert_opt("limit", limit.map(|l| l.to_string()));
        self.get("/api/v1/accounts/search".to_string(), params).await
    }

    /// Follow a remote account by `user@domain` URI.
    pub async fn follows(&mut self, uri: &str) -> Result<Value> {
        self.post(
            "/api/v1/follows".to_string(),
            Params::new().with("uri", uri),
        )
        .await
    }

    pub async fn account_follow(&mut self, id: &str) -> Result<Value> {
        self.account_action(id, "follow").await
    }

    pub async fn account_unfollow(&mut self, id: &str) -> Result<Value> {
        self.account_action(id, "unfollow").await
    }

    pub async fn account_block(&mut self, id: &str) -> Result<Value> {
        self.account_action(id, "block").await
    }

    pub async fn account_unblock(&mut self, id: &str) -> Result<Value> {
        self.account_action(id, "unblock").await
    }

    pub async fn account_mute(&mut self, id: &str) -> Result<Value> {
        self.account_action(id, "mute").await
    }

    pub async fn account_unmute(&mut self, id: &str) -> Result<Value> {
        self.account_action(id, "unmute").await
    }

    pub async fn follow_request_authorize(&mut self, id: &str) -> Result<Value> {
        self.post(
            format!("/api/v1/follow_requests/{id}/authorize"),
            Params::new(),
        )
        .await
    }

    pub async fn follow_request_reject(&mut self, id: &str) -> Result<Value> {
        self.post(format!("/api/v1/follow_requests/{id}/reject"), Params::new())
            .await
    }

    pub async fn mutes(&mut self, page: &PageOptions) -> Result<Value> {
        self.get("/api/v1/mutes".to_string(), page.to_params()?).await
    }

    pub async fn blocks(&mut self, page: &PageOptions) -> Result<Value> {
        self.get("/api/v1/blocks".to_string(), page.to_params()?).await
    }

    /// Pending requests to follow the authenticated user.
    pub async fn follow_requests(&mut self, page: &PageOptions) -> Result<Value> {
        self.get("/api/v1/follow_requests".to_string(), page.to_params()?)
            .await
    }

    async fn account_action(&mut self, id: &str, action: &str) -> Result<Value> {
        self.post(format!("/api/v1/accounts/{id}/{action}"), Params::new())
            .await
    }
}
