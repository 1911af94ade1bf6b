//! Notifications.

use super::PageOptions;
use crate::error::Result;
use crate::params::Params;
use crate::session::Session;
use serde_json::Value;

impl Session {
    pub async fn notifications(&mut self, page: &PageOptions) -> Result<Value> {
        self.get("/api/v1/notifications".to_string(), page.to_params()?)
            .await
    }

    pub async fn notification(&mut self, id: &str) -> Result<Value> {
        self.get(format!("/api/v1/notifications/{id}"), Params::new())
            .await
    }

    /// Delete every notification.
    pub async fn notifications_clear(&mut self) -> Result<Value> {
        self.post("/api/v1/notifications/clear".to_string(), Params::new())
            .await
    }

    /// Delete one notification.
    pub async fn notifications_dismiss(&mut self, id: &str) -> Result<Value> {
        self.post(
            "/api/v1/notifications/dismiss".to_string(),
            Params::new().with("id", id),
        )
        .await
    }
}
