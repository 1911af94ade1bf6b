//! Statuses: reading, posting, and per-status actions.

use super::PageOptions;
use crate::error::{Error, Result};
use crate::params::{scalar_text, Params};
use crate::session::Session;
use serde_json::Value;

const VISIBILITIES: &[&str] = &["private", "public", "unlisted"];

/// Optional fields for [`Session::status_post`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusOptions {
    pub in_reply_to_id: Option<String>,
    /// Media ids, or media objects as returned by [`Session::media_post`].
    pub media_ids: Vec<Value>,
    pub sensitive: Option<bool>,
    pub visibility: Option<String>,
    pub spoiler_text: Option<String>,
    pub language: Option<String>,
}

impl StatusOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_reply_to(mut self, id: impl Into<String>) -> Self {
        self.in_reply_to_id = Some(id.into());
        self
    }

    pub fn media(mut self, media: impl Into<Value>) -> Self {
        self.media_ids.push(media.into());
        self
    }

    pub fn sensitive(mut self, sensitive: bool) -> Self {
        self.sensitive = Some(sensitive);
        self
    }

    pub fn visibility(mut self, visibility: impl Into<String>) -> Self {
        self.visibility = Some(visibility.into());
        self
    }

    pub fn spoiler_text(mut self, text: impl Into<String>) -> Self {
        self.spoiler_text = Some(text.into());
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    fn to_params(&self, status: &str) -> Result<Params> {
        let mut params = Params::new();
        params
            .insert("status", status)
            .insert_opt("in_reply_to_id", self.in_reply_to_id.as_deref())
            .insert_opt("sensitive", self.sensitive.map(|s| s.to_string()))
            .insert_opt("spoiler_text", self.spoiler_text.as_deref())
            .insert_opt("language", self.language.as_deref());

        if let Some(visibility) = &self.visibility {
            params.insert_opt("visibility", normalize_visibility(visibility)?);
        }
        if !self.media_ids.is_empty() {
            let ids = self
                .media_ids
                .iter()
                .map(media_id)
                .collect::<Result<Vec<_>>>()?;
            params.insert_list("media_ids", ids);
        }
        Ok(params)
    }
}

/// Lower-case and check a visibility; empty means "server default".
fn normalize_visibility(visibility: &str) -> Result<Option<String>> {
    let lowered = visibility.trim().to_lowercase();
    if lowered.is_empty() {
        return Ok(None);
    }
    if VISIBILITIES.contains(&lowered.as_str()) {
        Ok(Some(lowered))
    } else {
        Err(Error::InvalidVisibility(visibility.to_string()))
    }
}

/// A media object contributes its `id`; anything else is taken as the id.
fn media_id(value: &Value) -> Result<String> {
    match value {
        Value::Object(map) => map
            .get("id")
            .filter(|id| !id.is_null())
            .map(scalar_text)
            .ok_or_else(|| Error::InvalidArguments("media object has no id".to_string())),
        Value::Null => Err(Error::InvalidArguments("media id must not be null".to_string())),
        other => Ok(scalar_text(other)),
    }
}

impl Session {
    pub async fn status(&mut self, id: &str) -> Result<Value> {
        self.get(format!("/api/v1/statuses/{id}"), Params::new()).await
    }

    /// Ancestors and descendants of a status.
    pub async fn status_context(&mut self, id: &str) -> Result<Value> {
        self.get(format!("/api/v1/statuses/{id}/context"), Params::new())
            .await
    }

    pub async fn status_card(&mut self, id: &str) -> Result<Value> {
        self.get(format!("/api/v1/statuses/{id}/card"), Params::new())
            .await
    }

    pub async fn status_reblogged_by(&mut self, id: &str) -> Result<Value> {
        self.get(format!("/api/v1/statuses/{id}/reblogged_by"), Params::new())
            .await
    }

    pub async fn status_favourited_by(&mut self, id: &str) -> Result<Value> {
        self.get(format!("/api/v1/statuses/{id}/favourited_by"), Params::new())
            .await
    }

    /// Alias of [`Session::status_favourited_by`].
    pub async fn status_favorited_by(&mut self, id: &str) -> Result<Value> {
        self.status_favourited_by(id).await
    }

    /// Post a new status.
    ///
    /// `visibility` is one of `public`, `unlisted` or `private`, in any
    /// case; an empty string leaves it to the server.
    pub async fn status_post(&mut self, status: &str, options: &StatusOptions) -> Result<Value> {
        let params = options.to_params(status)?;
        self.post("/api/v1/statuses".to_string(), params).await
    }

    /// Post a status with default options.
    pub async fn toot(&mut self, status: &str) -> Result<Value> {
        self.status_post(status, &StatusOptions::default()).await
    }

    pub async fn status_delete(&mut self, id: &str) -> Result<Value> {
        self.delete(format!("/api/v1/statuses/{id}")).await
    }

    pub async fn status_reblog(&mut self, id: &str) -> Result<Value> {
        self.status_action(id, "reblog").await
    }

    pub async fn status_unreblog(&mut self, id: &str) -> Result<Value> {
        self.status_action(id, "unreblog").await
    }

    pub async fn status_favourite(&mut self, id: &str) -> Result<Value> {
        self.status_action(id, "favourite").await
    }

    pub async fn status_unfavourite(&mut self, id: &str) -> Result<Value> {
        self.status_action(id, "unfavourite").await
    }

    /// Stop notifications for the thread containing `id`.
    pub async fn status_mute(&mut self, id: &str) -> Result<Value> {
        self.status_action(id, "mute").await
    }

    pub async fn status_unmute(&mut self, id: &str) -> Result<Value> {
        self.status_action(id, "unmute").await
    }

    /// Statuses the authenticated user has favourited.
    pub async fn favourites(&mut self, page: &PageOptions) -> Result<Value> {
        self.get("/api/v1/favourites".to_string(), page.to_params()?)
            .await
    }

    async fn status_action(&mut self, id: &str, action: &str) -> Result<Value> {
        self.post(format!("/api/v1/statuses/{id}/{action}"), Params::new())
            .await
    }
}
