//! Media uploads.

use crate::dispatch::ApiRequest;
use crate::error::{Error, Result};
use crate::mime;
use crate::params::Params;
use crate::session::Session;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tusk_common_http::Attachment;

/// Where the bytes of an upload come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSource {
    Path(PathBuf),
    /// In-memory data. `file_name` only helps guess the MIME type.
    Bytes {
        data: Vec<u8>,
        file_name: Option<String>,
    },
}

impl MediaSource {
    fn guess_mime(&self) -> Option<String> {
        match self {
            MediaSource::Path(path) => mime::guess_from_path(path),
            MediaSource::Bytes { file_name, .. } => file_name
                .as_deref()
                .and_then(|name| mime::guess_from_path(Path::new(name))),
        }
    }

    async fn into_data(self) -> Result<Vec<u8>> {
        match self {
            MediaSource::Path(path) => tokio::fs::read(&path)
                .await
                .map_err(|e| Error::io(path, e)),
            MediaSource::Bytes { data, .. } => Ok(data),
        }
    }
}

impl From<PathBuf> for MediaSource {
    fn from(path: PathBuf) -> Self {
        MediaSource::Path(path)
    }
}

impl From<&Path> for MediaSource {
    fn from(path: &Path) -> Self {
        MediaSource::Path(path.to_path_buf())
    }
}

/// Optional fields for [`Session::media_post`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaOptions {
    /// Alt text.
    pub description: Option<String>,
    /// Focal point, each coordinate in `-1.0..=1.0`.
    pub focus: Option<(f64, f64)>,
}

impl MediaOptions {
    fn to_params(&self) -> Result<Params> {
        let mut params = Params::new();
        params.insert_opt("description", self.description.as_deref());
        if let Some((x, y)) = self.focus {
            let in_range = |v: f64| (-1.0..=1.0).contains(&v);
            if !in_range(x) || !in_range(y) {
                return Err(Error::InvalidArguments(format!(
                    "focus ({x}, {y}) is outside -1.0..=1.0"
                )));
            }
            params.insert("focus", format!("{x},{y}"));
        }
        Ok(params)
    }
}

impl Session {
    /// Upload an image, video or audio file for use in a status.
    ///
    /// `mime_type` overrides the type guessed from the file name. The
    /// returned media object can be passed to
    /// [`StatusOptions::media`](super::StatusOptions::media).
    pub async fn media_post(
        &mut self,
        source: MediaSource,
        mime_type: Option<&str>,
        options: &MediaOptions,
    ) -> Result<Value> {
        let mime_type = match mime_type {
            Some(explicit) => explicit.to_string(),
            None => source.guess_mime().ok_or(Error::UnknownMimeType)?,
        };
        let params = options.to_params()?;
        let file_name = mime::upload_file_name(&mime_type, self.clock.now());
        let data = source.into_data().await?;
        tracing::debug!(
            mime_type = %mime_type,
            file_name = %file_name,
            bytes = data.len(),
            "uploading media"
        );

        let request = ApiRequest::post("/api/v1/media")
            .params(params)
            .attachment(Attachment {
                field: "file".to_string(),
                file_name,
                mime_type,
                data,
            });
        self.dispatch(&request).await
    }
}
