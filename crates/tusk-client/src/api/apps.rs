//! Application registration.

use crate::clock::SystemClock;
use crate::credentials::ClientCredentials;
use crate::dispatch::{send_once, ApiRequest};
use crate::error::{Error, Result};
use crate::params::Params;
use crate::session::{default_user_agent, Session, DEFAULT_REQUEST_TIMEOUT};
use crate::store::{ByteStore, FileStore};
use serde_json::Value;
use std::path::PathBuf;
use tusk_common_http::{RequestBuilder, Transport};
use tusk_common_secret::SecretString;

/// Scopes requested when none are given.
pub const DEFAULT_SCOPES: &[&str] = &["read", "write", "follow"];

/// Out-of-band redirect: the server shows the code instead of redirecting.
pub const OOB_REDIRECT_URI: &str = "urn:ietf:wg:oauth:2.0:oob";

/// A new application to register with a server.
#[derive(Debug, Clone, PartialEq)]
pub struct AppRegistration {
    pub client_name: String,
    pub scopes: Vec<String>,
    pub redirect_uris: String,
    pub website: Option<String>,
    /// Where to write the issued id and secret.
    pub to_file: Option<PathBuf>,
}

impl AppRegistration {
    pub fn new(client_name: impl Into<String>) -> Self {
        Self {
            client_name: client_name.into(),
            scopes: DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
            redirect_uris: OOB_REDIRECT_URI.to_string(),
            website: None,
            to_file: None,
        }
    }

    pub fn scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    pub fn redirect_uris(mut self, uris: impl Into<String>) -> Self {
        self.redirect_uris = uris.into();
        self
    }

    pub fn website(mut self, website: impl Into<String>) -> Self {
        self.website = Some(website.into());
        self
    }

    pub fn to_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.to_file = Some(path.into());
        self
    }

    fn to_params(&self) -> Params {
        let mut params = Params::new();
        params
            .insert("client_name", self.client_name.as_str())
            .insert("scopes", self.scopes.join(" "))
            .insert("redirect_uris", self.redirect_uris.as_str())
            .insert_opt("website", self.website.as_deref());
        params
    }
}

impl Session {
    /// Register an application and return its client credentials.
    ///
    /// Runs before any session exists, so it is sent once with no rate-limit
    /// accounting. With `to_file` set the credentials are also written there.
    pub async fn create_app(
        transport: &dyn Transport,
        base_url: &str,
        registration: &AppRegistration,
    ) -> Result<ClientCredentials> {
        Self::create_app_in(&FileStore, transport, base_url, registration).await
    }

    /// As [`Session::create_app`], persisting through `store`.
    pub async fn create_app_in(
        store: &dyn ByteStore,
        transport: &dyn Transport,
        base_url: &str,
        registration: &AppRegistration,
    ) -> Result<ClientCredentials> {
        if registration.client_name.trim().is_empty() {
            return Err(Error::InvalidArguments(
                "client_name must not be empty".to_string(),
            ));
        }
        let base_url = base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(Error::InvalidConfiguration(
                "base URL must not be empty".to_string(),
            ));
        }

        let request = ApiRequest::post("/api/v1/apps")
            .params(registration.to_params())
            .unmetered();
        let headers = RequestBuilder::new()
            .user_agent(default_user_agent())
            .into_headers();
        let body = send_once(
            transport,
            &SystemClock,
            base_url,
            &request,
            headers,
            DEFAULT_REQUEST_TIMEOUT,
        )
        .await?;

        let field = |name: &str| body.get(name).and_then(Value::as_str).map(str::to_string);
        let (Some(client_id), Some(client_secret)) = (field("client_id"), field("client_secret"))
        else {
            return Err(Error::MalformedResponse {
                status: 200,
                body: body.to_string(),
            });
        };
        let credentials = ClientCredentials {
            client_id,
            client_secret: SecretString::new(client_secret),
        };

        tracing::info!(
            client_name = %registration.client_name,
            client_id = %credentials.client_id,
            "application registered"
        );

        if let Some(path) = &registration.to_file {
            credentials.persist(store, path)?;
        }
        Ok(credentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_defaults() {
        let params = AppRegistration::new("tusk").to_params();
        assert_eq!(params.get_str("client_name"), Some("tusk"));
        assert_eq!(params.get_str("scopes"), Some("read write follow"));
        assert_eq!(params.get_str("redirect_uris"), Some(OOB_REDIRECT_URI));
        assert!(!params.contains_key("website"));
    }

    #[test]
    fn test_registration_overrides() {
        let params = AppRegistration::new("tusk")
            .scopes(["read"])
            .website("https://tusk.example")
            .to_params();
        assert_eq!(params.get_str("scopes"), Some("read"));
        assert_eq!(params.get_str("website"), Some("https://tusk.example"));
    }
}
