//! OAuth token exchange.

use super::apps::{DEFAULT_SCOPES, OOB_REDIRECT_URI};
use crate::dispatch::{send_once, ApiRequest};
use crate::error::{Error, Result};
use crate::params::Params;
use crate::session::Session;
use serde_json::Value;
use std::path::PathBuf;
use tusk_common_http::{form, RequestBuilder};
use tusk_common_secret::SecretString;

/// Inputs for [`Session::log_in`].
///
/// The grant is picked from whichever inputs are present, in this order:
/// username and password, then an authorization code, then a refresh token.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<SecretString>,
    pub code: Option<String>,
    pub refresh_token: Option<SecretString>,
    pub scopes: Vec<String>,
    pub redirect_uri: String,
    /// Where to write the issued access token.
    pub to_file: Option<PathBuf>,
}

impl Default for LoginRequest {
    fn default() -> Self {
        Self {
            username: None,
            password: None,
            code: None,
            refresh_token: None,
            scopes: DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
            redirect_uri: OOB_REDIRECT_URI.to_string(),
            to_file: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Grant {
    Password,
    AuthorizationCode,
    RefreshToken,
}

impl Grant {
    fn as_str(self) -> &'static str {
        match self {
            Grant::Password => "password",
            Grant::AuthorizationCode => "authorization_code",
            Grant::RefreshToken => "refresh_token",
        }
    }
}

impl LoginRequest {
    pub fn password(username: impl Into<String>, password: impl Into<SecretString>) -> Self {
        Self {
            username: Some(username.into()),
            password: Some(password.into()),
            ..Self::default()
        }
    }

    pub fn code(code: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            ..Self::default()
        }
    }

    pub fn refresh(refresh_token: impl Into<SecretString>) -> Self {
        Self {
            refresh_token: Some(refresh_token.into()),
            ..Self::default()
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

    pub fn redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = uri.into();
        self
    }

    pub fn to_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.to_file = Some(path.into());
        self
    }

    fn grant(&self) -> Result<Grant> {
        if self.username.is_some() && self.password.is_some() {
            Ok(Grant::Password)
        } else if self.code.is_some() {
            Ok(Grant::AuthorizationCode)
        } else if self.refresh_token.is_some() {
            Ok(Grant::RefreshToken)
        } else {
            Err(Error::InvalidArguments(
                "log_in needs username and password, a code, or a refresh token".to_string(),
            ))
        }
    }

    fn to_params(&self, grant: Grant) -> Params {
        let mut params = Params::new();
        params
            .insert("grant_type", grant.as_str())
            .insert("scope", self.scopes.join(" "));
        match grant {
            Grant::Password => {
                params
                    .insert_opt("username", self.username.as_deref())
                    .insert_opt("password", self.password.as_ref().map(|p| p.expose().clone()));
            }
            Grant::AuthorizationCode => {
                params
                    .insert_opt("code", self.code.as_deref())
                    .insert("redirect_uri", self.redirect_uri.as_str());
            }
            Grant::RefreshToken => {
                params.insert_opt(
                    "refresh_token",
                    self.refresh_token.as_ref().map(|t| t.expose().clone()),
                );
            }
        }
        params
    }
}

// Some servers answer the token endpoint form-encoded.
fn form_body(body: &str) -> Value {
    let fields = form::decode(body)
        .into_iter()
        .map(|(name, value)| (name, Value::String(value)))
        .collect();
    Value::Object(fields)
}

fn sorted_scopes<'a>(scopes: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut scopes: Vec<String> = scopes
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    scopes.sort();
    scopes.dedup();
    scopes
}

impl Session {
    /// Exchange credentials for an access token and adopt it.
    ///
    /// Fails with [`Error::ScopeMismatch`] when the server grants a
    /// different set of scopes than requested. A response without a
    /// `scope` field is taken to grant what was asked for.
    pub async fn log_in(&mut self, login: &LoginRequest) -> Result<SecretString> {
        let grant = login.grant()?;

        let mut params = login.to_params(grant);
        params
            .insert("client_id", self.credentials.client_id.as_str())
            .insert("client_secret", self.credentials.client_secret.expose().as_str());
        let request = ApiRequest::post("/oauth/token").params(params).unmetered();
        let headers = RequestBuilder::new()
            .user_agent(&self.user_agent)
            .into_headers();

        let body = match send_once(
            self.transport.as_ref(),
            self.clock.as_ref(),
            &self.base_url,
            &request,
            headers,
            self.request_timeout,
        )
        .await
        {
            Ok(body) => body,
            Err(Error::MalformedResponse { status, body }) if (200..300).contains(&status) => {
                form_body(&body)
            }
            Err(e) => return Err(e),
        };

        let token = body
            .get("access_token")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                Error::InvalidArguments("invalid user name, password, or redirect_uri".to_string())
            })?;

        let requested = sorted_scopes(login.scopes.iter().map(String::as_str));
        if let Some(scope) = body.get("scope").and_then(Value::as_str) {
            let granted = sorted_scopes(scope.split_whitespace());
            if granted != requested {
                return Err(Error::ScopeMismatch { requested, granted });
            }
        }

        let token = SecretString::from(token);
        self.access_token = Some(token.clone());
        if let Some(refresh) = body.get("refresh_token").and_then(Value::as_str) {
            self.refresh_token = Some(SecretString::from(refresh));
        }
        tracing::info!(grant = grant.as_str(), "logged in");

        if let Some(path) = &login.to_file {
            self.persist_token(path)?;
        }
        Ok(token)
    }
}
