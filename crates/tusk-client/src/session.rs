//! Client session construction and state.

use crate::clock::{Clock, SystemClock};
use crate::credentials::{resolve_token, ClientCredentials, CredentialSource};
use crate::error::{Error, Result};
use crate::ratelimit::{RateLimitPolicy, RateLimitWindow};
use crate::store::{ByteStore, FileStore};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tusk_common_config::ClientConfig;
use tusk_common_http::{HttpClient, HttpConfig, Transport};
use tusk_common_secret::SecretString;

/// Default pace factor.
pub const DEFAULT_PACE_FACTOR: f64 = 1.1;

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Options for [`Session::new`].
pub struct SessionOptions {
    base_url: String,
    client_id: CredentialSource,
    client_secret: Option<String>,
    access_token: Option<CredentialSource>,
    policy: RateLimitPolicy,
    pace_factor: f64,
    request_timeout: Duration,
    user_agent: Option<String>,
    transport: Option<Arc<dyn Transport>>,
    clock: Option<Arc<dyn Clock>>,
    store: Option<Arc<dyn ByteStore>>,
}

impl SessionOptions {
    pub fn new(base_url: impl Into<String>, client_id: impl Into<CredentialSource>) -> Self {
        Self {
            base_url: base_url.into(),
            client_id: client_id.into(),
            client_secret: None,
            access_token: None,
            policy: RateLimitPolicy::default(),
            pace_factor: DEFAULT_PACE_FACTOR,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            user_agent: None,
            transport: None,
            clock: None,
            store: None,
        }
    }

    pub fn client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    pub fn access_token(mut self, token: impl Into<CredentialSource>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn policy(mut self, policy: RateLimitPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn pace_factor(mut self, pace_factor: f64) -> Self {
        self.pace_factor = pace_factor;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Use `transport` instead of a fresh [`HttpClient`].
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn store(mut self, store: Arc<dyn ByteStore>) -> Self {
        self.store = Some(store);
        self
    }
}

/// One authenticated connection to a server.
///
/// Every call that reaches the network takes `&mut self`: the rate-limit
/// window is updated after each exchange, so a session serves one call at
/// a time. Share a session across tasks behind a `tokio::sync::Mutex`, or
/// give each worker its own.
pub struct Session {
    pub(crate) base_url: String,
    pub(crate) credentials: ClientCredentials,
    pub(crate) access_token: Option<SecretString>,
    pub(crate) refresh_token: Option<SecretString>,
    pub(crate) policy: RateLimitPolicy,
    pub(crate) pace_factor: f64,
    pub(crate) request_timeout: Duration,
    pub(crate) user_agent: String,
    pub(crate) window: RateLimitWindow,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) store: Arc<dyn ByteStore>,
}

pub(crate) fn default_user_agent() -> String {
    format!("tusk/{}", env!("CARGO_PKG_VERSION"))
}

impl Session {
    /// Validate options, resolve credentials and build a session.
    pub fn new(options: SessionOptions) -> Result<Self> {
        if !options.pace_factor.is_finite() || options.pace_factor <= 0.0 {
            return Err(Error::InvalidConfiguration(format!(
                "pace factor must be a positive number, got {}",
                options.pace_factor
            )));
        }
        if options.request_timeout.is_zero() {
            return Err(Error::InvalidConfiguration(
                "request timeout must be greater than zero".to_string(),
            ));
        }
        let base_url = options.base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(Error::InvalidConfiguration(
                "base URL must not be empty".to_string(),
            ));
        }

        let store = options.store.unwrap_or_else(|| Arc::new(FileStore));
        let credentials = ClientCredentials::resolve(
            store.as_ref(),
            &options.client_id,
            options.client_secret.as_deref(),
        )?;
        let access_token = options
            .access_token
            .as_ref()
            .map(|source| resolve_token(store.as_ref(), source))
            .transpose()?;

        let user_agent = options.user_agent.unwrap_or_else(default_user_agent);
        let transport = match options.transport {
            Some(transport) => transport,
            None => Arc::new(HttpClient::with_config(HttpConfig {
                request_timeout: options.request_timeout,
                user_agent: user_agent.clone(),
                ..HttpConfig::default()
            })?),
        };
        let clock = options.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let window = RateLimitWindow::new(clock.now());

        tracing::debug!(
            base_url = %base_url,
            policy = %options.policy,
            "session created"
        );

        Ok(Self {
            base_url,
            credentials,
            access_token,
            refresh_token: None,
            policy: options.policy,
            pace_factor: options.pace_factor,
            request_timeout: options.request_timeout,
            user_agent,
            window,
            transport,
            clock,
            store,
        })
    }

    /// Build a session from a loaded [`ClientConfig`].
    ///
    /// Credential values that name existing files are read from them.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Self::from_config_with(config, |options| options)
    }

    /// As [`Session::from_config`], letting the caller adjust the options first.
    pub fn from_config_with(
        config: &ClientConfig,
        customize: impl FnOnce(SessionOptions) -> SessionOptions,
    ) -> Result<Self> {
        let client_id = config
            .client_id
            .as_deref()
            .ok_or_else(|| Error::MissingCredential("client_id is not configured".to_string()))?;
        if !config.request_timeout_secs.is_finite() || config.request_timeout_secs <= 0.0 {
            return Err(Error::InvalidConfiguration(format!(
                "request timeout must be a positive number of seconds, got {}",
                config.request_timeout_secs
            )));
        }

        let mut options = SessionOptions::new(
            config.api_base_url.clone(),
            CredentialSource::detect(client_id),
        )
        .policy(config.ratelimit_method.parse()?)
        .pace_factor(config.ratelimit_pacefactor)
        .request_timeout(Duration::from_secs_f64(config.request_timeout_secs));

        if let Some(secret) = &config.client_secret {
            options = options.client_secret(secret.clone());
        }
        if let Some(token) = &config.access_token {
            options = options.access_token(CredentialSource::detect(token));
        }
        if let Some(user_agent) = &config.user_agent {
            options = options.user_agent(user_agent.clone());
        }

        Self::new(customize(options))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn client_id(&self) -> &str {
        &self.credentials.client_id
    }

    pub fn credentials(&self) -> &ClientCredentials {
        &self.credentials
    }

    pub fn access_token(&self) -> Option<&SecretString> {
        self.access_token.as_ref()
    }

    pub fn refresh_token(&self) -> Option<&SecretString> {
        self.refresh_token.as_ref()
    }

    /// Replace the bearer token used for subsequent calls.
    pub fn set_access_token(&mut self, token: impl Into<SecretString>) {
        self.access_token = Some(token.into());
    }

    pub fn policy(&self) -> RateLimitPolicy {
        self.policy
    }

    pub fn pace_factor(&self) -> f64 {
        self.pace_factor
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// The rate-limit window as last reported by the server.
    pub fn rate_limit(&self) -> &RateLimitWindow {
        &self.window
    }

    /// Write the access token to `path` (one line).
    pub fn persist_token(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let token = self
            .access_token
            .as_ref()
            .ok_or_else(|| Error::MissingCredential("no access token to persist".to_string()))?;
        self.store
            .write_lines(path, &[token.expose().as_str()])
            .map_err(|e| Error::io(path, e))
    }

    /// Write the client id and secret to `path` (two lines).
    pub fn persist_client_credential(&self, path: impl AsRef<Path>) -> Result<()> {
        self.credentials.persist(self.store.as_ref(), path.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::{TimeZone, Utc};
    use tusk_test_utils::{credential_file, temp_dir, temp_file};

    fn options() -> SessionOptions {
        SessionOptions::new("https://social.example/", "ID123").client_secret("SECRET456")
    }

    #[test]
    fn test_defaults() {
        let session = Session::new(options()).unwrap();
        assert_eq!(session.base_url(), "https://social.example");
        assert_eq!(session.client_id(), "ID123");
        assert_eq!(session.policy(), RateLimitPolicy::BlockAndRetry);
        assert_eq!(session.pace_factor(), DEFAULT_PACE_FACTOR);
        assert_eq!(session.request_timeout(), DEFAULT_REQUEST_TIMEOUT);
        assert_eq!(session.rate_limit().limit, 150);
        assert_eq!(session.rate_limit().remaining, 150);
        assert!(session.access_token().is_none());
    }

    #[test]
    fn test_window_starts_at_clock_now() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let session = Session::new(options().clock(Arc::new(ManualClock::new(start)))).unwrap();
        assert_eq!(session.rate_limit().reset_at, start);
        assert_eq!(session.rate_limit().last_call_at, start);
    }

    #[test]
    fn test_invalid_pace_factor() {
        for factor in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = Session::new(options().pace_factor(factor)).err().unwrap();
            assert_eq!(err.kind(), crate::ErrorKind::InvalidConfiguration);
        }
    }

    #[test]
    fn test_zero_timeout_is_invalid() {
        let err = Session::new(options().request_timeout(Duration::ZERO)).err().unwrap();
        assert_eq!(err.kind(), crate::ErrorKind::InvalidConfiguration);
    }

    #[test]
    fn test_missing_secret() {
        let err = Session::new(SessionOptions::new("https://social.example", "ID123"))
            .err()
            .unwrap();
        assert_eq!(err.kind(), crate::ErrorKind::MissingCredential);
    }

    #[test]
    fn test_credentials_and_token_from_files() {
        let (_creds_dir, creds) = credential_file(&["ID123", "SECRET456"]);
        let (_token_dir, token) = temp_file("tok\n");

        let session = Session::new(
            SessionOptions::new("https://social.example", creds).access_token(token),
        )
        .unwrap();

        assert_eq!(session.client_id(), "ID123");
        assert_eq!(session.credentials().client_secret.expose(), "SECRET456");
        assert_eq!(session.access_token().unwrap().expose(), "tok");
    }

    #[test]
    fn test_persist_token_round_trip() {
        let dir = temp_dir();
        let path = dir.path().join("token.secret");

        let session = Session::new(options().access_token("tok-abc")).unwrap();
        session.persist_token(&path).unwrap();

        let reloaded = Session::new(options().access_token(path.clone())).unwrap();
        assert_eq!(reloaded.access_token().unwrap().expose(), "tok-abc");
    }

    #[test]
    fn test_persist_token_without_token() {
        let dir = temp_dir();
        let session = Session::new(options()).unwrap();
        let err = session.persist_token(dir.path().join("t")).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::MissingCredential);
    }

    #[test]
    fn test_persist_client_credential() {
        let dir = temp_dir();
        let path = dir.path().join("client.secret");
        Session::new(options())
            .unwrap()
            .persist_client_credential(&path)
            .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "ID123\nSECRET456\n");
    }

    #[test]
    fn test_from_config() {
        let config = ClientConfig {
            api_base_url: "https://social.example".to_string(),
            client_id: Some("ID123".to_string()),
            client_secret: Some("SECRET456".to_string()),
            access_token: Some("tok".to_string()),
            ratelimit_method: "pace".to_string(),
            ratelimit_pacefactor: 2.0,
            request_timeout_secs: 30.0,
            user_agent: Some("tusk-test".to_string()),
        };

        let session = Session::from_config(&config).unwrap();
        assert_eq!(session.policy(), RateLimitPolicy::Pace);
        assert_eq!(session.pace_factor(), 2.0);
        assert_eq!(session.request_timeout(), Duration::from_secs(30));
        assert_eq!(session.access_token().unwrap().expose(), "tok");
    }

    #[test]
    fn test_from_config_rejects_bad_policy() {
        let config = ClientConfig {
            client_id: Some("ID123".to_string()),
            client_secret: Some("SECRET456".to_string()),
            ratelimit_method: "sometimes".to_string(),
            ..ClientConfig::default()
        };
        let err = Session::from_config(&config).err().unwrap();
        assert_eq!(err.kind(), crate::ErrorKind::InvalidConfiguration);
    }

    #[test]
    fn test_from_config_requires_client_id() {
        let err = Session::from_config(&ClientConfig::default()).err().unwrap();
        assert_eq!(err.kind(), crate::ErrorKind::MissingCredential);
    }
}
