//! Configuration types.

use serde::{Deserialize, Serialize};

/// Rate-limit policy names accepted in configuration.
pub const RATELIMIT_METHODS: &[&str] = &["fail-fast", "throw", "block-and-retry", "wait", "pace"];

/// Configuration of one client session.
///
/// Credential fields accept either a literal value or a path to a
/// credential file; the client decides which when the session is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Root URL of the server.
    pub api_base_url: String,
    /// Client id, or path to a two-line client credential file.
    pub client_id: Option<String>,
    /// Client secret (ignored when `client_id` is a file).
    pub client_secret: Option<String>,
    /// Access token, or path to a token file.
    pub access_token: Option<String>,
    /// Rate-limit policy name.
    pub ratelimit_method: String,
    /// Pacing aggressiveness, only used by the `pace` policy.
    pub ratelimit_pacefactor: f64,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: f64,
    /// Override for the `User-Agent` header.
    pub user_agent: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://mastodon.social".to_string(),
            client_id: None,
            client_secret: None,
            access_token: None,
            ratelimit_method: "block-and-retry".to_string(),
            ratelimit_pacefactor: 1.1,
            request_timeout_secs: 300.0,
            user_agent: None,
        }
    }
}
