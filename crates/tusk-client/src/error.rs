//! Client error types.

use chrono::{DateTime, Utc};
use std::path::PathBuf;
use thiserror::Error;
use tusk_common_config::ConfigError;
use tusk_common_http::HttpError;

/// Result alias used throughout the client.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by a [`Session`](crate::Session).
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("missing credential: {0}")]
    MissingCredential(String),

    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("invalid HTTP method {0:?}, expected GET, POST or DELETE")]
    InvalidMethod(String),

    #[error("invalid visibility {0:?}, expected private, public or unlisted")]
    InvalidVisibility(String),

    #[error("granted scopes {granted:?} do not match requested scopes {requested:?}")]
    ScopeMismatch {
        requested: Vec<String>,
        granted: Vec<String>,
    },

    #[error("could not determine MIME type for upload")]
    UnknownMimeType,

    #[error("transport error: {0}")]
    Transport(#[from] HttpError),

    #[error("endpoint not found: {endpoint}")]
    NotFound { endpoint: String },

    #[error("server error on {endpoint}")]
    ServerError { endpoint: String },

    #[error("malformed response (status {status}): {body}")]
    MalformedResponse { status: u16, body: String },

    #[error("rate limited until {reset_at}")]
    RateLimited { reset_at: DateTime<Utc> },

    #[error("could not parse {header} header {value:?}")]
    RateLimitParse { header: &'static str, value: String },

    #[error("server returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("credential store I/O on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Machine-checkable error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidConfiguration,
    MissingCredential,
    InvalidArguments,
    InvalidMethod,
    InvalidVisibility,
    ScopeMismatch,
    UnknownMimeType,
    TransportError,
    NotFound,
    ServerError,
    MalformedResponse,
    RateLimited,
    RateLimitParseError,
    ApiError,
    Io,
    Config,
}

impl Error {
    /// The category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidConfiguration(_) => ErrorKind::InvalidConfiguration,
            Error::MissingCredential(_) => ErrorKind::MissingCredential,
            Error::InvalidArguments(_) => ErrorKind::InvalidArguments,
            Error::InvalidMethod(_) => ErrorKind::InvalidMethod,
            Error::InvalidVisibility(_) => ErrorKind::InvalidVisibility,
            Error::ScopeMismatch { .. } => ErrorKind::ScopeMismatch,
            Error::UnknownMimeType => ErrorKind::UnknownMimeType,
            Error::Transport(_) => ErrorKind::TransportError,
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::ServerError { .. } => ErrorKind::ServerError,
            Error::MalformedResponse { .. } => ErrorKind::MalformedResponse,
            Error::RateLimited { .. } => ErrorKind::RateLimited,
            Error::RateLimitParse { .. } => ErrorKind::RateLimitParseError,
            Error::Api { .. } => ErrorKind::ApiError,
            Error::Io { .. } => ErrorKind::Io,
            Error::Config(_) => ErrorKind::Config,
        }
    }

    /// Whether this error comes from rate limiting rather than the request itself.
    pub fn is_rate_limit(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::RateLimited | ErrorKind::RateLimitParseError
        )
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
