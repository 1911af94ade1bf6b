//! Rate-limit-aware client for the Mastodon REST API.
//!
//! A [`Session`] holds the credentials for one server and the rate-limit
//! window it last reported. Every call goes through the dispatcher, which
//! paces, retries, or fails fast according to the session's
//! [`RateLimitPolicy`].
//!
//! ```no_run
//! # async fn run() -> tusk_client::Result<()> {
//! use tusk_client::{Session, SessionOptions};
//!
//! let mut session = Session::new(
//!     SessionOptions::new("https://mastodon.social", "client-id")
//!         .client_secret("client-secret")
//!         .access_token("access-token"),
//! )?;
//! let toot = session.toot("hello from tusk").await?;
//! println!("posted {}", toot["id"]);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod clock;
pub mod credentials;
pub mod dispatch;
pub mod error;
pub mod mime;
pub mod params;
pub mod ratelimit;
pub mod session;
pub mod store;

pub use api::{
    AppRegistration, LoginRequest, MediaOptions, MediaSource, PageOptions, StatusOptions,
    Timeline,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use credentials::{ClientCredentials, CredentialSource};
pub use dispatch::{ApiRequest, HttpMethod};
pub use error::{Error, ErrorKind, Result};
pub use params::{ParamValue, Params};
pub use ratelimit::{RateLimitPolicy, RateLimitWindow};
pub use session::{Session, SessionOptions};
pub use store::{ByteStore, FileStore};

pub use tusk_common_http::{HttpClient, Transport};
pub use tusk_common_secret::SecretString;
