//! Client credentials and where they come from.

use crate::error::{Error, Result};
use crate::store::{ByteStore, FileStore};
use std::path::{Path, PathBuf};
use tusk_common_secret::SecretString;

/// A credential given either literally or as a file to read it from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    Literal(String),
    FromStore(PathBuf),
}

impl CredentialSource {
    /// Treat `value` as a path when it names an existing file, else as a literal.
    pub fn detect(value: &str) -> Self {
        Self::detect_in(&FileStore, value)
    }

    /// As [`CredentialSource::detect`], checking existence in `store`.
    pub fn detect_in(store: &dyn ByteStore, value: &str) -> Self {
        let path = Path::new(value);
        if store.exists(path) {
            CredentialSource::FromStore(path.to_path_buf())
        } else {
            CredentialSource::Literal(value.to_string())
        }
    }
}

impl From<&str> for CredentialSource {
    fn from(value: &str) -> Self {
        CredentialSource::Literal(value.to_string())
    }
}

impl From<String> for CredentialSource {
    fn from(value: String) -> Self {
        CredentialSource::Literal(value)
    }
}

impl From<PathBuf> for CredentialSource {
    fn from(path: PathBuf) -> Self {
        CredentialSource::FromStore(path)
    }
}

/// A registered application's id and secret.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: SecretString,
}

impl ClientCredentials {
    /// Read a two-line credential file: id, then secret.
    pub fn load(store: &dyn ByteStore, path: &Path) -> Result<Self> {
        let lines = store.read_lines(path).map_err(|e| Error::io(path, e))?;
        let mut lines = lines.into_iter().map(|l| l.trim().to_string());
        let client_id = non_empty(lines.next()).ok_or_else(|| {
            Error::MissingCredential(format!("client id (line 1 of {})", path.display()))
        })?;
        let client_secret = non_empty(lines.next()).ok_or_else(|| {
            Error::MissingCredential(format!("client secret (line 2 of {})", path.display()))
        })?;
        Ok(Self {
            client_id,
            client_secret: SecretString::new(client_secret),
        })
    }

    /// Resolve from a source plus an optional literal secret.
    pub fn resolve(
        store: &dyn ByteStore,
        client_id: &CredentialSource,
        client_secret: Option<&str>,
    ) -> Result<Self> {
        match client_id {
            CredentialSource::FromStore(path) => Self::load(store, path),
            CredentialSource::Literal(id) => {
                let secret = client_secret.ok_or_else(|| {
                    Error::MissingCredential("client_secret is required with a literal client_id".to_string())
                })?;
                Ok(Self {
                    client_id: id.clone(),
                    client_secret: SecretString::from(secret),
                })
            }
        }
    }

    /// Write the two-line credential file.
    pub fn persist(&self, store: &dyn ByteStore, path: &Path) -> Result<()> {
        store
            .write_lines(
                path,
                &[self.client_id.as_str(), self.client_secret.expose().as_str()],
            )
            .map_err(|e| Error::io(path, e))
    }
}

/// Resolve an access token source; a file contributes its first line.
pub(crate) fn resolve_token(store: &dyn ByteStore, source: &CredentialSource) -> Result<SecretString> {
    match source {
        CredentialSource::Literal(token) => Ok(SecretString::from(token.as_str())),
        CredentialSource::FromStore(path) => {
            let lines = store.read_lines(path).map_err(|e| Error::io(path, e))?;
            let token = non_empty(lines.into_iter().next().map(|l| l.trim().to_string()))
                .ok_or_else(|| {
                    Error::MissingCredential(format!("access token (line 1 of {})", path.display()))
                })?;
            Ok(SecretString::new(token))
        }
    }
}

fn non_empty(line: Option<String>) -> Option<String> {
    line.filter(|l| !l.is_empty())
}
