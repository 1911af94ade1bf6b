//! Secure handling of client secrets and OAuth tokens.
//!
//! Credentials held by a session should never be accidentally logged or
//! serialized; wrapping them in [`Secret`] makes every read explicit.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A secret value that is redacted in logs and debug output.
///
/// # Example
///
/// ```rust
/// use tusk_common_secret::Secret;
///
/// let token = Secret::new("abc123".to_string());
/// println!("{}", token); // Prints: [REDACTED]
/// println!("{:?}", token); // Prints: Secret([REDACTED])
///
/// // Explicit access required
/// let value = token.expose();
/// assert_eq!(value, "abc123");
/// ```
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Secret<T: Zeroize>(T);

impl<T: Zeroize> Secret<T> {
    /// Create a new secret.
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// Expose the secret value.
    ///
    /// Use this method sparingly and only when necessary.
    pub fn expose(&self) -> &T {
        &self.0
    }
}

impl<T: Zeroize + Default> Secret<T> {
    /// Consume and return the inner value.
    ///
    /// The wrapper is left holding `T::default()`, which is what gets zeroized.
    pub fn into_inner(mut self) -> T {
        std::mem::take(&mut self.0)
    }
}

impl<T: Zeroize> fmt::Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl<T: Zeroize> fmt::Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret([REDACTED])")
    }
}

impl<T: Zeroize + PartialEq> PartialEq for Secret<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl From<String> for Secret<String> {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for Secret<String> {
    fn from(value: &str) -> Self {
        Self::new(value.to_string())
    }
}

// Serde: Deserialize normally, but serialize as redacted
impl<'de, T: Zeroize + Deserialize<'de>> Deserialize<'de> for Secret<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        T::deserialize(deserializer).map(Secret::new)
    }
}

impl<T: Zeroize + Serialize> Serialize for Secret<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        "[REDACTED]".serialize(serializer)
    }
}

/// Type alias for a secret string.
pub type SecretString = Secret<String>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_display_is_redacted() {
        let secret = SecretString::new("access-token".to_string());
        assert_eq!(format!("{}", secret), "[REDACTED]");
    }

    #[test]
    fn test_secret_debug_is_redacted() {
        let secret = SecretString::new("access-token".to_string());
        assert_eq!(format!("{:?}", secret), "Secret([REDACTED])");
    }

    #[test]
    fn test_secret_debug_inside_struct() {
        #[derive(Debug)]
        #[allow(dead_code)]
        struct Credentials {
            client_id: String,
            client_secret: SecretString,
        }

        let creds = Credentials {
            client_id: "ID123".to_string(),
            client_secret: "SECRET456".into(),
        };
        let debug = format!("{:?}", creds);
        assert!(debug.contains("ID123"));
        assert!(!debug.contains("SECRET456"));
    }

    #[test]
    fn test_secret_expose() {
        let secret = SecretString::new("access-token".to_string());
        assert_eq!(secret.expose(), "access-token");
    }

    #[test]
    fn test_secret_serialization_is_redacted() {
        let secret = SecretString::new("access-token".to_string());
        let serialized = serde_json::to_string(&secret).unwrap();
        assert_eq!(serialized, "\"[REDACTED]\"");
    }

    #[test]
    fn test_secret_deserialization() {
        let json = "\"access-token\"";
        let secret: SecretString = serde_json::from_str(json).unwrap();
        assert_eq!(secret.expose(), "access-token");
    }

    #[test]
    fn test_secret_into_inner() {
        let secret = SecretString::from("access-token");
        let value = secret.into_inner();
        assert_eq!(value, "access-token");
    }

    #[test]
    fn test_secret_equality() {
        let secret1 = SecretString::from("access-token");
        let secret2 = SecretString::from("access-token");
        let secret3 = SecretString::from("other-token");

        assert_eq!(secret1, secret2);
        assert_ne!(secret1, secret3);
    }
}
