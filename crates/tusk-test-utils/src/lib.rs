//! Test utilities for Tusk crates.

pub mod fixtures;
pub mod http;

pub use fixtures::{rate_limit_headers, RateLimitHeaders};
pub use http::TestHttpServer;

use std::path::PathBuf;
use tempfile::TempDir;

/// Creates a temporary directory that is cleaned up on drop.
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Creates a temporary file with given content.
pub fn temp_file(content: &str) -> (TempDir, PathBuf) {
    let dir = temp_dir();
    let path = dir.path().join("test_file");
    std::fs::write(&path, content).expect("Failed to write temp file");
    (dir, path)
}

/// Creates a temporary credential file, one value per line.
pub fn credential_file(lines: &[&str]) -> (TempDir, PathBuf) {
    let dir = temp_dir();
    let path = dir.path().join("credentials.secret");
    let mut content = lines.join("\n");
    content.push('\n');
    std::fs::write(&path, content).expect("Failed to write credential file");
    (dir, path)
}

/// Install a debug-level subscriber for the test binary.
///
/// Safe to call from every test; only the first call installs anything.
pub fn init_test_logging() {
    let _ = tusk_common_log::init(tusk_common_log::LogConfig {
        level: tusk_common_log::LogLevel::Debug,
        format: tusk_common_log::LogFormat::Compact,
        ..Default::default()
    });
}

/// Assert that a Result is Ok and return the value.
#[macro_export]
macro_rules! assert_ok {
    ($expr:expr) => {
        match $expr {
            Ok(v) => v,
            Err(e) => panic!("Expected Ok, got Err: {:?}", e),
        }
    };
}

/// Assert that a Result is Err and return the error.
#[macro_export]
macro_rules! assert_err {
    ($expr:expr) => {
        match $expr {
            Ok(v) => panic!("Expected Err, got Ok: {:?}", v),
            Err(e) => e,
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_temp_dir_creation() {
        let dir = temp_dir();
        assert!(dir.path().exists());
        assert!(dir.path().is_dir());
    }

    #[test]
    fn test_temp_file_creation() {
        let content = "test content";
        let (_dir, path) = temp_file(content);
        assert!(path.is_file());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), content);
    }

    #[test]
    fn test_credential_file_lines() {
        let (_dir, path) = credential_file(&["ID123", "SECRET456"]);
        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines, vec!["ID123", "SECRET456"]);
    }

    #[test]
    fn test_assert_macros() {
        let ok: Result<u8, String> = Ok(3);
        assert_eq!(assert_ok!(ok), 3);

        let err: Result<u8, String> = Err("boom".to_string());
        assert_eq!(assert_err!(err), "boom");
    }

    #[test]
    fn test_init_test_logging_is_idempotent() {
        init_test_logging();
        init_test_logging();
    }

    proptest! {
        #[test]
        fn test_temp_file_content_roundtrip(content in "\\PC*") {
            let (_dir, path) = temp_file(&content);
            let read_content = std::fs::read_to_string(&path).unwrap();
            prop_assert_eq!(content, read_content);
        }
    }
}
