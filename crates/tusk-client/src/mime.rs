//! MIME type lookup for media uploads.

use chrono::{DateTime, Utc};
use rand::Rng;
use std::path::Path;

/// Extension used when a MIME type has no known mapping.
pub const DEFAULT_EXTENSION: &str = "bin";

// Preferred extensions where the registry lists several.
const PREFERRED: &[(&str, &str)] = &[
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/gif", "gif"),
    ("image/webp", "webp"),
    ("video/mp4", "mp4"),
    ("video/webm", "webm"),
    ("video/quicktime", "mov"),
    ("audio/mpeg", "mp3"),
    ("audio/ogg", "ogg"),
    ("audio/wav", "wav"),
];

/// Guess a MIME type from a file path's extension.
pub fn guess_from_path(path: &Path) -> Option<String> {
    mime_guess::from_path(path)
        .first()
        .map(|mime| mime.essence_str().to_string())
}

/// File extension for `mime_type`, without the dot.
pub fn extension_for(mime_type: &str) -> &'static str {
    let essence = mime_type
        .split(';')
        .next()
        .unwrap_or(mime_type)
        .trim()
        .to_lowercase();

    PREFERRED
        .iter()
        .find(|(mime, _)| *mime == essence)
        .map(|(_, ext)| *ext)
        .or_else(|| {
            mime_guess::get_mime_extensions_str(&essence).and_then(|exts| exts.first().copied())
        })
        .unwrap_or(DEFAULT_EXTENSION)
}

/// Randomised upload file name, e.g. `tuskupload_1704067200_9f…c1.png`.
pub fn upload_file_name(mime_type: &str, now: DateTime<Utc>) -> String {
    let nonce: u128 = rand::thread_rng().gen();
    format!(
        "tuskupload_{}_{:032x}.{}",
        now.timestamp(),
        nonce,
        extension_for(mime_type)
    )
}
