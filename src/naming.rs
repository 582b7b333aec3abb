//! Path normalization and status-key derivation.
//!
//! Status keys must be stable across platforms: the same file referred to
//! with Windows or Unix separators hashes to the same key.

use std::path::Path;

/// Normalize a path to forward-slash form.
///
/// Backslash separators are rewritten to `/`; nothing else is touched (no
/// case folding, no resolution against the filesystem).
pub fn to_slash(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Derive the status key for a path: blake3 of the normalized form,
/// hex-encoded.
pub fn status_key(path: &Path) -> String {
    hex::encode(blake3::hash(to_slash(path).as_bytes()).as_bytes())
}

/// File extension without the leading dot, empty if none.
pub fn extension(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_default()
}
