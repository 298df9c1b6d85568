//! Object-store key derivation for article attachments.
//!
//! Keys are a random UUIDv4 followed by the original file's extension. The
//! user-supplied file name never reaches the object store, so two uploads of
//! `photo.png` cannot collide and a crafted name cannot inject path segments.

use std::fmt;

use uuid::Uuid;

/// Longest extension (without the dot) carried over into a key.
const MAX_EXTENSION_LEN: usize = 16;

/// An opaque, globally unique object-store key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey(String);

impl StorageKey {
    /// Derive a fresh key for an upload named `original_name`.
    ///
    /// The extension is lowercased and kept only if it is short and purely
    /// ASCII alphanumeric; otherwise the key has no extension.
    pub fn derive(original_name: &str) -> Self {
        let token = Uuid::new_v4();
        match extension_of(original_name) {
            Some(ext) => Self(format!("{token}.{ext}")),
            None => Self(token.to_string()),
        }
    }

    /// Wrap a key that was previously derived and persisted.
    pub fn from_stored(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for StorageKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Extract a safe, lowercased extension from the final path component.
fn extension_of(original_name: &str) -> Option<String> {
    let file_name = original_name
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or(original_name);
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || ext.len() > MAX_EXTENSION_LEN {
        return None;
    }
    if !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}
