//! Document keys
//!
//! A key names one document and maps 1:1 to a backing file. Callers pass
//! strings ("Users", "TeamRole") or integer ids; both end up as a
//! filesystem-safe string.

use std::fmt;

/// The name of a document
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentKey(String);

impl DocumentKey {
    /// Create a key from anything string-like
    pub fn new<S: Into<String>>(key: S) -> Self {
        DocumentKey(key.into())
    }

    /// The key as given by the caller
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// An empty key names no file and cannot be written
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The key with path separators replaced, used as the file stem
    pub fn sanitized(&self) -> String {
        sanitize(&self.0)
    }
}

/// Replace `/` and `\` with `_` so a key can be used as a file name
pub fn sanitize(key: &str) -> String {
    key.replace(['/', '\\'], "_")
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentKey {
    fn from(key: &str) -> Self {
        DocumentKey::new(key)
    }
}

impl From<String> for DocumentKey {
    fn from(key: String) -> Self {
        DocumentKey(key)
    }
}

impl From<&String> for DocumentKey {
    fn from(key: &String) -> Self {
        DocumentKey(key.clone())
    }
}

impl From<&DocumentKey> for DocumentKey {
    fn from(key: &DocumentKey) -> Self {
        key.clone()
    }
}

macro_rules! key_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for DocumentKey {
                fn from(key: $t) -> Self {
                    DocumentKey(key.to_string())
                }
            }
        )*
    };
}

key_from_int!(i32, i64, u32, u64, usize);
