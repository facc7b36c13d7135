//! Descriptive metadata of one stored file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata returned for a file after a write or a lookup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceMetadata {
    /// Logical path inside the edition, without a leading slash.
    pub path: String,
    /// File name: the last path segment.
    pub name: String,
    /// Lowercase hex digest of the content.
    pub digest: String,
    /// Digest algorithm name.
    pub digest_method: String,
    /// Content length in bytes.
    pub size: u64,
    /// Last modification time reported by the backend.
    pub last_modified: DateTime<Utc>,
    /// Declared MIME type.
    pub mime_type: String,
}

impl ResourceMetadata {
    /// Build metadata for `path`, deriving `name` from its last segment.
    pub fn new(
        path: impl Into<String>,
        digest: impl Into<String>,
        digest_method: impl Into<String>,
        size: u64,
        last_modified: DateTime<Utc>,
        mime_type: impl Into<String>,
    ) -> Self {
        let path = path.into();
        let name = path
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or("")
            .to_string();
        Self {
            path,
            name,
            digest: digest.into(),
            digest_method: digest_method.into(),
            size,
            last_modified,
            mime_type: mime_type.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_is_last_segment() {
        let meta = ResourceMetadata::new(
            "dir/sub/a.txt",
            "ab12",
            "BLAKE3",
            5,
            Utc::now(),
            "text/plain",
        );
        assert_eq!(meta.name, "a.txt");
    }

    #[test]
    fn folder_path_names_the_folder() {
        let meta =
            ResourceMetadata::new("dir/sub/", "", "BLAKE3", 0, Utc::now(), "text/plain");
        assert_eq!(meta.name, "sub");
    }
}
