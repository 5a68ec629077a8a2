//! The object-store seam used by the uploader.

use std::path::Path;

use async_trait::async_trait;

use super::error::Result;

/// Destination for uploaded files.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Uploads the file at `path` to `bucket`/`key`, replacing any existing object.
    async fn upload_file(&self, bucket: &str, key: &str, path: &Path) -> Result<()>;
}

/// Builds the object key for `filename` under `prefix`.
///
/// Trailing slashes on the prefix are ignored; an empty prefix yields the bare
/// filename.
pub fn object_key(prefix: &str, filename: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        filename.to_string()
    } else {
        format!("{}/{}", prefix, filename)
    }
}
