//! Upload stage error types.

use std::path::PathBuf;

use thiserror::Error;

use crate::error::StorageError;

#[derive(Error, Debug)]
pub enum UploadError {
    /// The source directory could not be listed; nothing was uploaded.
    #[error("Failed to list '{path}': {source}")]
    ListDirectory {
        path: PathBuf,
        #[source]
        source: StorageError,
    },

    /// The object store rejected or failed the transfer.
    #[error("Upload of '{key}' failed: {message}")]
    Transfer { key: String, message: String },

    /// The local file could not be read or moved.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type Result<T> = std::result::Result<T, UploadError>;
