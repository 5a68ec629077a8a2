//! The upload stage: incoming files to the object store, then to `processed`.

use std::path::Path;

use serde::Serialize;
use tracing::{error, info, info_span, Instrument};

use crate::config::StoreConfig;
use crate::storage::{FileStorage, ListedFile};

use super::error::{Result, UploadError};
use super::store::{object_key, ObjectStore};

const NON_UTF8_NAME: &str = "non UTF-8 file name";

/// Where uploaded files go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTarget {
    pub bucket: String,
    pub key_prefix: String,
}

impl From<&StoreConfig> for UploadTarget {
    fn from(config: &StoreConfig) -> Self {
        Self {
            bucket: config.bucket.clone(),
            key_prefix: config.key_prefix.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedUpload {
    pub file: String,
    pub error: String,
}

/// Per-file outcome of an upload run.
///
/// Every file present when the run started appears in exactly one list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UploadReport {
    pub success: Vec<String>,
    pub failed: Vec<FailedUpload>,
}

impl UploadReport {
    pub fn total(&self) -> usize {
        self.success.len() + self.failed.len()
    }
}

/// Uploads every file in `source` to `target`, moving each uploaded file
/// into `destination`.
///
/// Files are handled one at a time in name order. A failed upload or move is
/// recorded and the run continues with the next file; the failed file stays
/// in `source`. A file whose name is not valid UTF-8 is recorded as failed
/// without being uploaded. Only a failure to list `source` is returned as an
/// error.
pub async fn upload_directory(
    store: &dyn ObjectStore,
    target: &UploadTarget,
    source: &Path,
    destination: &Path,
) -> Result<UploadReport> {
    let span = info_span!("upload_run", bucket = %target.bucket);
    run(store, target, source, destination).instrument(span).await
}

async fn run(
    store: &dyn ObjectStore,
    target: &UploadTarget,
    source: &Path,
    destination: &Path,
) -> Result<UploadReport> {
    let incoming = FileStorage::new(source);
    let processed = FileStorage::new(destination);

    let files = incoming
        .list_files()
        .map_err(|e| UploadError::ListDirectory {
            path: source.to_path_buf(),
            source: e,
        })?;

    let mut report = UploadReport::default();

    if files.is_empty() {
        info!("No files to upload");
        return Ok(report);
    }

    info!("Uploading {} files to bucket {}", files.len(), target.bucket);

    for file in files {
        let name = match file {
            ListedFile::Named(name) => name,
            ListedFile::NonUtf8(lossy) => {
                error!("Cannot upload {}: {}", lossy, NON_UTF8_NAME);
                report.failed.push(FailedUpload {
                    file: lossy,
                    error: NON_UTF8_NAME.to_string(),
                });
                continue;
            }
        };
        let key = object_key(&target.key_prefix, &name);

        match upload_one(store, target, &key, &incoming, &processed, &name).await {
            Ok(()) => {
                info!("Uploaded {} to s3://{}/{}", name, target.bucket, key);
                report.success.push(name);
            }
            Err(e) => {
                error!("Failed to upload {}: {}", name, e);
                report.failed.push(FailedUpload {
                    file: name,
                    error: e.to_string(),
                });
            }
        }
    }

    info!(
        "Upload complete: {} succeeded, {} failed",
        report.success.len(),
        report.failed.len()
    );
    Ok(report)
}

async fn upload_one(
    store: &dyn ObjectStore,
    target: &UploadTarget,
    key: &str,
    incoming: &FileStorage,
    processed: &FileStorage,
    name: &str,
) -> Result<()> {
    let path = incoming.directory().join(name);
    store.upload_file(&target.bucket, key, &path).await?;
    incoming.move_to(name, processed)?;
    Ok(())
}
