use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info};

use crate::config::{MailConfig, MessageFilters, Paths};
use crate::email::{fetch_csv_attachments, FetchReport, MailConnector};
use crate::error::StorageError;
use crate::storage::ensure_directory;
use crate::upload::{upload_directory, ObjectStore, UploadReport, UploadTarget};

/// Everything one pipeline run did, in a form that can be printed as JSON.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Absent when the download stage did not run or aborted.
    pub fetch: Option<FetchReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetch_error: Option<String>,
    pub upload: Option<UploadReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_error: Option<String>,
}

/// Runs download then upload against injected mail and object-store clients.
pub struct Pipeline<'a> {
    connector: &'a dyn MailConnector,
    store: &'a dyn ObjectStore,
}

impl<'a> Pipeline<'a> {
    pub fn new(connector: &'a dyn MailConnector, store: &'a dyn ObjectStore) -> Self {
        Self { connector, store }
    }

    /// Runs both stages in order.
    ///
    /// A failed download never prevents the upload stage: files left over
    /// from earlier runs still get uploaded.
    pub async fn run(
        &self,
        mail: &MailConfig,
        filters: &MessageFilters,
        target: &UploadTarget,
        paths: &Paths,
    ) -> RunSummary {
        let started_at = Utc::now();

        let (fetch, fetch_error) = match fetch_csv_attachments(self.connector, mail, filters).await {
            Ok(report) => (Some(report), None),
            Err(e) => {
                error!("Download stage aborted: {}", e);
                (None, Some(e.to_string()))
            }
        };

        let (upload, upload_error) =
            match upload_directory(self.store, target, &paths.incoming, &paths.processed).await {
                Ok(report) => (Some(report), None),
                Err(e) => {
                    error!("Upload stage aborted: {}", e);
                    (None, Some(e.to_string()))
                }
            };

        let summary = RunSummary {
            started_at,
            finished_at: Utc::now(),
            fetch,
            fetch_error,
            upload,
            upload_error,
        };

        info!(
            "Run finished: {} downloaded, {} uploaded, {} upload failures",
            summary.fetch.as_ref().map_or(0, |f| f.downloaded),
            summary.upload.as_ref().map_or(0, |u| u.success.len()),
            summary.upload.as_ref().map_or(0, |u| u.failed.len()),
        );

        summary
    }
}

/// Creates the incoming and processed directories if they are missing.
pub fn prepare_directories(paths: &Paths) -> Result<(), StorageError> {
    ensure_directory(&paths.incoming)?;
    ensure_directory(&paths.processed)?;
    Ok(())
}
