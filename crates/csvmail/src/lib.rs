pub mod config;
pub mod email;
pub mod error;
pub mod pipeline;
pub mod sanitize;
pub mod secrets;
pub mod storage;
pub mod upload;

pub use config::{load_store_config, MailConfig, MessageFilters, Paths, StoreConfig};
pub use email::{fetch_csv_attachments, EmailError, FetchReport, ImapConnector};
pub use error::{ConfigError, CsvMailError, Result, StorageError};
pub use pipeline::{Pipeline, RunSummary};
pub use upload::{upload_directory, S3Store, UploadError, UploadReport, UploadTarget};
