use std::path::PathBuf;

use secrecy::SecretString;
use serde::Deserialize;

pub const DEFAULT_IMAP_HOST: &str = "imap.gmail.com";
pub const DEFAULT_IMAP_PORT: u16 = 993;
pub const DEFAULT_MAILBOX: &str = "INBOX";
pub const DEFAULT_INCOMING_DIR: &str = "data/incoming";
pub const DEFAULT_PROCESSED_DIR: &str = "data/processed";
pub const DEFAULT_STORE_CONFIG: &str = "config/s3_config.json";

/// Connection parameters for the mail server.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    pub mailbox: String,
    /// Directory attachments are written into.
    pub output_dir: PathBuf,
}

/// Optional search narrowing, applied on top of `UNSEEN`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageFilters {
    pub sender: Option<String>,
    pub subject: Option<String>,
}

impl MessageFilters {
    pub fn new(sender: Option<String>, subject: Option<String>) -> Self {
        // Blank filters behave like absent ones
        Self {
            sender: sender.filter(|s| !s.trim().is_empty()),
            subject: subject.filter(|s| !s.trim().is_empty()),
        }
    }
}

/// Object-store credentials and destination, as stored in the JSON credential file.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(rename = "aws_access_key_id")]
    pub access_key_id: String,

    #[serde(rename = "aws_secret_access_key")]
    pub secret_access_key: SecretString,

    #[serde(rename = "region_name")]
    pub region: String,

    pub bucket: String,

    /// Key prefix uploaded objects are grouped under.
    #[serde(rename = "bucket_key_demanda", default)]
    pub key_prefix: String,

    /// Custom endpoint for S3-compatible stores (MinIO, R2, ...).
    #[serde(default)]
    pub endpoint_url: Option<String>,
}

/// Local directory layout shared by both stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    /// Files waiting to be uploaded.
    pub incoming: PathBuf,
    /// Files that were uploaded successfully.
    pub processed: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Self {
            incoming: PathBuf::from(DEFAULT_INCOMING_DIR),
            processed: PathBuf::from(DEFAULT_PROCESSED_DIR),
        }
    }
}
