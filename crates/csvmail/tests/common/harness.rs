//! Test harness for isolated test execution.
//!
//! The `TestHarness` struct owns a temporary directory with the incoming and
//! processed subdirectories and builds configuration values pointing at them.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use secrecy::SecretString;
use tempfile::TempDir;

use csvmail::config::{MailConfig, Paths};
use csvmail::upload::UploadTarget;

pub const BUCKET: &str = "demand-bucket";
pub const KEY_PREFIX: &str = "demanda";

pub struct TestHarness {
    temp_dir: TempDir,
    pub incoming: PathBuf,
    pub processed: PathBuf,
}

impl TestHarness {
    /// Create a harness; neither data directory exists yet.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let incoming = temp_dir.path().join("data").join("incoming");
        let processed = temp_dir.path().join("data").join("processed");

        Self {
            temp_dir,
            incoming,
            processed,
        }
    }

    /// Create a harness with both data directories in place.
    pub fn with_directories() -> Self {
        let harness = Self::new();
        std::fs::create_dir_all(&harness.incoming).expect("Failed to create incoming dir");
        std::fs::create_dir_all(&harness.processed).expect("Failed to create processed dir");
        harness
    }

    pub fn temp_path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn mail_config(&self) -> MailConfig {
        MailConfig {
            host: "imap.example.com".to_string(),
            port: 993,
            username: "reports@example.com".to_string(),
            password: SecretString::from("app-password"),
            mailbox: "INBOX".to_string(),
            output_dir: self.incoming.clone(),
        }
    }

    pub fn paths(&self) -> Paths {
        Paths {
            incoming: self.incoming.clone(),
            processed: self.processed.clone(),
        }
    }

    pub fn target(&self) -> UploadTarget {
        UploadTarget {
            bucket: BUCKET.to_string(),
            key_prefix: KEY_PREFIX.to_string(),
        }
    }

    /// Write a file into the incoming directory.
    pub fn write_incoming(&self, filename: &str, content: &[u8]) -> PathBuf {
        std::fs::create_dir_all(&self.incoming).expect("Failed to create incoming dir");
        let path = self.incoming.join(filename);
        std::fs::write(&path, content).expect("Failed to write incoming file");
        path
    }

    pub fn incoming_files(&self) -> Vec<String> {
        list(&self.incoming)
    }

    pub fn processed_files(&self) -> Vec<String> {
        list(&self.processed)
    }

    pub fn read_incoming(&self, filename: &str) -> Vec<u8> {
        std::fs::read(self.incoming.join(filename)).expect("Failed to read incoming file")
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

fn list(dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .filter_map(|e| e.file_name().to_str().map(str::to_string))
        .collect();
    names.sort();
    names
}
