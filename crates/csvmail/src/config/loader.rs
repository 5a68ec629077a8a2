use std::path::{Path, PathBuf};

use secrecy::ExposeSecret;
use tracing::{debug, warn};

use crate::config::schema::{
    MailConfig, StoreConfig, DEFAULT_IMAP_HOST, DEFAULT_IMAP_PORT, DEFAULT_MAILBOX,
};
use crate::error::ConfigError;
use crate::secrets::{read_env, resolve_env_secret, SecretError};

pub const ENV_EMAIL_USER: &str = "EMAIL_USER";
pub const ENV_EMAIL_PASS: &str = "EMAIL_PASS";
pub const ENV_IMAP_SERVER: &str = "IMAP_SERVER";
pub const ENV_IMAP_PORT: &str = "IMAP_PORT";

/// Loads variables from a `.env` file in the working directory or one of its
/// parents. Variables already present in the process environment are kept.
///
/// Returns the path of the file that was loaded.
pub fn load_dotenv() -> Option<PathBuf> {
    report_dotenv(dotenvy::dotenv())
}

fn report_dotenv(result: dotenvy::Result<PathBuf>) -> Option<PathBuf> {
    match result {
        Ok(path) => {
            debug!("Loaded environment from {}", path.display());
            Some(path)
        }
        Err(e) if e.not_found() => None,
        Err(e) => {
            warn!("Ignoring unreadable .env file: {}", e);
            None
        }
    }
}

impl MailConfig {
    /// Builds the mail configuration from `EMAIL_USER`, `EMAIL_PASS`
    /// (or `EMAIL_PASS_FILE`), `IMAP_SERVER` and `IMAP_PORT`.
    ///
    /// A missing user or password is a [`ConfigError::MissingCredential`].
    pub fn from_env(output_dir: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let username = read_env(ENV_EMAIL_USER)
            .map_err(|e| ConfigError::Validation {
                message: e.to_string(),
            })?
            .ok_or_else(|| ConfigError::MissingCredential {
                name: ENV_EMAIL_USER.to_string(),
            })?;

        let password = resolve_env_secret(ENV_EMAIL_PASS).map_err(|e| match e {
            SecretError::NoSourceProvided => ConfigError::MissingCredential {
                name: ENV_EMAIL_PASS.to_string(),
            },
            other => ConfigError::Validation {
                message: other.to_string(),
            },
        })?;

        let host = read_env(ENV_IMAP_SERVER)
            .ok()
            .flatten()
            .unwrap_or_else(|| DEFAULT_IMAP_HOST.to_string());

        let port = match read_env(ENV_IMAP_PORT).ok().flatten() {
            Some(raw) => raw.parse::<u16>().map_err(|_| ConfigError::Validation {
                message: format!("{} must be a port number, got '{}'", ENV_IMAP_PORT, raw),
            })?,
            None => DEFAULT_IMAP_PORT,
        };

        Ok(Self {
            host,
            port,
            username,
            password,
            mailbox: DEFAULT_MAILBOX.to_string(),
            output_dir: output_dir.into(),
        })
    }
}

pub fn load_store_config<P: AsRef<Path>>(path: P) -> Result<StoreConfig, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_store_config_from_str(&content)
}

pub fn load_store_config_from_str(content: &str) -> Result<StoreConfig, ConfigError> {
    let config: StoreConfig = serde_json::from_str(content)?;

    validate_store_config(&config)?;

    Ok(config)
}

fn validate_store_config(config: &StoreConfig) -> Result<(), ConfigError> {
    let required = [
        ("aws_access_key_id", config.access_key_id.as_str()),
        (
            "aws_secret_access_key",
            config.secret_access_key.expose_secret(),
        ),
        ("region_name", config.region.as_str()),
        ("bucket", config.bucket.as_str()),
    ];

    for (key, value) in required {
        if value.trim().is_empty() {
            return Err(ConfigError::Validation {
                message: format!("'{}' must not be empty", key),
            });
        }
    }

    if let Some(endpoint) = &config.endpoint_url {
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(ConfigError::Validation {
                message: format!("'endpoint_url' must be an http(s) URL, got '{}'", endpoint),
            });
        }
    }

    Ok(())
}
