//! Secret resolution from the process environment.
//!
//! A secret can be supplied in two ways, checked in priority order:
//!
//! 1. **Env var value** - e.g. `EMAIL_PASS=app-password`
//! 2. **File reference** - e.g. `EMAIL_PASS_FILE=/run/secrets/email_pass` (Docker secrets pattern)

use secrecy::SecretString;
use std::fs;

/// Error type for secret resolution failures.
#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("No secret source provided (need a non-empty env var or file path)")]
    NoSourceProvided,

    #[error("Failed to read secret from file '{path}': {source}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Environment variable '{name}' contains invalid UTF-8")]
    EnvVarNotUnicode { name: String },
}

/// Result type for secret resolution.
pub type Result<T> = std::result::Result<T, SecretError>;

/// Resolves a secret from the value of `env_var`, falling back to the
/// contents of the file named by `<env_var>_FILE`.
///
/// Empty values (after trimming) count as absent, so a blank `EMAIL_PASS=`
/// line in the environment does not mask a configured file.
pub fn resolve_env_secret(env_var: &str) -> Result<SecretString> {
    if let Some(value) = read_env(env_var)? {
        return Ok(SecretString::from(value));
    }

    let file_var = format!("{}_FILE", env_var);
    if let Some(path) = read_env(&file_var)? {
        let expanded = expand_home(&path);
        let content = fs::read_to_string(&expanded).map_err(|e| SecretError::FileReadError {
            path: expanded.clone(),
            source: e,
        })?;
        let trimmed = content.trim();
        if !trimmed.is_empty() {
            return Ok(SecretString::from(trimmed.to_string()));
        }
    }

    Err(SecretError::NoSourceProvided)
}

/// Reads a trimmed, non-empty environment variable.
pub fn read_env(name: &str) -> Result<Option<String>> {
    match std::env::var(name) {
        Ok(value) => {
            // Trim whitespace for consistency (env vars may have trailing newlines)
            let trimmed = value.trim();
            if trimmed.is_empty() {
                Ok(None)
            } else {
                Ok(Some(trimmed.to_string()))
            }
        }
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(std::env::VarError::NotUnicode(_)) => Err(SecretError::EnvVarNotUnicode {
            name: name.to_string(),
        }),
    }
}

/// Expands `~` to the user's home directory.
///
/// Only `~` and `~/path` are supported, not `~user/path`.
fn expand_home(path: &str) -> String {
    if path == "~" || path.starts_with("~/") {
        if let Some(home) = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE")) {
            if path == "~" {
                return home.to_string_lossy().into_owned();
            }
            return path.replacen("~", &home.to_string_lossy(), 1);
        }
    }
    path.to_string()
}
