//! Email stage error types.

use serde::Serialize;
use thiserror::Error;

/// Errors that end a fetch run early.
#[derive(Error, Debug)]
pub enum EmailError {
    /// Failed to connect to the IMAP server.
    #[error("IMAP connection failed: {0}")]
    ConnectionFailed(String),

    /// TLS/SSL error during connection.
    #[error("TLS error: {0}")]
    TlsError(String),

    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// IMAP protocol error.
    #[error("IMAP protocol error: {0}")]
    ProtocolError(String),

    /// Mailbox could not be selected.
    #[error("IMAP folder '{0}' not found")]
    FolderNotFound(String),

    /// Failed to parse email message.
    #[error("Failed to parse email: {0}")]
    ParseError(String),

    /// The output directory could not be prepared.
    #[error("Storage error: {0}")]
    Storage(#[from] crate::error::StorageError),
}

impl From<async_native_tls::Error> for EmailError {
    fn from(err: async_native_tls::Error) -> Self {
        EmailError::TlsError(err.to_string())
    }
}

/// A FETCH response that does not carry a usable message.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedFetch {
    #[error("server returned no data for the message")]
    NoData,

    #[error("fetch response has no message body")]
    MissingBody,

    #[error("message body is empty")]
    EmptyBody,
}

/// Result type for email operations.
pub type Result<T> = std::result::Result<T, EmailError>;
