//! CSV attachment download from an IMAP mailbox.
//!
//! [`fetch_csv_attachments`] drives a [`MailSession`] through
//! select → search → fetch → mark-read, writing every CSV attachment it finds
//! into the configured output directory.

pub mod client;
pub mod error;
pub mod fetcher;
pub mod parser;
pub mod query;
pub mod session;

pub use client::{ImapConnector, ImapSession};
pub use error::{EmailError, MalformedFetch};
pub use fetcher::{fetch_csv_attachments, FetchReport, MessageReport, MessageStatus, SavedAttachment};
pub use parser::{extract_csv_attachments, Candidate, ExtractedAttachment, SkipReason, SkippedAttachment};
pub use query::SearchQuery;
pub use session::{FetchResponse, FetchedBody, FetchedItem, MailConnector, MailSession, RawMessage};
