//! The download stage: unseen messages in, CSV files out.

use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::config::{MailConfig, MessageFilters};
use crate::storage::FileStorage;

use super::error::{EmailError, MalformedFetch, Result};
use super::parser::{extract_csv_attachments, Candidate, SkipReason, SkippedAttachment};
use super::query::SearchQuery;
use super::session::{MailConnector, MailSession, RawMessage};

/// A CSV attachment written to the output directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedAttachment {
    pub filename: String,
    pub path: PathBuf,
    pub size: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum MessageStatus {
    /// The message was parsed and its attachments handled.
    Processed,
    /// The FETCH response was unusable; the message was left untouched.
    Skipped(MalformedFetch),
    /// An unexpected error interrupted the message.
    Failed(String),
}

/// What happened to a single message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageReport {
    pub id: u32,
    pub status: MessageStatus,
    pub saved: Vec<SavedAttachment>,
    pub skipped: Vec<SkippedAttachment>,
    pub marked_read: bool,
}

impl MessageReport {
    fn new(id: u32, status: MessageStatus) -> Self {
        Self {
            id,
            status,
            saved: Vec::new(),
            skipped: Vec::new(),
            marked_read: false,
        }
    }

    fn has_write_failures(&self) -> bool {
        self.skipped
            .iter()
            .any(|s| matches!(s.reason, SkipReason::WriteFailed(_)))
    }
}

/// Outcome of a completed fetch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FetchReport {
    pub messages: Vec<MessageReport>,
    /// Number of CSV files written.
    pub downloaded: usize,
}

impl FetchReport {
    pub fn marked_read(&self) -> usize {
        self.messages.iter().filter(|m| m.marked_read).count()
    }

    pub fn message(&self, id: u32) -> Option<&MessageReport> {
        self.messages.iter().find(|m| m.id == id)
    }
}

/// Downloads the CSV attachments of every unseen message matching `filters`
/// into `config.output_dir`, marking each handled message as read.
///
/// Errors returned here are terminal for the run (connect, login, select,
/// search). Anything that goes wrong with a single message or attachment is
/// recorded in the [`FetchReport`] instead.
pub async fn fetch_csv_attachments(
    connector: &dyn MailConnector,
    config: &MailConfig,
    filters: &MessageFilters,
) -> Result<FetchReport> {
    let span = info_span!("fetch_run", host = %config.host, mailbox = %config.mailbox);
    run(connector, config, filters).instrument(span).await
}

async fn run(
    connector: &dyn MailConnector,
    config: &MailConfig,
    filters: &MessageFilters,
) -> Result<FetchReport> {
    let storage = FileStorage::new(&config.output_dir);
    storage.ensure_exists()?;

    let mut session = match connector.connect(config).await {
        Ok(session) => session,
        Err(e) => {
            log_connect_failure(&e);
            return Err(e);
        }
    };

    if let Err(e) = session.select(&config.mailbox).await {
        error!("Could not select mailbox {}: {}", config.mailbox, e);
        logout(session.as_mut()).await;
        return Err(e);
    }

    let query = SearchQuery::from(filters);
    info!("Searching messages with criteria: {}", query);

    let ids = match session.search(&query).await {
        Ok(ids) => ids,
        Err(e) => {
            error!("Search failed: {}", e);
            release(session.as_mut()).await;
            return Err(e);
        }
    };

    let mut report = FetchReport::default();

    if ids.is_empty() {
        info!("No new messages match the search criteria");
        release(session.as_mut()).await;
        return Ok(report);
    }

    info!("Found {} unseen messages", ids.len());

    for id in ids {
        let message = process_message(session.as_mut(), &storage, id)
            .instrument(info_span!("message", id))
            .await;
        report.downloaded += message.saved.len();
        report.messages.push(message);
    }

    info!(
        "Fetch complete: {} CSV attachments downloaded from {} messages",
        report.downloaded,
        report.messages.len()
    );

    release(session.as_mut()).await;
    Ok(report)
}

async fn process_message(
    session: &mut dyn MailSession,
    storage: &FileStorage,
    id: u32,
) -> MessageReport {
    let response = match session.fetch(id).await {
        Ok(response) => response,
        Err(e) => {
            error!("Failed to fetch message {}: {}", id, e);
            return MessageReport::new(id, MessageStatus::Failed(e.to_string()));
        }
    };

    let raw = match RawMessage::decode(id, response) {
        Ok(raw) => raw,
        Err(malformed) => {
            warn!("Skipping message {}: {}", id, malformed);
            return MessageReport::new(id, MessageStatus::Skipped(malformed));
        }
    };

    let candidates = match extract_csv_attachments(&raw) {
        Ok(candidates) => candidates,
        Err(e) => {
            error!("Failed to process message {}: {}", id, e);
            return MessageReport::new(id, MessageStatus::Failed(e.to_string()));
        }
    };

    let mut report = MessageReport::new(id, MessageStatus::Processed);

    for candidate in candidates {
        match candidate {
            Candidate::Ready(attachment) => {
                match storage.write(&attachment.filename, &attachment.content) {
                    Ok(path) => {
                        info!(
                            "Downloaded {} ({:.2} KB)",
                            attachment.filename,
                            attachment.content.len() as f64 / 1024.0
                        );
                        report.saved.push(SavedAttachment {
                            filename: attachment.filename,
                            path,
                            size: attachment.content.len(),
                        });
                    }
                    Err(e) => {
                        error!("Failed to save {}: {}", attachment.filename, e);
                        report.skipped.push(SkippedAttachment {
                            filename: attachment.filename,
                            reason: SkipReason::WriteFailed(e.to_string()),
                        });
                    }
                }
            }
            Candidate::Skipped(skipped) => report.skipped.push(skipped),
        }
    }

    if report.has_write_failures() {
        warn!(
            "Leaving message {} unread because an attachment could not be saved",
            id
        );
        return report;
    }

    match session.mark_seen(id).await {
        Ok(()) => {
            debug!("Marked message {} as read", id);
            report.marked_read = true;
        }
        Err(e) => {
            error!("Failed to mark message {} as read: {}", id, e);
            report.status = MessageStatus::Failed(e.to_string());
        }
    }

    report
}

fn log_connect_failure(err: &EmailError) {
    match err {
        EmailError::AuthenticationFailed(_) => {
            error!("Login failed: {}", err);
            error!("Things to check:");
            error!("1. IMAP access is enabled in the mailbox settings (Gmail: Settings > Forwarding and POP/IMAP)");
            error!("2. New accounts (under an hour old) may need ~30 minutes before IMAP logins work");
            error!("3. Use an app password (myaccount.google.com/apppasswords, requires 2FA)");
            error!("4. EMAIL_USER and EMAIL_PASS hold the right values");
        }
        _ => error!("Failed to connect to the IMAP server: {}", err),
    }
}

/// Closes the selected mailbox and logs out. Failures are only logged.
async fn release(session: &mut dyn MailSession) {
    if let Err(e) = session.close().await {
        warn!("Failed to close mailbox: {}", e);
    }
    logout(session).await;
}

async fn logout(session: &mut dyn MailSession) {
    if let Err(e) = session.logout().await {
        warn!("Failed to log out: {}", e);
    }
}
