//! In-memory implementations of the mail and object-store seams.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use csvmail::config::MailConfig;
use csvmail::email::error::Result as EmailResult;
use csvmail::email::{EmailError, FetchResponse, MailConnector, MailSession, SearchQuery};
use csvmail::upload::error::Result as UploadResult;
use csvmail::upload::{ObjectStore, UploadError};

#[derive(Debug, Clone)]
pub struct FakeMessage {
    pub response: FetchResponse,
    pub seen: bool,
}

/// How the fake server should misbehave.
#[derive(Debug, Clone, Default)]
pub struct Failures {
    pub connect: bool,
    pub login: bool,
    pub select: bool,
    pub search: bool,
    pub mark_seen: HashSet<u32>,
}

#[derive(Debug, Default)]
pub struct MailboxState {
    pub messages: BTreeMap<u32, FakeMessage>,
    /// Every session command in call order, e.g. `select INBOX`, `fetch 1`.
    pub events: Vec<String>,
    pub failures: Failures,
}

/// A scripted IMAP mailbox shared between the connector and its sessions.
#[derive(Debug, Clone, Default)]
pub struct FakeMailbox {
    state: Arc<Mutex<MailboxState>>,
}

impl FakeMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an unseen message with a well-formed FETCH response.
    pub fn add_message(&self, id: u32, raw: Vec<u8>) {
        self.add_response(id, FetchResponse::single(id, raw));
    }

    /// Adds an unseen message whose FETCH returns exactly `response`.
    pub fn add_response(&self, id: u32, response: FetchResponse) {
        self.state.lock().unwrap().messages.insert(
            id,
            FakeMessage {
                response,
                seen: false,
            },
        );
    }

    pub fn fail(&self, configure: impl FnOnce(&mut Failures)) {
        configure(&mut self.state.lock().unwrap().failures);
    }

    pub fn is_seen(&self, id: u32) -> bool {
        self.state.lock().unwrap().messages[&id].seen
    }

    pub fn events(&self) -> Vec<String> {
        self.state.lock().unwrap().events.clone()
    }

    fn record(&self, event: String) {
        self.state.lock().unwrap().events.push(event);
    }
}

#[async_trait]
impl MailConnector for FakeMailbox {
    async fn connect(&self, config: &MailConfig) -> EmailResult<Box<dyn MailSession>> {
        let failures = self.state.lock().unwrap().failures.clone();
        if failures.connect {
            return Err(EmailError::ConnectionFailed(format!(
                "{}:{} unreachable",
                config.host, config.port
            )));
        }
        if failures.login {
            return Err(EmailError::AuthenticationFailed(
                "[AUTHENTICATIONFAILED] Invalid credentials".to_string(),
            ));
        }
        self.record(format!("login {}", config.username));
        Ok(Box::new(FakeSession {
            mailbox: self.clone(),
        }))
    }
}

pub struct FakeSession {
    mailbox: FakeMailbox,
}

#[async_trait]
impl MailSession for FakeSession {
    async fn select(&mut self, mailbox: &str) -> EmailResult<()> {
        self.mailbox.record(format!("select {}", mailbox));
        if self.mailbox.state.lock().unwrap().failures.select {
            return Err(EmailError::FolderNotFound(mailbox.to_string()));
        }
        Ok(())
    }

    async fn search(&mut self, query: &SearchQuery) -> EmailResult<Vec<u32>> {
        self.mailbox.record(format!("search {}", query));
        let state = self.mailbox.state.lock().unwrap();
        if state.failures.search {
            return Err(EmailError::ProtocolError("BAD search".to_string()));
        }
        Ok(state
            .messages
            .iter()
            .filter(|(_, m)| !m.seen)
            .map(|(id, _)| *id)
            .collect())
    }

    async fn fetch(&mut self, id: u32) -> EmailResult<FetchResponse> {
        self.mailbox.record(format!("fetch {}", id));
        let state = self.mailbox.state.lock().unwrap();
        state
            .messages
            .get(&id)
            .map(|m| m.response.clone())
            .ok_or_else(|| EmailError::ProtocolError(format!("no message {}", id)))
    }

    async fn mark_seen(&mut self, id: u32) -> EmailResult<()> {
        self.mailbox.record(format!("mark_seen {}", id));
        let mut state = self.mailbox.state.lock().unwrap();
        if state.failures.mark_seen.contains(&id) {
            return Err(EmailError::ProtocolError("NO STORE failed".to_string()));
        }
        if let Some(message) = state.messages.get_mut(&id) {
            message.seen = true;
        }
        Ok(())
    }

    async fn close(&mut self) -> EmailResult<()> {
        self.mailbox.record("close".to_string());
        Ok(())
    }

    async fn logout(&mut self) -> EmailResult<()> {
        self.mailbox.record("logout".to_string());
        Ok(())
    }
}

/// An object put into the fake store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bucket: String,
    pub key: String,
    pub content: Vec<u8>,
}

/// Object store that keeps uploads in memory and fails on chosen filenames.
#[derive(Debug, Default)]
pub struct FakeStore {
    failing: HashSet<String>,
    puts: Mutex<Vec<StoredObject>>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uploads of files with this name fail with a network error.
    pub fn failing_on(mut self, filename: &str) -> Self {
        self.failing.insert(filename.to_string());
        self
    }

    pub fn puts(&self) -> Vec<StoredObject> {
        self.puts.lock().unwrap().clone()
    }

    pub fn keys(&self) -> Vec<String> {
        self.puts().into_iter().map(|o| o.key).collect()
    }
}

#[async_trait]
impl ObjectStore for FakeStore {
    async fn upload_file(&self, bucket: &str, key: &str, path: &Path) -> UploadResult<()> {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        if self.failing.contains(filename) {
            return Err(UploadError::Transfer {
                key: key.to_string(),
                message: "connection reset by peer".to_string(),
            });
        }

        let content = std::fs::read(path).map_err(|e| UploadError::Transfer {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        self.puts.lock().unwrap().push(StoredObject {
            bucket: bucket.to_string(),
            key: key.to_string(),
            content,
        });
        Ok(())
    }
}
