//! IMAP client for connecting to email servers.

use async_imap::error::Error as ImapError;
use async_imap::Session;
use async_native_tls::TlsConnector;
use async_trait::async_trait;
use futures_util::StreamExt;
use log::{debug, info};
use secrecy::ExposeSecret;

use crate::config::MailConfig;

use super::error::{EmailError, Result};
use super::query::SearchQuery;
use super::session::{FetchResponse, FetchedBody, FetchedItem, MailConnector, MailSession};

/// Type alias for the underlying async stream (using async-std compatible TcpStream).
type AsyncTcpStream = async_io::Async<std::net::TcpStream>;

/// Type alias for the TLS stream used by the IMAP session.
type TlsStream = async_native_tls::TlsStream<AsyncTcpStream>;

/// Opens TLS IMAP sessions authenticated with LOGIN.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImapConnector;

#[async_trait]
impl MailConnector for ImapConnector {
    async fn connect(&self, config: &MailConfig) -> Result<Box<dyn MailSession>> {
        let addr = format!("{}:{}", config.host, config.port);
        info!("Connecting to IMAP server at {}", addr);

        // Establish TCP connection using std::net and wrap with async-io
        let std_stream = std::net::TcpStream::connect(&addr)
            .map_err(|e| EmailError::ConnectionFailed(e.to_string()))?;
        std_stream
            .set_nonblocking(true)
            .map_err(|e| EmailError::ConnectionFailed(e.to_string()))?;
        let tcp_stream = async_io::Async::new(std_stream)
            .map_err(|e| EmailError::ConnectionFailed(e.to_string()))?;

        let tls = TlsConnector::new();
        let tls_stream = tls.connect(&config.host, tcp_stream).await?;

        let client = async_imap::Client::new(tls_stream);
        info!("Connected to IMAP server {}", config.host);

        let session = client
            .login(&config.username, config.password.expose_secret())
            .await
            .map_err(|(e, _)| EmailError::AuthenticationFailed(e.to_string()))?;

        info!("Logged in as {}", config.username);
        Ok(Box::new(ImapSession { session }))
    }
}

/// A logged-in IMAP session.
pub struct ImapSession {
    session: Session<TlsStream>,
}

#[async_trait]
impl MailSession for ImapSession {
    async fn select(&mut self, mailbox: &str) -> Result<()> {
        info!("Selecting folder: {}", mailbox);

        let selected = self
            .session
            .select(mailbox)
            .await
            .map_err(|e| select_error(mailbox, e))?;

        debug!("Folder '{}' holds {} messages", mailbox, selected.exists);
        Ok(())
    }

    async fn search(&mut self, query: &SearchQuery) -> Result<Vec<u32>> {
        let query = query.to_string();
        debug!("Searching with query: {}", query);

        let ids = self
            .session
            .search(&query)
            .await
            .map_err(|e| EmailError::ProtocolError(e.to_string()))?;

        // SEARCH results are an unordered set
        let mut ids: Vec<u32> = ids.into_iter().collect();
        ids.sort_unstable();
        debug!("Found {} messages matching search", ids.len());
        Ok(ids)
    }

    async fn fetch(&mut self, id: u32) -> Result<FetchResponse> {
        debug!("Fetching message {}", id);

        // BODY.PEEK[] leaves \Seen untouched; the flag is set explicitly later
        let mut messages = self
            .session
            .fetch(id.to_string(), "BODY.PEEK[]")
            .await
            .map_err(|e| EmailError::ProtocolError(e.to_string()))?;

        let mut items = Vec::new();
        while let Some(message_result) = messages.next().await {
            let message = message_result.map_err(|e| EmailError::ProtocolError(e.to_string()))?;
            items.push(FetchedItem {
                id: message.message,
                body: message.body().map(|b| FetchedBody::Bytes(b.to_vec())),
            });
        }

        Ok(FetchResponse { items })
    }

    async fn mark_seen(&mut self, id: u32) -> Result<()> {
        let mut updates = self
            .session
            .store(id.to_string(), "+FLAGS (\\Seen)")
            .await
            .map_err(|e| EmailError::ProtocolError(e.to_string()))?;

        // Drain the untagged FETCH responses so the session is ready for the next command
        while let Some(update) = updates.next().await {
            if let Err(e) = update {
                return Err(EmailError::ProtocolError(e.to_string()));
            }
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.session
            .close()
            .await
            .map_err(|e| EmailError::ProtocolError(e.to_string()))
    }

    async fn logout(&mut self) -> Result<()> {
        info!("Disconnecting from IMAP server");
        self.session
            .logout()
            .await
            .map_err(|e| EmailError::ProtocolError(e.to_string()))
    }
}

/// A tagged NO to SELECT means the mailbox is missing or not selectable.
fn select_error(mailbox: &str, err: ImapError) -> EmailError {
    match err {
        ImapError::No(_) => EmailError::FolderNotFound(mailbox.to_string()),
        other => EmailError::ProtocolError(other.to_string()),
    }
}
