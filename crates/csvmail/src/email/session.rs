//! The mail-server seam used by the fetcher.
//!
//! [`MailConnector`] opens an authenticated session and [`MailSession`] exposes
//! only the IMAP operations the fetcher needs. The production implementation
//! lives in [`super::client`]; tests drive the fetcher through in-memory fakes.

use async_trait::async_trait;

use crate::config::MailConfig;

use super::error::{MalformedFetch, Result};
use super::query::SearchQuery;

/// Body of a single FETCH item as delivered by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchedBody {
    Bytes(Vec<u8>),
    /// Some servers/proxies hand back an already-decoded string.
    Text(String),
}

/// One item of a FETCH response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedItem {
    /// Message sequence number the server attached to this item.
    pub id: u32,
    pub body: Option<FetchedBody>,
}

/// Everything the server returned for a FETCH of a single message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchResponse {
    pub items: Vec<FetchedItem>,
}

impl FetchResponse {
    pub fn single(id: u32, body: Vec<u8>) -> Self {
        Self {
            items: vec![FetchedItem {
                id,
                body: Some(FetchedBody::Bytes(body)),
            }],
        }
    }
}

/// The raw RFC 5322 bytes of a message, validated and ready for MIME parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    pub id: u32,
    pub bytes: Vec<u8>,
}

impl RawMessage {
    /// Validates a FETCH response for message `id`.
    ///
    /// Only the item tagged with `id` is considered. Unsolicited items for
    /// other messages are ignored, and a response with none for `id` is
    /// [`MalformedFetch::NoData`].
    pub fn decode(id: u32, response: FetchResponse) -> std::result::Result<Self, MalformedFetch> {
        let item = response
            .items
            .into_iter()
            .find(|item| item.id == id)
            .ok_or(MalformedFetch::NoData)?;

        let bytes = match item.body {
            Some(FetchedBody::Bytes(bytes)) => bytes,
            Some(FetchedBody::Text(text)) => text.into_bytes(),
            None => return Err(MalformedFetch::MissingBody),
        };

        if bytes.is_empty() {
            return Err(MalformedFetch::EmptyBody);
        }

        Ok(Self { id, bytes })
    }
}

/// An authenticated mail session.
#[async_trait]
pub trait MailSession: Send {
    /// Opens `mailbox` read-write.
    async fn select(&mut self, mailbox: &str) -> Result<()>;

    /// Returns matching message ids in ascending order.
    async fn search(&mut self, query: &SearchQuery) -> Result<Vec<u32>>;

    /// Fetches the full message without setting `\Seen`.
    async fn fetch(&mut self, id: u32) -> Result<FetchResponse>;

    /// Sets `\Seen` on the message.
    async fn mark_seen(&mut self, id: u32) -> Result<()>;

    /// Closes the selected mailbox.
    async fn close(&mut self) -> Result<()>;

    async fn logout(&mut self) -> Result<()>;
}

/// Opens authenticated [`MailSession`]s.
#[async_trait]
pub trait MailConnector: Send + Sync {
    async fn connect(&self, config: &MailConfig) -> Result<Box<dyn MailSession>>;
}
