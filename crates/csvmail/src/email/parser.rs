//! MIME walking and CSV attachment extraction.

use mail_parser::decoders::base64::base64_decode;
use mail_parser::decoders::quoted_printable::quoted_printable_decode;
use mail_parser::{Encoding, Message, MessageParser, MessagePart, MimeHeaders, PartType};
use serde::Serialize;
use tracing::{debug, warn};

use crate::sanitize::sanitize_filename;

use super::error::{EmailError, Result};
use super::session::RawMessage;

const CSV_EXTENSION: &str = ".csv";

/// A CSV attachment ready to be written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedAttachment {
    /// Id of the message this attachment came from.
    pub message_id: u32,
    /// Decoded filename as it appeared in the message.
    pub original_name: String,
    /// Filename safe to join onto the output directory.
    pub filename: String,
    pub content: Vec<u8>,
}

/// Why a CSV attachment did not produce a local file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    /// The decoded payload was zero bytes long.
    EmptyPayload,
    /// The part has no leaf payload, or its transfer encoding is corrupt.
    Undecodable,
    /// Writing the payload to disk failed.
    WriteFailed(String),
}

/// A CSV attachment that was found but not saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedAttachment {
    pub filename: String,
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// Outcome of inspecting one CSV candidate part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Candidate {
    Ready(ExtractedAttachment),
    Skipped(SkippedAttachment),
}

/// Extracts CSV attachments from a raw message.
///
/// Every part is visited, including the parts of embedded `message/rfc822`
/// attachments. Non-CSV parts are ignored silently; CSV parts that cannot be
/// saved are returned as [`Candidate::Skipped`].
pub fn extract_csv_attachments(raw: &RawMessage) -> Result<Vec<Candidate>> {
    let message = MessageParser::default()
        .parse(raw.bytes.as_slice())
        .ok_or_else(|| EmailError::ParseError(format!("message {} is not valid MIME", raw.id)))?;

    debug!(
        "Parsing message {} subject={:?}",
        raw.id,
        message.subject().unwrap_or("(no subject)")
    );

    let mut candidates = Vec::new();
    walk(&message, raw.id, &mut candidates);

    debug!(
        "Found {} CSV candidates in message {}",
        candidates.len(),
        raw.id
    );
    Ok(candidates)
}

fn walk(message: &Message<'_>, message_id: u32, candidates: &mut Vec<Candidate>) {
    for part in message.parts.iter() {
        if is_attachment(part) {
            if let Some(name) = part.attachment_name() {
                if is_csv(name) {
                    candidates.push(inspect(part, &message.raw_message, name, message_id));
                } else {
                    debug!("Ignoring non-CSV attachment '{}'", name);
                }
            }
        }

        if let PartType::Message(nested) = &part.body {
            walk(nested, message_id, candidates);
        }
    }
}

/// A part is an attachment candidate when it is marked as one or carries a filename.
fn is_attachment(part: &MessagePart<'_>) -> bool {
    let disposition_attachment = part
        .content_disposition()
        .is_some_and(|d| d.ctype().eq_ignore_ascii_case("attachment"));

    disposition_attachment || part.attachment_name().is_some()
}

fn is_csv(name: &str) -> bool {
    name.to_lowercase().ends_with(CSV_EXTENSION)
}

fn inspect(part: &MessagePart<'_>, raw_message: &[u8], name: &str, message_id: u32) -> Candidate {
    let filename = sanitize_filename(name);

    let content = match &part.body {
        PartType::Binary(data) | PartType::InlineBinary(data) => Some(data.to_vec()),
        // mail-parser converts text parts to UTF-8; the file must keep the sender's bytes
        PartType::Text(_) | PartType::Html(_) => transfer_decoded(part, raw_message),
        PartType::Message(_) | PartType::Multipart(_) => None,
    };

    let Some(content) = content else {
        warn!(
            "Attachment '{}' in message {} has no decodable payload",
            filename, message_id
        );
        return Candidate::Skipped(SkippedAttachment {
            filename,
            reason: SkipReason::Undecodable,
        });
    };

    if content.is_empty() {
        warn!(
            "Attachment '{}' in message {} has an empty payload",
            filename, message_id
        );
        return Candidate::Skipped(SkippedAttachment {
            filename,
            reason: SkipReason::EmptyPayload,
        });
    }

    Candidate::Ready(ExtractedAttachment {
        message_id,
        original_name: name.to_string(),
        filename,
        content,
    })
}

/// Returns the body of `part` with only its Content-Transfer-Encoding undone.
fn transfer_decoded(part: &MessagePart<'_>, raw_message: &[u8]) -> Option<Vec<u8>> {
    let body = raw_message.get(part.raw_body_offset() as usize..part.raw_end_offset() as usize)?;

    if part.is_encoding_problem {
        return Some(body.to_vec());
    }

    match part.encoding {
        Encoding::Base64 => base64_decode(body),
        Encoding::QuotedPrintable => quoted_printable_decode(body),
        Encoding::None => Some(body.to_vec()),
    }
}
