//! Builders for raw email messages used as fake mailbox content.

#![allow(dead_code)]

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

const BOUNDARY: &str = "csvmail-test-boundary";

struct Attachment {
    /// Raw `filename` parameter value, already encoded if needed.
    filename: String,
    content_type: String,
    content: Vec<u8>,
}

/// Builds a multipart/mixed message with a text body and any number of
/// base64-encoded attachments.
pub struct MessageBuilder {
    from: String,
    subject: String,
    body: String,
    attachments: Vec<Attachment>,
}

impl MessageBuilder {
    pub fn new() -> Self {
        Self {
            from: "reports@example.com".to_string(),
            subject: "Weekly demand".to_string(),
            body: "Please find the files attached.".to_string(),
            attachments: Vec::new(),
        }
    }

    pub fn from(mut self, from: &str) -> Self {
        self.from = from.to_string();
        self
    }

    pub fn subject(mut self, subject: &str) -> Self {
        self.subject = subject.to_string();
        self
    }

    pub fn body(mut self, body: &str) -> Self {
        self.body = body.to_string();
        self
    }

    /// Adds an attachment with a plain ASCII filename.
    pub fn attachment(self, filename: &str, content: &[u8]) -> Self {
        self.attachment_with_type(filename, "application/octet-stream", content)
    }

    pub fn attachment_with_type(mut self, filename: &str, content_type: &str, content: &[u8]) -> Self {
        self.attachments.push(Attachment {
            filename: filename.to_string(),
            content_type: content_type.to_string(),
            content: content.to_vec(),
        });
        self
    }

    /// Adds an attachment whose filename is sent as an RFC 2047 UTF-8 encoded-word.
    pub fn encoded_attachment(self, filename: &str, content: &[u8]) -> Self {
        let encoded = format!("=?UTF-8?B?{}?=", STANDARD.encode(filename.as_bytes()));
        self.attachment(&encoded, content)
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = String::new();
        out.push_str(&format!("From: {}\r\n", self.from));
        out.push_str("To: inbox@example.com\r\n");
        out.push_str(&format!("Subject: {}\r\n", self.subject));
        out.push_str("Date: Mon, 6 Jan 2025 09:00:00 +0000\r\n");
        out.push_str("Message-ID: <test@example.com>\r\n");
        out.push_str("MIME-Version: 1.0\r\n");

        if self.attachments.is_empty() {
            out.push_str("Content-Type: text/plain; charset=utf-8\r\n\r\n");
            out.push_str(&self.body);
            out.push_str("\r\n");
            return out.into_bytes();
        }

        out.push_str(&format!(
            "Content-Type: multipart/mixed; boundary=\"{}\"\r\n\r\n",
            BOUNDARY
        ));

        out.push_str(&format!("--{}\r\n", BOUNDARY));
        out.push_str("Content-Type: text/plain; charset=utf-8\r\n\r\n");
        out.push_str(&self.body);
        out.push_str("\r\n");

        for attachment in &self.attachments {
            out.push_str(&format!("--{}\r\n", BOUNDARY));
            out.push_str(&format!(
                "Content-Type: {}; name=\"{}\"\r\n",
                attachment.content_type, attachment.filename
            ));
            out.push_str(&format!(
                "Content-Disposition: attachment; filename=\"{}\"\r\n",
                attachment.filename
            ));
            out.push_str("Content-Transfer-Encoding: base64\r\n\r\n");
            let encoded = STANDARD.encode(&attachment.content);
            if encoded.is_empty() {
                out.push_str("\r\n");
            }
            for line in encoded.as_bytes().chunks(76) {
                out.push_str(std::str::from_utf8(line).unwrap());
                out.push_str("\r\n");
            }
        }

        out.push_str(&format!("--{}--\r\n", BOUNDARY));
        out.into_bytes()
    }
}

impl Default for MessageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Deterministic CSV content of exactly `len` bytes.
pub fn csv_bytes(len: usize) -> Vec<u8> {
    let row = b"2025-01-06,widget,42\n";
    row.iter().copied().cycle().take(len).collect()
}
