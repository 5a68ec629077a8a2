//! IMAP SEARCH criteria.

use std::fmt;

use crate::config::MessageFilters;

/// Search criteria: always `UNSEEN`, narrowed by optional sender and subject.
///
/// Terms are joined by spaces, which IMAP treats as a conjunction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    sender: Option<String>,
    subject: Option<String>,
}

impl SearchQuery {
    pub fn unseen() -> Self {
        Self {
            sender: None,
            subject: None,
        }
    }

    pub fn sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = Some(sender.into());
        self
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }
}

impl From<&MessageFilters> for SearchQuery {
    fn from(filters: &MessageFilters) -> Self {
        let mut query = SearchQuery::unseen();
        if let Some(sender) = &filters.sender {
            query = query.sender(sender.clone());
        }
        if let Some(subject) = &filters.subject {
            query = query.subject(subject.clone());
        }
        query
    }
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("UNSEEN")?;
        if let Some(sender) = &self.sender {
            write!(f, " FROM {}", quote(sender))?;
        }
        if let Some(subject) = &self.subject {
            write!(f, " SUBJECT {}", quote(subject))?;
        }
        Ok(())
    }
}

/// Renders an IMAP quoted string, escaping `"` and `\`.
fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}
