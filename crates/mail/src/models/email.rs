//! Email model representing one decoded Gmail message

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for an email (Gmail message ID)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmailId(pub String);

impl EmailId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for EmailId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for EmailId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for EmailId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

/// Mailbox folder an email is shown under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Inbox,
    Sent,
    Draft,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Inbox, Category::Sent, Category::Draft];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Inbox => "inbox",
            Category::Sent => "sent",
            Category::Draft => "draft",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An email address with optional display name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailAddress {
    /// Display name (e.g., "Alice Johnson")
    pub name: Option<String>,
    /// Email address (e.g., "alice@example.com")
    pub email: String,
}

impl EmailAddress {
    /// Parse an address from a string like "Alice Johnson <alice@example.com>"
    pub fn parse(s: &str) -> Self {
        let s = s.trim();

        if let Some(angle_start) = s.rfind('<')
            && let Some(angle_end) = s.rfind('>')
            && angle_start < angle_end
        {
            let name = s[..angle_start].trim().trim_matches('"').trim();
            let email = s[angle_start + 1..angle_end].trim();
            return Self {
                name: if name.is_empty() {
                    None
                } else {
                    Some(name.to_string())
                },
                email: email.to_string(),
            };
        }

        Self {
            name: None,
            email: s.to_string(),
        }
    }

    /// Name to show in lists: the display name, falling back to the address
    pub fn short_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.email)
    }
}

/// A decoded email ready for display and for the assistant flows
///
/// Built once per fetched message and held in memory only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Email {
    /// Gmail message ID
    pub id: EmailId,
    /// Decoded From header
    pub from: String,
    /// Decoded To header
    pub to: String,
    /// Decoded Subject header
    pub subject: String,
    /// Plain text body
    pub body: String,
    /// When Gmail received the message
    pub date: DateTime<Utc>,
    /// Folder the email belongs to
    pub category: Category,
    /// Whether the email has been read
    pub read: bool,
}

impl Email {
    /// Create a new email builder
    pub fn builder(id: impl Into<EmailId>) -> EmailBuilder {
        EmailBuilder::new(id.into())
    }

    /// Parsed sender address
    pub fn sender(&self) -> EmailAddress {
        EmailAddress::parse(&self.from)
    }

    /// First `max_chars` characters of the body, whitespace collapsed
    pub fn snippet(&self, max_chars: usize) -> String {
        let collapsed = self.body.split_whitespace().collect::<Vec<_>>().join(" ");
        match collapsed.char_indices().nth(max_chars) {
            Some((idx, _)) => format!("{}...", &collapsed[..idx]),
            None => collapsed,
        }
    }
}

/// Builder for creating Email instances
pub struct EmailBuilder {
    id: EmailId,
    from: String,
    to: String,
    subject: String,
    body: String,
    date: Option<DateTime<Utc>>,
    category: Category,
    read: bool,
}

impl EmailBuilder {
    fn new(id: EmailId) -> Self {
        Self {
            id,
            from: String::new(),
            to: String::new(),
            subject: String::new(),
            body: String::new(),
            date: None,
            category: Category::Inbox,
            read: true,
        }
    }

    pub fn from(mut self, from: impl Into<String>) -> Self {
        self.from = from.into();
        self
    }

    pub fn to(mut self, to: impl Into<String>) -> Self {
        self.to = to.into();
        self
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Set the date from Gmail's `internalDate` (milliseconds since epoch)
    pub fn internal_date(mut self, millis: i64) -> Self {
        self.date = Utc.timestamp_millis_opt(millis).single();
        self
    }

    pub fn category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    pub fn read(mut self, read: bool) -> Self {
        self.read = read;
        self
    }

    pub fn build(self) -> Email {
        Email {
            id: self.id,
            from: self.from,
            to: self.to,
            subject: self.subject,
            body: self.body,
            date: self.date.unwrap_or(DateTime::UNIX_EPOCH),
            category: self.category,
            read: self.read,
        }
    }
}
