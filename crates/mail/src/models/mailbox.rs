//! In-memory mailbox state: loaded emails, current folder and selection

use std::collections::HashMap;

use super::{Category, Email, EmailId};

/// Unread email count per category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnreadCounts {
    pub inbox: usize,
    pub sent: usize,
    pub draft: usize,
}

impl UnreadCounts {
    pub fn get(&self, category: Category) -> usize {
        match category {
            Category::Inbox => self.inbox,
            Category::Sent => self.sent,
            Category::Draft => self.draft,
        }
    }
}

/// Emails loaded for the session plus the reader's view state
#[derive(Debug, Default)]
pub struct Mailbox {
    emails: Vec<Email>,
    category: Category,
    selected: Option<EmailId>,
    summaries: HashMap<EmailId, String>,
}

impl Mailbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all emails, selecting the first inbox email
    pub fn set_emails(&mut self, emails: Vec<Email>) {
        self.selected = emails
            .iter()
            .find(|e| e.category == Category::Inbox)
            .map(|e| e.id.clone());
        self.summaries.clear();
        self.emails = emails;
    }

    pub fn emails(&self) -> &[Email] {
        &self.emails
    }

    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn set_category(&mut self, category: Category) {
        self.category = category;
    }

    /// Emails in the current category, in load order
    pub fn filtered(&self) -> Vec<&Email> {
        self.emails
            .iter()
            .filter(|e| e.category == self.category)
            .collect()
    }

    pub fn unread_counts(&self) -> UnreadCounts {
        let mut counts = UnreadCounts::default();
        for email in self.emails.iter().filter(|e| !e.read) {
            match email.category {
                Category::Inbox => counts.inbox += 1,
                Category::Sent => counts.sent += 1,
                Category::Draft => counts.draft += 1,
            }
        }
        counts
    }

    pub fn get(&self, id: &EmailId) -> Option<&Email> {
        self.emails.iter().find(|e| &e.id == id)
    }

    /// Select an email and mark it read
    ///
    /// Returns false (and leaves the selection alone) for unknown IDs.
    pub fn select(&mut self, id: &EmailId) -> bool {
        let Some(email) = self.emails.iter_mut().find(|e| &e.id == id) else {
            return false;
        };
        email.read = true;
        self.selected = Some(id.clone());
        true
    }

    pub fn selected(&self) -> Option<&Email> {
        self.selected.as_ref().and_then(|id| self.get(id))
    }

    /// Remember the assistant's summary for an email
    pub fn set_summary(&mut self, id: &EmailId, summary: impl Into<String>) {
        self.summaries.insert(id.clone(), summary.into());
    }

    pub fn summary(&self, id: &EmailId) -> Option<&str> {
        self.summaries.get(id).map(String::as_str)
    }
}
