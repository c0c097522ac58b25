//! Spoken command parsing

use log::warn;

use crate::models::Category;

/// A command recognized from a spoken transcript
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceCommand {
    /// "inbox"
    ShowInbox,
    /// "received" (also shows the inbox)
    ShowReceived,
    /// "sent"
    ShowSent,
    /// "drafts"
    ShowDrafts,
    /// "read": read the selected email aloud
    ReadAloud,
    /// "summarize": summarize the selected email
    Summarize,
    /// Anything else goes to the assistant
    Query(String),
}

/// Keywords in match priority order. The first keyword found anywhere in
/// the transcript wins, so "read my inbox" is `ShowInbox` and "unread" is
/// `ReadAloud`.
static KEYWORDS: [(&str, VoiceCommand); 6] = [
    ("inbox", VoiceCommand::ShowInbox),
    ("received", VoiceCommand::ShowReceived),
    ("sent", VoiceCommand::ShowSent),
    ("drafts", VoiceCommand::ShowDrafts),
    ("read", VoiceCommand::ReadAloud),
    ("summarize", VoiceCommand::Summarize),
];

impl VoiceCommand {
    /// Parse a transcript. Returns None for an empty transcript.
    pub fn parse(transcript: &str) -> Option<Self> {
        let transcript = transcript.trim();
        if transcript.is_empty() {
            return None;
        }

        let lower = transcript.to_lowercase();
        let mut matches = KEYWORDS.iter().filter(|(keyword, _)| lower.contains(keyword));

        let Some((keyword, command)) = matches.next() else {
            return Some(Self::Query(transcript.to_string()));
        };

        let others: Vec<&str> = matches.map(|(k, _)| *k).collect();
        if !others.is_empty() {
            warn!(
                "Transcript {:?} matches several commands; using {:?}, ignoring {:?}",
                transcript, keyword, others
            );
        }

        Some(command.clone())
    }

    /// Folder this command switches to, if it is a navigation command
    pub fn category(&self) -> Option<Category> {
        match self {
            Self::ShowInbox | Self::ShowReceived => Some(Category::Inbox),
            Self::ShowSent => Some(Category::Sent),
            Self::ShowDrafts => Some(Category::Draft),
            _ => None,
        }
    }

    /// Spoken confirmation for navigation commands
    pub fn announcement(&self) -> Option<&'static str> {
        match self {
            Self::ShowInbox => Some("Showing inbox."),
            Self::ShowReceived => Some("Showing received emails."),
            Self::ShowSent => Some("Showing sent emails."),
            Self::ShowDrafts => Some("Showing drafts."),
            _ => None,
        }
    }
}
