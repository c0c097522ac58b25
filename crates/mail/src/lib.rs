//! Mail crate - Business logic for the Voiceflow Gmail reader
//!
//! This crate provides platform-independent mail functionality including:
//! - Domain models (Email, Mailbox)
//! - Gmail API client, OAuth login and payload decoding
//! - Session storage
//! - Fetch pipeline from Gmail to decoded emails
//! - AI assistant flows (summaries, contextual answers)
//! - Voice command parsing and dispatch
//!
//! This crate has zero UI dependencies.

pub mod assistant;
pub mod config;
pub mod gmail;
pub mod models;
pub mod session;
pub mod sync;
pub mod voice;

pub use assistant::{
    ContextualRequest, ContextualResponse, EmailMetadata, EmailSummary, GeminiModel,
    LanguageModel, contextual_response, summarize_email,
};
pub use config::{CredentialSource, GoogleCredentials, Settings};
pub use gmail::{DecodeError, GmailAuth, GmailClient, MessageSource, UnauthorizedError};
pub use models::{Category, Email, EmailAddress, EmailId, Mailbox, UnreadCounts};
pub use session::{FileSessionStore, InMemorySessionStore, Session, SessionStore};
pub use sync::{FetchError, FetchOptions, FetchOutcome, FetchStats, fetch_emails};
pub use voice::{Speaker, VoiceCommand, VoiceController, read_aloud_text};
