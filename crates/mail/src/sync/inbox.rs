//! Inbox fetch implementation

use log::{debug, info, warn};
use rayon::prelude::*;

use crate::config::Settings;
use crate::gmail::api::MessageRef;
use crate::gmail::{MessageSource, UnauthorizedError, normalize_message};
use crate::models::Email;
use crate::session::SessionStore;

/// Options for a fetch
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Gmail search query
    pub query: String,
    /// Maximum number of messages to list
    pub max_results: usize,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

impl From<&Settings> for FetchOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            query: settings.query.clone(),
            max_results: settings.max_results,
        }
    }
}

/// Statistics from a fetch operation
#[derive(Debug, Default, Clone)]
pub struct FetchStats {
    /// Number of message references listed by Gmail
    pub messages_listed: usize,
    /// Number of messages decoded into emails
    pub messages_decoded: usize,
    /// Number of messages dropped (fetch or decode failure)
    pub messages_dropped: usize,
    /// Duration of the fetch operation
    pub duration_ms: u64,
}

/// Emails from a fetch, newest first
#[derive(Debug, Default)]
pub struct FetchOutcome {
    pub emails: Vec<Email>,
    pub stats: FetchStats,
}

/// Why a fetch produced no emails at all
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// No valid session, or Gmail rejected the token. The session has been cleared.
    #[error("not signed in or session expired")]
    Unauthorized,

    /// Listing messages failed
    #[error("failed to fetch message list: {0:#}")]
    FetchFailed(anyhow::Error),

    /// Reading or clearing the session failed
    #[error("session store error: {0:#}")]
    Session(anyhow::Error),
}

/// Fetch recent emails for the signed-in user
///
/// Messages are fetched in parallel. A message that cannot be fetched or
/// decoded is dropped without failing the batch.
pub fn fetch_emails(
    source: &dyn MessageSource,
    sessions: &dyn SessionStore,
    options: &FetchOptions,
) -> Result<FetchOutcome, FetchError> {
    let start = std::time::Instant::now();
    let mut stats = FetchStats::default();

    let Some(session) = sessions.get_session().map_err(FetchError::Session)? else {
        info!("No session found, sign in required");
        return Err(FetchError::Unauthorized);
    };
    let token = session.access_token.as_str();

    // 1. List message IDs
    let list = match source.list_messages(token, &options.query, options.max_results) {
        Ok(list) => list,
        Err(e) if e.downcast_ref::<UnauthorizedError>().is_some() => {
            warn!("Access token rejected, clearing session");
            sessions.clear_session().map_err(FetchError::Session)?;
            return Err(FetchError::Unauthorized);
        }
        Err(e) => {
            warn!("Failed to fetch email list: {:#}", e);
            return Err(FetchError::FetchFailed(e));
        }
    };

    let refs: Vec<MessageRef> = list.messages.unwrap_or_default();
    stats.messages_listed = refs.len();

    if refs.is_empty() {
        info!("No new messages found");
        stats.duration_ms = start.elapsed().as_millis() as u64;
        return Ok(FetchOutcome {
            emails: Vec::new(),
            stats,
        });
    }

    // 2. Fetch and decode each message
    let mut emails: Vec<Email> = refs
        .par_iter()
        .filter_map(|msg_ref| fetch_one(source, token, msg_ref))
        .collect();

    // 3. Newest first
    emails.sort_by(|a, b| b.date.cmp(&a.date));

    stats.messages_decoded = emails.len();
    stats.messages_dropped = stats.messages_listed - stats.messages_decoded;
    stats.duration_ms = start.elapsed().as_millis() as u64;

    info!(
        "Fetched {} emails ({} dropped) in {}ms",
        stats.messages_decoded, stats.messages_dropped, stats.duration_ms
    );

    Ok(FetchOutcome { emails, stats })
}

/// Fetch and normalize one message, or None if it must be dropped
fn fetch_one(source: &dyn MessageSource, token: &str, msg_ref: &MessageRef) -> Option<Email> {
    let id = msg_ref.id.as_deref().filter(|id| !id.is_empty())?;

    let message = match source.get_message(token, id) {
        Ok(message) => message,
        Err(e) => {
            warn!("Failed to fetch email {}: {:#}", id, e);
            return None;
        }
    };

    match normalize_message(message) {
        Ok(email) => {
            debug!("Decoded email {}", id);
            Some(email)
        }
        Err(e) => {
            warn!("Dropping email {}: {:#}", id, e);
            None
        }
    }
}
