//! Gmail API HTTP client
//!
//! Provides methods for listing and fetching messages from the Gmail API.
//! Uses synchronous HTTP (ureq) to be executor-agnostic.

use anyhow::{Context, Result};

use super::api::{GmailMessage, ListMessagesResponse};

/// Error indicating Gmail rejected the access token (HTTP 401)
#[derive(Debug, thiserror::Error)]
#[error("Gmail rejected the access token")]
pub struct UnauthorizedError;

/// Source of Gmail messages
///
/// Implemented by [`GmailClient`] for the real API. The fetch pipeline only
/// depends on this trait, so it can run against canned responses.
pub trait MessageSource: Send + Sync {
    /// List message references matching a Gmail search query
    fn list_messages(
        &self,
        access_token: &str,
        query: &str,
        max_results: usize,
    ) -> Result<ListMessagesResponse>;

    /// Get a full message (`format=full`) by ID
    fn get_message(&self, access_token: &str, id: &str) -> Result<GmailMessage>;
}

/// Gmail API client for fetching messages
#[derive(Debug, Clone, Default)]
pub struct GmailClient;

impl GmailClient {
    /// Gmail API base URL
    const BASE_URL: &'static str = "https://gmail.googleapis.com/gmail/v1";

    pub fn new() -> Self {
        Self
    }

    fn list_url(&self, query: &str, max_results: usize) -> String {
        format!(
            "{}/users/me/messages?maxResults={}&q={}",
            Self::BASE_URL,
            max_results.clamp(1, 500),
            urlencoding::encode(query)
        )
    }

    fn message_url(&self, id: &str) -> String {
        format!(
            "{}/users/me/messages/{}?format=full",
            Self::BASE_URL,
            urlencoding::encode(id)
        )
    }

    /// Issue an authorized GET and parse the JSON response
    fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        access_token: &str,
        what: &str,
    ) -> Result<T> {
        let response = ureq::get(url)
            .header("Authorization", &format!("Bearer {}", access_token))
            .call();

        match response {
            Ok(mut resp) => resp
                .body_mut()
                .read_json()
                .with_context(|| format!("Failed to parse {} response", what)),
            Err(ureq::Error::StatusCode(401)) => Err(UnauthorizedError.into()),
            Err(ureq::Error::StatusCode(code)) => {
                Err(anyhow::anyhow!("Failed to fetch {}: HTTP {}", what, code))
            }
            Err(e) => Err(anyhow::anyhow!("Failed to send {} request: {}", what, e)),
        }
    }
}

impl MessageSource for GmailClient {
    fn list_messages(
        &self,
        access_token: &str,
        query: &str,
        max_results: usize,
    ) -> Result<ListMessagesResponse> {
        self.get_json(&self.list_url(query, max_results), access_token, "message list")
    }

    fn get_message(&self, access_token: &str, id: &str) -> Result<GmailMessage> {
        self.get_json(&self.message_url(id), access_token, "message")
    }
}
