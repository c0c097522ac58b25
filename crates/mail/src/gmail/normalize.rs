//! Gmail API response normalization
//!
//! Converts Gmail API messages to decoded [`Email`] models.

use anyhow::{Context, Result};

use super::api::GmailMessage;
use super::decode::{extract_body, get_header};
use crate::models::{Category, Email, EmailId};

/// Gmail label marking a message as unread
const UNREAD_LABEL: &str = "UNREAD";

/// Normalize a Gmail API message to an [`Email`]
///
/// Fails when the message lacks an ID, an internal date or payload headers,
/// or when its body data is not valid base64url. Header decoding itself
/// never fails.
pub fn normalize_message(gmail_msg: GmailMessage) -> Result<Email> {
    let id = gmail_msg.id.context("Message has no id")?;

    let internal_date: i64 = gmail_msg
        .internal_date
        .as_deref()
        .with_context(|| format!("Message {} has no internalDate", id))?
        .parse()
        .with_context(|| format!("Message {} has an invalid internalDate", id))?;

    let payload = gmail_msg
        .payload
        .as_ref()
        .with_context(|| format!("Message {} has no payload", id))?;
    let headers = payload
        .headers
        .as_deref()
        .with_context(|| format!("Message {} has no headers", id))?;

    let body = extract_body(payload)
        .with_context(|| format!("Failed to decode body of message {}", id))?;

    let read = !gmail_msg
        .label_ids
        .as_ref()
        .is_some_and(|labels| labels.iter().any(|l| l == UNREAD_LABEL));

    Ok(Email::builder(EmailId::new(id))
        .from(get_header(headers, "From"))
        .to(get_header(headers, "To"))
        .subject(get_header(headers, "Subject"))
        .body(body)
        .internal_date(internal_date)
        .category(Category::Inbox)
        .read(read)
        .build())
}
