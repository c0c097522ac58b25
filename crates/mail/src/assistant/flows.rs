//! Summarization and contextual Q&A over emails

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::LanguageModel;
use crate::models::Email;

/// Summary of one email
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EmailSummary {
    pub summary: String,
}

/// Email fields the assistant can answer questions from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailMetadata {
    pub id: String,
    pub from: String,
    pub subject: String,
    pub date: String,
    pub snippet: String,
}

impl EmailMetadata {
    pub fn from_email(email: &Email, snippet_chars: usize) -> Self {
        Self {
            id: email.id.as_str().to_string(),
            from: email.from.clone(),
            subject: email.subject.clone(),
            date: email.date.to_rfc2822(),
            snippet: email.snippet(snippet_chars),
        }
    }
}

/// A question for the assistant
#[derive(Debug, Clone, Default)]
pub struct ContextualRequest {
    /// The user's question
    pub query: String,
    /// Conversation so far
    pub context: Option<String>,
    /// Recent emails to answer from
    pub email_metadata: Vec<EmailMetadata>,
}

/// The assistant's answer and the conversation context to carry forward
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextualResponse {
    pub response: String,
    pub updated_context: String,
}

/// Summarize an email body
pub fn summarize_email(model: &dyn LanguageModel, email_content: &str) -> Result<EmailSummary> {
    let output = model.generate(&summarize_prompt(email_content))?;
    parse_output(&output).context("Unexpected summary output")
}

/// Answer a question about recent emails
pub fn contextual_response(
    model: &dyn LanguageModel,
    request: &ContextualRequest,
) -> Result<ContextualResponse> {
    let output = model.generate(&contextual_prompt(request)?)?;
    parse_output(&output).context("Unexpected contextual response output")
}

fn summarize_prompt(email_content: &str) -> String {
    format!(
        "Summarize the following email content, extracting the key points and providing a concise overview:\n\n\
         {email_content}\n\n\
         Respond with JSON: {{\"summary\": \"<summary>\"}}"
    )
}

fn contextual_prompt(request: &ContextualRequest) -> Result<String> {
    let metadata = serde_json::to_string_pretty(&request.email_metadata)?;
    let context = request.context.as_deref().unwrap_or_default();

    Ok(format!(
        "You are a helpful AI assistant specializing in Gmail management.\n\
         Your goal is to answer the user's questions based on the provided email metadata.\n\
         You also maintain context throughout the conversation to provide relevant and accurate responses.\n\
         \n\
         Use the following email metadata to answer the user's query. The metadata is an array of objects with from, subject, date, and a snippet of the body.\n\
         ```\n\
         {metadata}\n\
         ```\n\
         \n\
         Previous Conversation Context:\n\
         {context}\n\
         \n\
         User Query:\n\
         {query}\n\
         \n\
         Response: {{\"response\": \"<AI Response>\", \"updatedContext\": \"<Updated Conversation Context>\"}}",
        query = request.query,
    ))
}

/// Parse model JSON output, tolerating a surrounding Markdown code fence
fn parse_output<T: DeserializeOwned>(output: &str) -> Result<T> {
    let trimmed = output.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.trim_end().strip_suffix("```"))
        .unwrap_or(trimmed);
    Ok(serde_json::from_str(body.trim())?)
}
