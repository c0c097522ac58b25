//! Voice command dispatch

use log::{error, info};
use std::sync::Arc;

use super::VoiceCommand;
use crate::assistant::{
    ContextualRequest, EmailMetadata, LanguageModel, contextual_response, summarize_email,
};
use crate::config::DEFAULT_SNIPPET_CHARS;
use crate::models::{Email, Mailbox};

/// Speech synthesis boundary
pub trait Speaker: Send + Sync {
    /// Say something to the user
    fn speak(&self, text: &str);

    /// Stop anything currently being spoken
    fn cancel(&self) {}
}

/// Spoken text for reading an email aloud
pub fn read_aloud_text(email: &Email) -> String {
    format!(
        "Reading email from {}. Subject: {}. Body: {}",
        email.from, email.subject, email.body
    )
}

/// Routes spoken commands to the mailbox, the assistant and the speaker
pub struct VoiceController {
    mailbox: Mailbox,
    model: Arc<dyn LanguageModel>,
    speaker: Arc<dyn Speaker>,
    conversation: String,
    snippet_chars: usize,
}

impl VoiceController {
    pub fn new(mailbox: Mailbox, model: Arc<dyn LanguageModel>, speaker: Arc<dyn Speaker>) -> Self {
        Self {
            mailbox,
            model,
            speaker,
            conversation: String::new(),
            snippet_chars: DEFAULT_SNIPPET_CHARS,
        }
    }

    /// Number of body characters sent to the assistant per email
    pub fn with_snippet_chars(mut self, snippet_chars: usize) -> Self {
        self.snippet_chars = snippet_chars;
        self
    }

    pub fn mailbox(&self) -> &Mailbox {
        &self.mailbox
    }

    pub fn mailbox_mut(&mut self) -> &mut Mailbox {
        &mut self.mailbox
    }

    /// Conversation context carried between assistant queries
    pub fn conversation(&self) -> &str {
        &self.conversation
    }

    /// Handle a finished transcript
    ///
    /// Returns the command that was dispatched, or None for an empty
    /// transcript.
    pub fn handle_transcript(&mut self, transcript: &str) -> Option<VoiceCommand> {
        let command = VoiceCommand::parse(transcript)?;
        self.speaker.cancel();
        info!("Voice command: {:?}", command);
        self.dispatch(&command);
        Some(command)
    }

    fn dispatch(&mut self, command: &VoiceCommand) {
        if let (Some(category), Some(announcement)) = (command.category(), command.announcement()) {
            self.mailbox.set_category(category);
            self.speaker.speak(announcement);
            return;
        }

        match command {
            VoiceCommand::ReadAloud => self.read_aloud(),
            VoiceCommand::Summarize => {
                self.summarize_selected();
            }
            VoiceCommand::Query(query) => self.ask(query),
            _ => {}
        }
    }

    /// Read the selected email aloud. Does nothing without a selection.
    pub fn read_aloud(&self) {
        if let Some(email) = self.mailbox.selected() {
            self.speaker.speak(&read_aloud_text(email));
        }
    }

    /// Summarize the selected email, speaking progress and the result
    ///
    /// Returns the summary on success.
    pub fn summarize_selected(&mut self) -> Option<String> {
        let email = self.mailbox.selected()?;
        let id = email.id.clone();

        self.speaker.speak("Summarizing the email for you.");
        match summarize_email(self.model.as_ref(), &email.body) {
            Ok(result) => {
                self.speaker
                    .speak(&format!("Here is the summary: {}", result.summary));
                self.mailbox.set_summary(&id, result.summary.clone());
                Some(result.summary)
            }
            Err(e) => {
                error!("Summarization error: {:#}", e);
                self.speaker
                    .speak("Sorry, I was unable to summarize the email.");
                None
            }
        }
    }

    /// Ask the assistant a free-form question
    pub fn ask(&mut self, query: &str) {
        let context = match self.mailbox.selected() {
            Some(email) => format!(
                "Current email context: Subject: {}, Body: {}\n\n{}",
                email.subject, email.body, self.conversation
            ),
            None => self.conversation.clone(),
        };

        let request = ContextualRequest {
            query: query.to_string(),
            context: Some(context),
            email_metadata: self
                .mailbox
                .emails()
                .iter()
                .map(|e| EmailMetadata::from_email(e, self.snippet_chars))
                .collect(),
        };

        match contextual_response(self.model.as_ref(), &request) {
            Ok(result) => {
                self.speaker.speak(&result.response);
                self.conversation = result.updated_context;
            }
            Err(e) => {
                error!("Contextual response error: {:#}", e);
                self.speaker
                    .speak("I'm sorry, I had trouble understanding that.");
            }
        }
    }
}
