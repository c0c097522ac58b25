//! Voice interface
//!
//! Transcripts come in from a speech recognizer, get parsed into a
//! [`VoiceCommand`] and are dispatched by [`VoiceController`]. Replies go
//! out through a [`Speaker`].

mod command;
mod controller;

pub use command::VoiceCommand;
pub use controller::{Speaker, VoiceController, read_aloud_text};
