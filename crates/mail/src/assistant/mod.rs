//! AI assistant
//!
//! Two single-shot flows over a pluggable [`LanguageModel`]: summarizing an
//! email and answering questions about recent emails while carrying the
//! conversation forward.

mod flows;
mod model;

pub use flows::{
    ContextualRequest, ContextualResponse, EmailMetadata, EmailSummary, contextual_response,
    summarize_email,
};
pub use model::{GeminiModel, LanguageModel};
