//! Language model backends

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};

/// A text generation backend
pub trait LanguageModel: Send + Sync {
    /// Generate a completion for a prompt
    fn generate(&self, prompt: &str) -> Result<String>;
}

/// Gemini over the Generative Language REST API
pub struct GeminiModel {
    api_key: String,
    model: String,
    base_url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Option<Vec<ResponsePart>>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate
    fn into_text(self) -> Option<String> {
        let parts = self.candidates?.into_iter().next()?.content?.parts?;
        let text: String = parts.into_iter().filter_map(|p| p.text).collect();
        if text.is_empty() { None } else { Some(text) }
    }
}

impl GeminiModel {
    const BASE_URL: &'static str = "https://generativelanguage.googleapis.com/v1beta";

    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: Self::BASE_URL.to_string(),
        }
    }

    /// Create a model using the API key from `GEMINI_API_KEY`
    pub fn from_env(model: impl Into<String>) -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .context("GEMINI_API_KEY environment variable not set")?;
        Ok(Self::new(api_key, model))
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

impl LanguageModel for GeminiModel {
    fn generate(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
            },
        };

        debug!("Sending {} byte prompt to {}", prompt.len(), self.model);

        let mut response = ureq::post(&self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .send_json(&request)
            .context("Failed to send generate request")?;

        let parsed: GenerateResponse = response
            .body_mut()
            .read_json()
            .context("Failed to parse generate response")?;

        parsed.into_text().context("Model returned no text")
    }
}
