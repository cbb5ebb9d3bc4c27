//! External AI enhancement collaborators.
//!
//! The core consumes one interface: given a system prompt and user
//! content, return generated text or fail with the provider's message.
//! Retries, rate limiting, and streaming are out of scope.
//!
//! This module provides:
//! - `ModelProvider`: the object-safe async interface
//! - `ApiConfig`: persisted provider selection + credential
//! - `openai` / `gemini`: HTTP clients (feature `http`)

#[cfg(feature = "http")]
pub mod gemini;
#[cfg(feature = "http")]
pub mod openai;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::persist::json;

#[cfg(feature = "http")]
pub use gemini::GeminiClient;
#[cfg(feature = "http")]
pub use openai::OpenAiClient;

/// Errors from an external AI call.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Transport-level failure.
    #[cfg(feature = "http")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with an error body.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The provider answered 2xx but not in the expected shape.
    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),
}

impl ProviderError {
    /// Creates a MalformedResponse error.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }

    /// The user-visible message, as the original provider phrased it
    /// where available. Used for inline error markers in batch results.
    pub fn message(&self) -> String {
        match self {
            ProviderError::Api { message, .. } if !message.is_empty() => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Error body shape both providers use: `{ "error": { "message": ... } }`.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub message: String,
}

/// Which hosted provider to call.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Gemini,
    OpenAi,
}

impl ProviderKind {
    /// Parses a stored value; anything that is not `"openai"` reads as
    /// Gemini.
    pub fn from_key(key: &str) -> Self {
        if key == "openai" {
            ProviderKind::OpenAi
        } else {
            ProviderKind::Gemini
        }
    }

    pub fn as_key(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::OpenAi => "openai",
        }
    }
}

/// User-supplied provider selection and credential.
///
/// Persisted inside the refinery envelope; the key is transmitted
/// nowhere except as part of the provider call itself.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ApiConfig {
    pub provider: ProviderKind,
    pub key: String,
}

impl ApiConfig {
    /// Creates a config.
    pub fn new(provider: ProviderKind, key: impl Into<String>) -> Self {
        ApiConfig {
            provider,
            key: key.into(),
        }
    }

    /// Total normalization of a stored config.
    pub(crate) fn from_value(value: &Value) -> ApiConfig {
        ApiConfig {
            provider: ProviderKind::from_key(&json::string_or(
                json::pick(value, &[&["provider"]]),
                "",
            )),
            key: json::string_or(json::pick(value, &[&["key"]]), ""),
        }
    }

    /// Builds the matching HTTP client.
    #[cfg(feature = "http")]
    pub fn connect(&self) -> Box<dyn ModelProvider + Send + Sync> {
        match self.provider {
            ProviderKind::OpenAi => Box::new(OpenAiClient::new(&self.key)),
            ProviderKind::Gemini => Box::new(GeminiClient::new(&self.key)),
        }
    }
}

/// The interface the core consumes for AI enhancement.
#[async_trait]
pub trait ModelProvider {
    /// System/user message pair in, generated text out.
    async fn enhance_text(
        &self,
        system_prompt: &str,
        user_text: &str,
    ) -> Result<String, ProviderError>;

    /// Vision variant: describe inline image bytes.
    async fn describe_image(
        &self,
        system_prompt: &str,
        image: &[u8],
        mime_type: &str,
    ) -> Result<String, ProviderError>;
}
