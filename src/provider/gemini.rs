//! Gemini generateContent client (text + vision).

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{ApiErrorBody, ModelProvider, ProviderError};

const GENERATE_CONTENT_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent";

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text {
        text: &'a str,
    },
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: InlineData<'a>,
    },
}

#[derive(Serialize)]
struct InlineData<'a> {
    #[serde(rename = "mimeType")]
    mime_type: &'a str,
    data: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    error: Option<ApiErrorBody>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ReplyPart>,
}

#[derive(Deserialize)]
struct ReplyPart {
    #[serde(default)]
    text: String,
}

/// API client for Gemini content generation.
pub struct GeminiClient {
    client: Client,
    key: String,
}

impl GeminiClient {
    /// Creates a client with the given API key.
    pub fn new(key: impl Into<String>) -> Self {
        GeminiClient {
            client: Client::new(),
            key: key.into(),
        }
    }

    async fn generate(&self, request: &GenerateRequest<'_>) -> Result<String, ProviderError> {
        let resp = self
            .client
            .post(GENERATE_CONTENT_URL)
            .query(&[("key", self.key.as_str())])
            .json(request)
            .send()
            .await?;

        let status = resp.status().as_u16();
        let body: GenerateResponse = resp.json().await?;
        if let Some(error) = body.error {
            return Err(ProviderError::Api {
                status,
                message: error.message,
            });
        }
        body.candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content.parts.into_iter().next())
            .map(|part| part.text)
            .ok_or_else(|| ProviderError::malformed("generateContent has no candidates"))
    }
}

#[async_trait]
impl ModelProvider for GeminiClient {
    /// Gemini has no system role here; the system prompt is folded into
    /// the single text part as `<system>\nInput: <user>`.
    async fn enhance_text(
        &self,
        system_prompt: &str,
        user_text: &str,
    ) -> Result<String, ProviderError> {
        let combined = format!("{}\nInput: {}", system_prompt, user_text);
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part::Text { text: &combined }],
            }],
        };
        self.generate(&request).await
    }

    async fn describe_image(
        &self,
        system_prompt: &str,
        image: &[u8],
        mime_type: &str,
    ) -> Result<String, ProviderError> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(image);
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text {
                        text: system_prompt,
                    },
                    Part::Inline {
                        inline_data: InlineData {
                            mime_type,
                            data: encoded,
                        },
                    },
                ],
            }],
        };
        self.generate(&request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_request_wire_shape() {
        let combined = "system text\nInput: a cat".to_string();
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part::Text { text: &combined }],
            }],
        };
        let raw = serde_json::to_value(&request).unwrap();
        assert_eq!(raw["contents"][0]["parts"][0]["text"], "system text\nInput: a cat");
    }

    #[test]
    fn test_vision_request_wire_shape() {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text { text: "describe" },
                    Part::Inline {
                        inline_data: InlineData {
                            mime_type: "image/jpeg",
                            data: "QUJD".to_string(),
                        },
                    },
                ],
            }],
        };
        let raw = serde_json::to_value(&request).unwrap();
        let parts = &raw["contents"][0]["parts"];
        assert_eq!(parts[0]["text"], "describe");
        assert_eq!(parts[1]["inlineData"]["mimeType"], "image/jpeg");
        assert_eq!(parts[1]["inlineData"]["data"], "QUJD");
    }

    #[test]
    fn test_response_parsing() {
        let body: GenerateResponse = serde_json::from_str(
            r#"{ "candidates": [ { "content": { "parts": [ { "text": "a prompt" } ], "role": "model" } } ] }"#,
        )
        .unwrap();
        assert!(body.error.is_none());
        assert_eq!(body.candidates[0].content.parts[0].text, "a prompt");

        let body: GenerateResponse = serde_json::from_str(
            r#"{ "error": { "code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT" } }"#,
        )
        .unwrap();
        assert_eq!(body.error.unwrap().message, "API key not valid");
    }
}
