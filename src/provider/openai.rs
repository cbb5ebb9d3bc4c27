//! OpenAI chat-completions client (text + vision).

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{ApiErrorBody, ModelProvider, ProviderError};

const CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";
const TEXT_MODEL: &str = "gpt-4o-mini";
const VISION_MODEL: &str = "gpt-4o";

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: MessageContent<'a>,
}

/// Plain string for text messages, part list for vision messages.
#[derive(Serialize)]
#[serde(untagged)]
enum MessageContent<'a> {
    Text(&'a str),
    Parts(Vec<ContentPart<'a>>),
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum ContentPart<'a> {
    #[serde(rename = "text")]
    Text { text: &'a str },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    error: Option<ApiErrorBody>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: String,
}

/// API client for OpenAI chat completions.
pub struct OpenAiClient {
    client: Client,
    key: String,
}

impl OpenAiClient {
    /// Creates a client with the given API key.
    pub fn new(key: impl Into<String>) -> Self {
        OpenAiClient {
            client: Client::new(),
            key: key.into(),
        }
    }

    async fn complete(&self, request: &ChatRequest<'_>) -> Result<String, ProviderError> {
        let resp = self
            .client
            .post(CHAT_COMPLETIONS_URL)
            .bearer_auth(&self.key)
            .json(request)
            .send()
            .await?;

        let status = resp.status().as_u16();
        let body: ChatResponse = resp.json().await?;
        if let Some(error) = body.error {
            return Err(ProviderError::Api {
                status,
                message: error.message,
            });
        }
        body.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| ProviderError::malformed("chat completion has no choices"))
    }
}

#[async_trait]
impl ModelProvider for OpenAiClient {
    async fn enhance_text(
        &self,
        system_prompt: &str,
        user_text: &str,
    ) -> Result<String, ProviderError> {
        let request = ChatRequest {
            model: TEXT_MODEL,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: MessageContent::Text(system_prompt),
                },
                ChatMessage {
                    role: "user",
                    content: MessageContent::Text(user_text),
                },
            ],
        };
        self.complete(&request).await
    }

    async fn describe_image(
        &self,
        system_prompt: &str,
        image: &[u8],
        mime_type: &str,
    ) -> Result<String, ProviderError> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(image);
        let request = ChatRequest {
            model: VISION_MODEL,
            messages: vec![ChatMessage {
                role: "user",
                content: MessageContent::Parts(vec![
                    ContentPart::Text {
                        text: system_prompt,
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: format!("data:{};base64,{}", mime_type, encoded),
                        },
                    },
                ]),
            }],
        };
        self.complete(&request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_request_wire_shape() {
        let request = ChatRequest {
            model: TEXT_MODEL,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: MessageContent::Text("be brief"),
                },
                ChatMessage {
                    role: "user",
                    content: MessageContent::Text("a cat"),
                },
            ],
        };
        let raw = serde_json::to_value(&request).unwrap();
        assert_eq!(raw["model"], "gpt-4o-mini");
        assert_eq!(raw["messages"][0]["role"], "system");
        assert_eq!(raw["messages"][0]["content"], "be brief");
        assert_eq!(raw["messages"][1]["content"], "a cat");
    }

    #[test]
    fn test_vision_request_wire_shape() {
        let request = ChatRequest {
            model: VISION_MODEL,
            messages: vec![ChatMessage {
                role: "user",
                content: MessageContent::Parts(vec![
                    ContentPart::Text { text: "describe" },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: "data:image/png;base64,AAAA".to_string(),
                        },
                    },
                ]),
            }],
        };
        let raw = serde_json::to_value(&request).unwrap();
        assert_eq!(raw["model"], "gpt-4o");
        assert_eq!(raw["messages"][0]["content"][0]["type"], "text");
        assert_eq!(raw["messages"][0]["content"][1]["type"], "image_url");
        assert_eq!(
            raw["messages"][0]["content"][1]["image_url"]["url"],
            "data:image/png;base64,AAAA"
        );
    }

    #[test]
    fn test_response_parsing() {
        let body: ChatResponse = serde_json::from_str(
            r#"{ "choices": [ { "message": { "role": "assistant", "content": "a prompt" } } ] }"#,
        )
        .unwrap();
        assert!(body.error.is_none());
        assert_eq!(body.choices[0].message.content, "a prompt");

        let body: ChatResponse = serde_json::from_str(
            r#"{ "error": { "message": "Incorrect API key", "type": "invalid_request_error" } }"#,
        )
        .unwrap();
        assert_eq!(body.error.unwrap().message, "Incorrect API key");
        assert!(body.choices.is_empty());
    }
}
