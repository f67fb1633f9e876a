//! OpenAI-compatible chat-completions client covering both capabilities:
//! plain completions for copy, multimodal completions (image modality,
//! data-URI attachments) for background generation.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{AiError, GeneratedImage, ImageModel, TextModel};
use crate::assets::inline::{encode_data_uri, parse_data_uri};
use crate::config::AiConfig;

/// External calls are the only multi-second blocks in the system; bound
/// them at the transport instead of retrying internally.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

pub struct GenAiClient {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
    text_model: String,
    image_model: String,
}

impl GenAiClient {
    pub fn new(config: &AiConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("build http client")?;
        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            text_model: config.text_model.clone(),
            image_model: config.image_model.clone(),
        })
    }

    async fn post_chat(&self, body: &ChatRequest) -> Result<ChatResponse, AiError> {
        let resp = self
            .http
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| AiError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(AiError::Upstream(format!("{status}: {detail}")));
        }

        resp.json::<ChatResponse>()
            .await
            .map_err(|e| AiError::Transport(e.to_string()))
    }
}

#[async_trait]
impl TextModel for GenAiClient {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, AiError> {
        let body = ChatRequest {
            model: self.text_model.clone(),
            messages: vec![
                ChatMessage::system(system),
                ChatMessage::user_text(prompt),
            ],
            modalities: None,
        };

        let resp = self.post_chat(&body).await?;
        debug!(model = %self.text_model, choices = resp.choices.len(), "completion received");

        let content = resp
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        if content.trim().is_empty() {
            return Err(AiError::Empty);
        }
        Ok(content)
    }
}

#[async_trait]
impl ImageModel for GenAiClient {
    async fn generate(
        &self,
        system: &str,
        prompt: &str,
        reference: Option<(Bytes, String)>,
    ) -> Result<Vec<GeneratedImage>, AiError> {
        let mut parts = vec![ContentPart::Text {
            text: prompt.to_string(),
        }];
        if let Some((bytes, mime)) = reference {
            parts.push(ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: encode_data_uri(&mime, &bytes),
                },
            });
        }

        let body = ChatRequest {
            model: self.image_model.clone(),
            messages: vec![
                ChatMessage::system(system),
                ChatMessage {
                    role: "user",
                    content: MessageContent::Parts(parts),
                },
            ],
            modalities: Some(vec!["image", "text"]),
        };

        let resp = self.post_chat(&body).await?;

        let images: Vec<GeneratedImage> = resp
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.images)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|img| {
                let (mime, bytes) = parse_data_uri(&img.image_url.url)?;
                Some(GeneratedImage {
                    bytes: Bytes::from(bytes),
                    mime,
                })
            })
            .collect();

        debug!(model = %self.image_model, count = images.len(), "images received");
        if images.is_empty() {
            return Err(AiError::Empty);
        }
        Ok(images)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    modalities: Option<Vec<&'static str>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: MessageContent,
}

impl ChatMessage {
    fn system(text: &str) -> Self {
        Self {
            role: "system",
            content: MessageContent::Text(text.to_string()),
        }
    }

    fn user_text(text: &str) -> Self {
        Self {
            role: "user",
            content: MessageContent::Text(text.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize, Deserialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    images: Vec<ResponseImage>,
}

#[derive(Debug, Deserialize)]
struct ResponseImage {
    image_url: ImageUrl,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_response_parses() {
        let raw = r#"{"choices":[{"message":{"content":"TITLE: X\nDESCRIPTION: Y"}}]}"#;
        let resp: ChatResponse = serde_json::from_str(raw).expect("parse");
        assert_eq!(
            resp.choices[0].message.content.as_deref(),
            Some("TITLE: X\nDESCRIPTION: Y")
        );
        assert!(resp.choices[0].message.images.is_empty());
    }

    #[test]
    fn image_response_parses_data_uris() {
        let raw = r#"{"choices":[{"message":{"content":null,
            "images":[{"image_url":{"url":"data:image/png;base64,cGl4ZWxz"}}]}}]}"#;
        let resp: ChatResponse = serde_json::from_str(raw).expect("parse");
        let (mime, bytes) =
            parse_data_uri(&resp.choices[0].message.images[0].image_url.url).expect("uri");
        assert_eq!(mime, "image/png");
        assert_eq!(bytes, b"pixels");
    }

    #[test]
    fn empty_choices_parse_to_nothing() {
        let resp: ChatResponse = serde_json::from_str("{}").expect("parse");
        assert!(resp.choices.is_empty());
    }

    #[test]
    fn multimodal_request_serializes_parts() {
        let body = ChatRequest {
            model: "img".into(),
            messages: vec![ChatMessage {
                role: "user",
                content: MessageContent::Parts(vec![
                    ContentPart::Text { text: "bg".into() },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: "data:image/png;base64,AA==".into(),
                        },
                    },
                ]),
            }],
            modalities: Some(vec!["image", "text"]),
        };
        let json = serde_json::to_value(&body).expect("serialize");
        assert_eq!(json["messages"][0]["content"][0]["type"], "text");
        assert_eq!(json["messages"][0]["content"][1]["type"], "image_url");
        assert_eq!(json["modalities"][0], "image");
    }

    #[test]
    fn text_request_omits_modalities() {
        let body = ChatRequest {
            model: "txt".into(),
            messages: vec![ChatMessage::user_text("hi")],
            modalities: None,
        };
        let json = serde_json::to_value(&body).expect("serialize");
        assert!(json.get("modalities").is_none());
        assert_eq!(json["messages"][0]["content"], "hi");
    }
}
