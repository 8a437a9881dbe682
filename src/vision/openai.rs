//! OpenAI chat-completions describer (gpt-4o with an inline image)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{ImageDescriber, CURATOR_PROMPT};
use crate::artifact::ArtifactImage;
use crate::error::NarratorError;

const MODEL: &str = "gpt-4o";
const MAX_TOKENS: u32 = 300;
const SERVICE: &str = "OpenAI";

/// Chat completion request
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: Vec<ContentPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

/// Chat completion response
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Describer backed by an OpenAI-compatible chat completions endpoint
#[derive(Debug)]
pub struct OpenAiDescriber {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiDescriber {
    pub fn new(client: Client, api_key: &str, base_url: &str) -> Self {
        Self {
            client,
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn build_request(png_base64: &str) -> ChatRequest<'static> {
        ChatRequest {
            model: MODEL,
            messages: vec![ChatMessage {
                role: "user",
                content: vec![
                    ContentPart::Text {
                        text: CURATOR_PROMPT,
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: format!("data:image/png;base64,{}", png_base64),
                        },
                    },
                ],
            }],
            max_tokens: MAX_TOKENS,
        }
    }
}

#[async_trait]
impl ImageDescriber for OpenAiDescriber {
    async fn describe(&self, image: &ArtifactImage) -> Result<String, NarratorError> {
        let request = Self::build_request(&image.to_png_base64()?);

        debug!("Sending vision request to OpenAI: {}", request.model);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("OpenAI API error: {} - {}", status, body);
            return Err(NarratorError::Upstream {
                service: SERVICE,
                status: status.as_u16(),
            });
        }

        let chat_response: ChatResponse = response.json().await?;

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|text| text.trim().to_string())
            .ok_or_else(|| NarratorError::MalformedResponse {
                service: SERVICE,
                reason: "no message content".to_string(),
            })
    }
}
