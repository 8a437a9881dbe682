//! Google Gemini describer (generateContent with inline image data)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{ImageDescriber, CURATOR_PROMPT};
use crate::artifact::ArtifactImage;
use crate::error::NarratorError;

const MODEL: &str = "gemini-2.5-flash";
const SERVICE: &str = "Gemini";

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RequestPart {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Debug, Serialize)]
struct InlineData {
    mime_type: &'static str,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate
    fn text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// Describer backed by the Gemini API
#[derive(Debug)]
pub struct GeminiDescriber {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiDescriber {
    pub fn new(client: Client, api_key: &str, base_url: &str) -> Self {
        Self {
            client,
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, MODEL)
    }

    fn build_request(png_base64: String) -> GenerateRequest {
        GenerateRequest {
            contents: vec![Content {
                parts: vec![
                    RequestPart::Text {
                        text: CURATOR_PROMPT.to_string(),
                    },
                    RequestPart::InlineData {
                        inline_data: InlineData {
                            mime_type: "image/png",
                            data: png_base64,
                        },
                    },
                ],
            }],
        }
    }
}

#[async_trait]
impl ImageDescriber for GeminiDescriber {
    async fn describe(&self, image: &ArtifactImage) -> Result<String, NarratorError> {
        let request = Self::build_request(image.to_png_base64()?);

        debug!("Sending vision request to Gemini: {}", MODEL);

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("Gemini API error: {} - {}", status, body);
            return Err(NarratorError::Upstream {
                service: SERVICE,
                status: status.as_u16(),
            });
        }

        let generated: GenerateResponse = response.json().await?;

        generated
            .text()
            .map(|text| text.trim().to_string())
            .ok_or_else(|| NarratorError::MalformedResponse {
                service: SERVICE,
                reason: "no candidate text".to_string(),
            })
    }
}
