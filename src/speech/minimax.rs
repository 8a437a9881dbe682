//! MiniMax text-to-speech (speech-02-turbo, streamed MP3)

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, warn};

use super::{AudioFormat, AudioPayload, SpeechSynthesizer};
use crate::error::NarratorError;

const MODEL: &str = "speech-02-turbo";
const EMOTION: &str = "happy";
const SERVICE: &str = "MiniMax";

/// Speech request body
#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    text: &'a str,
    emotion: &'a str,
    format: &'a str,
}

/// Remote speech synthesizer
#[derive(Debug)]
pub struct MiniMaxSynthesizer {
    client: Client,
    api_key: String,
    base_url: String,
}

impl MiniMaxSynthesizer {
    pub fn new(client: Client, api_key: &str, base_url: &str) -> Self {
        Self {
            client,
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn build_request(text: &str) -> SpeechRequest<'_> {
        SpeechRequest {
            model: MODEL,
            text,
            emotion: EMOTION,
            format: AudioFormat::Mp3.extension(),
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for MiniMaxSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<AudioPayload, NarratorError> {
        debug!("Sending speech request to MiniMax ({} chars)", text.len());

        let response = self
            .client
            .post(format!("{}/v1/text_to_speech", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&Self::build_request(text))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("MiniMax API error: {} - {}", status, body);
            return Err(NarratorError::Upstream {
                service: SERVICE,
                status: status.as_u16(),
            });
        }

        // Accumulate the streamed body into one buffer
        let mut audio = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            audio.extend_from_slice(&chunk?);
        }

        debug!("Received {} bytes of MP3 audio", audio.len());
        Ok(AudioPayload::new(audio, AudioFormat::Mp3))
    }
}
