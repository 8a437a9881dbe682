//! Artifact description via vision-capable language models
//!
//! Provides:
//! - The fixed curator prompt and pause marker
//! - OpenAI (chat completions) and Google (Gemini) describers
//! - Backend selection from configuration

mod gemini;
mod openai;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::artifact::ArtifactImage;
use crate::config::Config;
use crate::error::NarratorError;

pub use gemini::GeminiDescriber;
pub use openai::OpenAiDescriber;

/// Token the speech provider reads as a half-second pause
pub const PAUSE_MARKER: &str = "<#0.5#>";

/// Instruction sent with every artifact photo
pub const CURATOR_PROMPT: &str = r#"You are a museum curator and storyteller. Look at this museum artifact and:
1. Identify what it is
2. Create exactly 3 fascinating sentences about its history, significance, or interesting facts
3. Format your response with <#0.5#> tags between sentences for natural breathing pauses

Example format: "This ancient Roman coin dates back to 100 AD.<#0.5#>It features the profile of Emperor Trajan on one side.<#0.5#>Such coins were used throughout the Roman Empire for daily commerce."

Please provide exactly 3 sentences with the breathing pause tags."#;

/// Turns an artifact photo into a narrative
#[async_trait]
pub trait ImageDescriber: Send + Sync {
    /// Describe the artifact; the model's text is returned as-is
    async fn describe(&self, image: &ArtifactImage) -> Result<String, NarratorError>;
}

/// Supported vision backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisionService {
    OpenAi,
    Google,
}

impl VisionService {
    /// Parse a configuration selector (case-insensitive)
    pub fn parse(s: &str) -> Result<Self, NarratorError> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(VisionService::OpenAi),
            "google" | "gemini" => Ok(VisionService::Google),
            other => Err(NarratorError::UnsupportedVisionService(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            VisionService::OpenAi => "openai",
            VisionService::Google => "google",
        }
    }
}

/// Build the describer selected by `config.vision_service`
///
/// Fails before any network activity when the selector is unknown or the
/// vision credential is missing.
pub fn describer_from_config(config: &Config) -> Result<Arc<dyn ImageDescriber>, NarratorError> {
    let service = VisionService::parse(&config.vision_service)?;
    let api_key = config
        .vision_key()
        .ok_or(NarratorError::MissingCredential("VISION_API_KEY"))?;
    let client = crate::http_client(config)?;

    info!("Using {} vision backend", service.name());

    let describer: Arc<dyn ImageDescriber> = match service {
        VisionService::OpenAi => Arc::new(OpenAiDescriber::new(
            client,
            api_key,
            &config.openai_base_url,
        )),
        VisionService::Google => Arc::new(GeminiDescriber::new(
            client,
            api_key,
            &config.gemini_base_url,
        )),
    };
    Ok(describer)
}
