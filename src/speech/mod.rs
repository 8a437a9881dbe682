//! Speech synthesis
//!
//! Two backends produce the narration audio:
//! - `minimax`: remote streamed HTTP API, MP3 output, honours pause markers
//! - `local`: on-device espeak-ng, WAV output captured in memory

mod local;
mod minimax;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::config::Config;
use crate::error::NarratorError;

pub use local::LocalSynthesizer;
pub use minimax::MiniMaxSynthesizer;

/// Base name of the downloadable narration file
pub const DOWNLOAD_STEM: &str = "museum_artifact_narration";

/// Container format of synthesized audio
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Mp3,
    Wav,
}

impl AudioFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "audio/mpeg",
            AudioFormat::Wav => "audio/wav",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Wav => "wav",
        }
    }
}

/// Encoded narration audio
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioPayload {
    pub bytes: Vec<u8>,
    pub format: AudioFormat,
}

impl AudioPayload {
    pub fn new(bytes: Vec<u8>, format: AudioFormat) -> Self {
        Self { bytes, format }
    }

    /// Download filename matching the real container format
    pub fn filename(&self) -> String {
        format!("{}.{}", DOWNLOAD_STEM, self.format.extension())
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }
}

/// Turns narrative text into audio
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text`; no validation is applied to the input
    async fn synthesize(&self, text: &str) -> Result<AudioPayload, NarratorError>;
}

/// Supported speech backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechBackend {
    MiniMax,
    Local,
}

impl SpeechBackend {
    /// Parse a configuration selector (case-insensitive)
    pub fn parse(s: &str) -> Result<Self, NarratorError> {
        match s.trim().to_lowercase().as_str() {
            "minimax" | "remote" => Ok(SpeechBackend::MiniMax),
            "local" | "espeak" => Ok(SpeechBackend::Local),
            other => Err(NarratorError::UnsupportedSpeechBackend(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SpeechBackend::MiniMax => "minimax",
            SpeechBackend::Local => "local",
        }
    }
}

/// Build the synthesizer selected by `config.speech_backend`
///
/// Only the remote backend needs a credential.
pub fn synthesizer_from_config(
    config: &Config,
) -> Result<Arc<dyn SpeechSynthesizer>, NarratorError> {
    let backend = SpeechBackend::parse(&config.speech_backend)?;

    let synthesizer: Arc<dyn SpeechSynthesizer> = match backend {
        SpeechBackend::MiniMax => {
            let api_key = config
                .speech_key()
                .ok_or(NarratorError::MissingCredential("SPEECH_API_KEY"))?;
            Arc::new(MiniMaxSynthesizer::new(
                crate::http_client(config)?,
                api_key,
                &config.minimax_base_url,
            ))
        }
        SpeechBackend::Local => Arc::new(LocalSynthesizer::new(
            &config.espeak_program,
            &config.espeak_voice,
        )),
    };

    info!("Using {} speech backend", backend.name());
    Ok(synthesizer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_format_labels() {
        let mp3 = AudioPayload::new(vec![1, 2, 3], AudioFormat::Mp3);
        assert_eq!(mp3.filename(), "museum_artifact_narration.mp3");
        assert_eq!(mp3.mime_type(), "audio/mpeg");

        let wav = AudioPayload::new(vec![], AudioFormat::Wav);
        assert_eq!(wav.filename(), "museum_artifact_narration.wav");
        assert_eq!(wav.mime_type(), "audio/wav");
    }

    #[test]
    fn test_speech_backend_parsing() {
        assert_eq!(SpeechBackend::parse("MiniMax").unwrap(), SpeechBackend::MiniMax);
        assert_eq!(SpeechBackend::parse("local").unwrap(), SpeechBackend::Local);
        assert!(matches!(
            SpeechBackend::parse("pyttsx3"),
            Err(NarratorError::UnsupportedSpeechBackend(_))
        ));
    }

    #[test]
    fn test_remote_backend_requires_credential() {
        let config = Config {
            speech_backend: "minimax".to_string(),
            speech_api_key: None,
            ..Config::default()
        };
        assert!(matches!(
            synthesizer_from_config(&config),
            Err(NarratorError::MissingCredential("SPEECH_API_KEY"))
        ));
    }

    #[test]
    fn test_local_backend_needs_no_credential() {
        let config = Config {
            speech_backend: "local".to_string(),
            speech_api_key: None,
            ..Config::default()
        };
        assert!(synthesizer_from_config(&config).is_ok());
    }
}
