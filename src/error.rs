//! Error types shared by the describer, synthesizer and shell

use thiserror::Error;

/// Errors produced while narrating an artifact
#[derive(Debug, Error)]
pub enum NarratorError {
    #[error("{0} is not set")]
    MissingCredential(&'static str),

    #[error("unsupported vision service: {0}")]
    UnsupportedVisionService(String),

    #[error("unsupported speech backend: {0}")]
    UnsupportedSpeechBackend(String),

    #[error("unsupported image format: {0}")]
    UnsupportedImageFormat(String),

    #[error("invalid image: {0}")]
    InvalidImage(#[from] image::ImageError),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{service} API error: {status}")]
    Upstream { service: &'static str, status: u16 },

    #[error("malformed {service} response: {reason}")]
    MalformedResponse {
        service: &'static str,
        reason: String,
    },

    #[error("speech engine failed: {0}")]
    SpeechEngine(String),
}

impl NarratorError {
    /// True for errors caused by configuration rather than by a request.
    ///
    /// Configuration errors block all narration and are shown to the user
    /// as-is; everything else collapses into one generic message.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            NarratorError::MissingCredential(_)
                | NarratorError::UnsupportedVisionService(_)
                | NarratorError::UnsupportedSpeechBackend(_)
        )
    }
}
