//! Narration pipeline
//!
//! One upload runs strictly in order: decode the photo, describe it, speak the
//! description. The first failure ends the run and nothing partial is kept.

use std::sync::Arc;

use tracing::{debug, info};

use crate::artifact::ArtifactImage;
use crate::config::Config;
use crate::error::NarratorError;
use crate::speech::{self, AudioPayload, SpeechSynthesizer};
use crate::vision::{self, ImageDescriber};

/// Result of one successful narration
#[derive(Debug, Clone)]
pub struct Narration {
    pub image: ArtifactImage,
    pub narrative: String,
    pub audio: AudioPayload,
}

/// Describer and synthesizer wired together
#[derive(Clone)]
pub struct Narrator {
    describer: Arc<dyn ImageDescriber>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
}

impl Narrator {
    pub fn new(
        describer: Arc<dyn ImageDescriber>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
    ) -> Self {
        Self {
            describer,
            synthesizer,
        }
    }

    /// Build both backends from configuration
    pub fn from_config(config: &Config) -> Result<Self, NarratorError> {
        let describer = vision::describer_from_config(config)?;
        let synthesizer = speech::synthesizer_from_config(config)?;
        Ok(Self::new(describer, synthesizer))
    }

    /// Run the full pipeline for one uploaded photo
    pub async fn narrate(&self, upload: Vec<u8>) -> Result<Narration, NarratorError> {
        let image = ArtifactImage::decode(upload)?;

        info!("Identifying artifact and generating story");
        let narrative = self.describer.describe(&image).await?;
        debug!("Narrative: {}", narrative);

        info!("Creating audio narration");
        let audio = self.synthesizer.synthesize(&narrative).await?;

        Ok(Narration {
            image,
            narrative,
            audio,
        })
    }
}
