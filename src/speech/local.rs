//! On-device speech via espeak-ng
//!
//! The engine writes its WAV stream to stdout, which is captured in memory;
//! nothing touches the filesystem. espeak-ng has no notion of the pause
//! marker, so markers are turned into plain sentence breaks first.

use std::io::Cursor;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::{AudioFormat, AudioPayload, SpeechSynthesizer};
use crate::error::NarratorError;
use crate::vision::PAUSE_MARKER;

/// Local speech engine driven through its command line
#[derive(Debug, Clone)]
pub struct LocalSynthesizer {
    program: String,
    voice: String,
}

impl LocalSynthesizer {
    pub fn new(program: &str, voice: &str) -> Self {
        Self {
            program: program.to_string(),
            voice: voice.to_string(),
        }
    }

    /// Replace pause markers with a space between sentences
    fn speakable(text: &str) -> String {
        text.split(PAUSE_MARKER)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Check that `bytes` starts with a readable WAV header
///
/// Header sizes are placeholders when the engine writes to a pipe, so only
/// the header itself is validated.
fn check_wav(bytes: &[u8]) -> Result<(), NarratorError> {
    hound::WavReader::new(Cursor::new(bytes))
        .map(|_| ())
        .map_err(|e| NarratorError::SpeechEngine(format!("unreadable WAV output: {}", e)))
}

#[async_trait]
impl SpeechSynthesizer for LocalSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<AudioPayload, NarratorError> {
        let output = Command::new(&self.program)
            .arg("-v")
            .arg(&self.voice)
            .arg("--stdout")
            // Text starting with '-' must not be read as options
            .arg("--")
            .arg(Self::speakable(text))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                NarratorError::SpeechEngine(format!("failed to run {}: {}", self.program, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(NarratorError::SpeechEngine(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        check_wav(&output.stdout)?;
        debug!(
            "Local engine produced {} bytes of WAV audio",
            output.stdout.len()
        );

        Ok(AudioPayload::new(output.stdout, AudioFormat::Wav))
    }
}
