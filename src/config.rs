//! Server configuration
//!
//! Layered with figment, lowest priority first:
//! built-in defaults, an optional TOML file, `NARRATOR_*` environment
//! variables, then the bare credential variables (`VISION_API_KEY`,
//! `VISION_SERVICE`, `SPEECH_API_KEY`, `SPEECH_BACKEND`).

use std::net::SocketAddr;
use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Default OpenAI-compatible API base URL
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Default Gemini API base URL
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default MiniMax API base URL
pub const DEFAULT_MINIMAX_BASE_URL: &str = "https://api.minimax.io";

/// Environment variables read without the `NARRATOR_` prefix
const BARE_ENV_KEYS: [&str; 4] = [
    "VISION_API_KEY",
    "VISION_SERVICE",
    "SPEECH_API_KEY",
    "SPEECH_BACKEND",
];

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address the HTTP server binds to
    pub bind_addr: SocketAddr,
    /// Vision backend selector ("openai" or "google")
    pub vision_service: String,
    /// Credential for the vision backend
    pub vision_api_key: Option<String>,
    /// Speech backend selector ("minimax" or "local")
    pub speech_backend: String,
    /// Credential for the remote speech backend
    pub speech_api_key: Option<String>,
    pub openai_base_url: String,
    pub gemini_base_url: String,
    pub minimax_base_url: String,
    /// Local speech engine executable
    pub espeak_program: String,
    /// Voice passed to the local speech engine
    pub espeak_voice: String,
    /// Timeout for every outbound HTTP request; unset means none
    pub request_timeout_secs: Option<u64>,
    /// Largest accepted upload body
    pub max_upload_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            vision_service: "openai".to_string(),
            vision_api_key: None,
            speech_backend: "minimax".to_string(),
            speech_api_key: None,
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            minimax_base_url: DEFAULT_MINIMAX_BASE_URL.to_string(),
            espeak_program: "espeak-ng".to_string(),
            espeak_voice: "en".to_string(),
            request_timeout_secs: None,
            max_upload_bytes: 20 * 1024 * 1024,
        }
    }
}

impl Config {
    /// Build the layered figment, optionally including a TOML file
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment
            .merge(Env::prefixed("NARRATOR_"))
            .merge(Env::raw().only(&BARE_ENV_KEYS))
    }

    /// Load configuration from all layers
    pub fn load(path: Option<&Path>) -> Result<Self, figment::Error> {
        Self::figment(path).extract()
    }

    /// Vision credential, treating an empty value as absent
    pub fn vision_key(&self) -> Option<&str> {
        non_empty(&self.vision_api_key)
    }

    /// Speech credential, treating an empty value as absent
    pub fn speech_key(&self) -> Option<&str> {
        non_empty(&self.speech_api_key)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
