//! Common test utilities - NarratordTest harness for end-to-end testing
//!
//! Starts a real narratord server on a random port, wired to a fake upstream
//! that stands in for the vision and speech providers and records every call.

use std::convert::Infallible;
use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use axum::{
    body::{Body, Bytes},
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use narratord::{Config, Server};
use reqwest::{multipart, Client};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// The example narrative from the curator prompt
pub const ROMAN_COIN: &str = "This ancient Roman coin dates back to 100 AD.<#0.5#>It features the profile of Emperor Trajan on one side.<#0.5#>Such coins were used throughout the Roman Empire for daily commerce.";

/// One request received by the fake upstream
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub service: &'static str,
    pub path: String,
    pub credential: Option<String>,
    pub body: serde_json::Value,
}

/// How the fake upstream answers vision requests
#[derive(Debug, Clone)]
pub enum VisionReply {
    Text(String),
    Status(u16),
}

/// How the fake upstream answers speech requests
#[derive(Debug, Clone)]
pub enum SpeechReply {
    /// Audio delivered as a stream of these chunks
    Chunks(Vec<Vec<u8>>),
    Status(u16),
}

#[derive(Debug)]
struct UpstreamState {
    vision: VisionReply,
    speech: SpeechReply,
    calls: Vec<RecordedCall>,
}

type Shared = Arc<Mutex<UpstreamState>>;

/// Fake vision and speech provider
pub struct FakeUpstream {
    pub addr: SocketAddr,
    state: Shared,
    _handle: JoinHandle<()>,
}

impl FakeUpstream {
    pub async fn start() -> Result<Self> {
        let state = Arc::new(Mutex::new(UpstreamState {
            vision: VisionReply::Text(ROMAN_COIN.to_string()),
            speech: SpeechReply::Chunks(vec![b"ID3".to_vec(), b"fake-mp3-frames".to_vec()]),
            calls: Vec::new(),
        }));

        let app = Router::new()
            .route("/v1/chat/completions", post(openai_chat))
            .route("/v1beta/models/{model}", post(gemini_generate))
            .route("/v1/text_to_speech", post(minimax_speech))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Fake upstream error: {}", e);
            }
        });

        Ok(Self {
            addr,
            state,
            _handle: handle,
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn set_vision(&self, reply: VisionReply) {
        self.state.lock().unwrap().vision = reply;
    }

    pub fn set_speech(&self, reply: SpeechReply) {
        self.state.lock().unwrap().speech = reply;
    }

    /// Every call received so far
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Calls received for one service
    pub fn calls_to(&self, service: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.service == service)
            .collect()
    }
}

fn record(
    state: &Shared,
    service: &'static str,
    path: String,
    credential: Option<String>,
    body: &Bytes,
) {
    let body = serde_json::from_slice(body).unwrap_or(serde_json::Value::Null);
    state.lock().unwrap().calls.push(RecordedCall {
        service,
        path,
        credential,
        body,
    });
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn status(code: u16) -> Response {
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, "upstream failure").into_response()
}

async fn openai_chat(State(state): State<Shared>, headers: HeaderMap, body: Bytes) -> Response {
    record(
        &state,
        "openai",
        "/v1/chat/completions".to_string(),
        header_value(&headers, "authorization"),
        &body,
    );
    let reply = state.lock().unwrap().vision.clone();
    match reply {
        VisionReply::Text(text) => Json(serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": text } }]
        }))
        .into_response(),
        VisionReply::Status(code) => status(code),
    }
}

async fn gemini_generate(
    State(state): State<Shared>,
    Path(model): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    record(
        &state,
        "gemini",
        format!("/v1beta/models/{}", model),
        header_value(&headers, "x-goog-api-key"),
        &body,
    );
    let reply = state.lock().unwrap().vision.clone();
    match reply {
        VisionReply::Text(text) => Json(serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": text }], "role": "model" } }]
        }))
        .into_response(),
        VisionReply::Status(code) => status(code),
    }
}

async fn minimax_speech(State(state): State<Shared>, headers: HeaderMap, body: Bytes) -> Response {
    record(
        &state,
        "minimax",
        "/v1/text_to_speech".to_string(),
        header_value(&headers, "authorization"),
        &body,
    );
    let reply = state.lock().unwrap().speech.clone();
    match reply {
        SpeechReply::Chunks(chunks) => {
            let stream = futures_util::stream::iter(chunks.into_iter().map(Ok::<_, Infallible>));
            (
                [(header::CONTENT_TYPE, "audio/mpeg")],
                Body::from_stream(stream),
            )
                .into_response()
        }
        SpeechReply::Status(code) => status(code),
    }
}

/// Test harness that runs narratord in-process against a fake upstream
pub struct NarratordTest {
    pub addr: SocketAddr,
    pub client: Client,
    pub upstream: FakeUpstream,
    server: Arc<Server>,
    _handle: JoinHandle<()>,
}

impl NarratordTest {
    /// Start with both credentials set, OpenAI vision and MiniMax speech
    pub async fn start() -> Result<Self> {
        Self::start_with(|_| {}).await
    }

    /// Start with a configuration tweak applied on top of the defaults
    pub async fn start_with(configure: impl FnOnce(&mut Config)) -> Result<Self> {
        let upstream = FakeUpstream::start().await?;

        // Find a random available port
        let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
        let addr = listener.local_addr()?;
        drop(listener);

        let mut config = Config {
            bind_addr: addr,
            vision_api_key: Some("test-vision-key".to_string()),
            speech_api_key: Some("test-speech-key".to_string()),
            openai_base_url: format!("{}/v1", upstream.base_url()),
            gemini_base_url: upstream.base_url(),
            minimax_base_url: upstream.base_url(),
            request_timeout_secs: Some(5),
            ..Config::default()
        };
        configure(&mut config);

        let server = Arc::new(Server::new(config).await?);
        let server_clone = server.clone();

        // Spawn the server in a background task
        let handle = tokio::spawn(async move {
            if let Err(e) = server_clone.run().await {
                eprintln!("Server error: {}", e);
            }
        });

        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        // Poll until server is ready (max 2 seconds)
        let mut ready = false;
        for _ in 0..20 {
            tokio::time::sleep(Duration::from_millis(100)).await;
            if client
                .get(format!("http://{}/health", addr))
                .send()
                .await
                .is_ok()
            {
                ready = true;
                break;
            }
        }

        if !ready {
            anyhow::bail!("Server failed to start within 2 seconds");
        }

        Ok(Self {
            addr,
            client,
            upstream,
            server,
            _handle: handle,
        })
    }

    /// Get the base URL for the server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<reqwest::Response> {
        Ok(self
            .client
            .get(format!("{}{}", self.base_url(), path))
            .send()
            .await?)
    }

    /// Upload a photo as the `image` multipart field
    pub async fn upload(&self, path: &str, photo: Vec<u8>) -> Result<reqwest::Response> {
        let part = multipart::Part::bytes(photo)
            .file_name("artifact.png")
            .mime_str("image/png")?;
        self.post_form(path, multipart::Form::new().part("image", part))
            .await
    }

    /// Post an arbitrary multipart form
    pub async fn post_form(&self, path: &str, form: multipart::Form) -> Result<reqwest::Response> {
        Ok(self
            .client
            .post(format!("{}{}", self.base_url(), path))
            .multipart(form)
            .send()
            .await?)
    }

    /// Post a plain text body, not multipart
    pub async fn post_text(&self, path: &str, text: &str) -> Result<reqwest::Response> {
        Ok(self
            .client
            .post(format!("{}{}", self.base_url(), path))
            .header(reqwest::header::CONTENT_TYPE, "text/plain")
            .body(text.to_string())
            .send()
            .await?)
    }

    pub fn is_configured(&self) -> bool {
        self.server.is_configured()
    }
}

impl Drop for NarratordTest {
    fn drop(&mut self) {
        self.server.shutdown();
    }
}

/// A small PNG photo
pub fn sample_png() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(8, 6, image::Rgb([201, 160, 75]));
    let mut out = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
        .unwrap();
    out
}
