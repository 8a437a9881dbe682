//! Narration endpoints
//!
//! POST /narrate     - multipart upload, HTML result page
//! POST /api/narrate - multipart upload, JSON result

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};

use super::{page, AppState, CONFIG_HINT, GENERIC_ERROR, RETRY_HINT};
use crate::error::NarratorError;
use crate::narration::Narration;

/// Multipart field carrying the photo
pub const UPLOAD_FIELD: &str = "image";

/// Problems with the request body itself
#[derive(Debug, Error)]
enum UploadError {
    #[error("missing 'image' field")]
    MissingField,

    #[error("empty upload")]
    Empty,

    #[error("malformed multipart body: {0}")]
    Multipart(#[from] MultipartError),

    #[error("not a multipart upload: {0}")]
    NotMultipart(#[from] MultipartRejection),
}

/// JSON narration result
#[derive(Debug, Serialize)]
pub struct NarrateResponse {
    pub narrative: String,
    pub audio_base64: String,
    pub mime_type: String,
    pub filename: String,
}

impl From<&Narration> for NarrateResponse {
    fn from(narration: &Narration) -> Self {
        Self {
            narrative: narration.narrative.clone(),
            audio_base64: BASE64.encode(&narration.audio.bytes),
            mime_type: narration.audio.mime_type().to_string(),
            filename: narration.audio.filename(),
        }
    }
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub hint: &'static str,
}

/// Outcome of one request, before rendering
enum Outcome {
    Narrated(Narration),
    Unconfigured(String),
    BadUpload,
    Failed(StatusCode),
}

/// Pull the photo bytes out of the multipart body
async fn read_upload(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Vec<u8>, UploadError> {
    let mut multipart = multipart?;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(UPLOAD_FIELD) {
            let bytes = field.bytes().await?;
            if bytes.is_empty() {
                return Err(UploadError::Empty);
            }
            return Ok(bytes.to_vec());
        }
    }
    Err(UploadError::MissingField)
}

/// Status for a failed pipeline run
fn failure_status(err: &NarratorError) -> StatusCode {
    match err {
        NarratorError::InvalidImage(_) | NarratorError::UnsupportedImageFormat(_) => {
            StatusCode::BAD_REQUEST
        }
        _ => StatusCode::BAD_GATEWAY,
    }
}

/// Shared flow for both endpoints
async fn run(state: &AppState, multipart: Result<Multipart, MultipartRejection>) -> Outcome {
    // Configuration errors block everything, including reading the upload
    let narrator = match state.narrator() {
        Ok(narrator) => narrator,
        Err(e) => return Outcome::Unconfigured(e.to_string()),
    };

    let upload = match read_upload(multipart).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Rejected upload: {}", e);
            return Outcome::BadUpload;
        }
    };

    info!("Narrating upload of {} bytes", upload.len());
    match narrator.narrate(upload).await {
        Ok(narration) => Outcome::Narrated(narration),
        Err(e) => {
            error!("Narration failed: {}", e);
            Outcome::Failed(failure_status(&e))
        }
    }
}

/// Multipart upload, HTML result
pub async fn narrate_page(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    match run(&state, multipart).await {
        Outcome::Narrated(narration) => Html(page::result(&narration)).into_response(),
        Outcome::Unconfigured(message) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Html(page::index(Some(&message))),
        )
            .into_response(),
        Outcome::BadUpload => (
            StatusCode::BAD_REQUEST,
            Html(page::failure(GENERIC_ERROR, RETRY_HINT)),
        )
            .into_response(),
        Outcome::Failed(status) => {
            (status, Html(page::failure(GENERIC_ERROR, RETRY_HINT))).into_response()
        }
    }
}

/// Multipart upload, JSON result
pub async fn narrate_json(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let (status, error, hint) = match run(&state, multipart).await {
        Outcome::Narrated(narration) => {
            return Json(NarrateResponse::from(&narration)).into_response();
        }
        Outcome::Unconfigured(message) => (StatusCode::SERVICE_UNAVAILABLE, message, CONFIG_HINT),
        Outcome::BadUpload => (StatusCode::BAD_REQUEST, GENERIC_ERROR.to_string(), RETRY_HINT),
        Outcome::Failed(status) => (status, GENERIC_ERROR.to_string(), RETRY_HINT),
    };

    (status, Json(ErrorResponse { error, hint })).into_response()
}
