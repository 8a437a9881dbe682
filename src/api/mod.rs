//! HTTP API module - upload page, narration endpoints and health check

mod narrate;
mod page;

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, State},
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::error::NarratorError;
use crate::narration::Narrator;

/// Shown whenever a narration fails for a reason other than configuration
pub const GENERIC_ERROR: &str = "An error occurred while narrating this artifact.";

/// Follow-up hint shown under the generic error
pub const RETRY_HINT: &str = "Please check your API keys and try again.";

/// Shown under configuration errors
pub const CONFIG_HINT: &str =
    "Ensure VISION_API_KEY and SPEECH_API_KEY are set in the environment or configuration file.";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    narrator: Result<Narrator, Arc<NarratorError>>,
}

impl AppState {
    pub fn new(narrator: Result<Narrator, NarratorError>) -> Self {
        Self {
            narrator: narrator.map_err(Arc::new),
        }
    }

    /// The narrator, or the configuration error that prevented building it
    pub fn narrator(&self) -> Result<&Narrator, &NarratorError> {
        self.narrator.as_ref().map_err(|e| e.as_ref())
    }

    pub fn is_configured(&self) -> bool {
        self.narrator.is_ok()
    }
}

/// Build the API router
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/narrate", post(narrate::narrate_page))
        .route("/api/narrate", post(narrate::narrate_json))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .with_state(state)
}

/// Upload page
async fn index(State(state): State<AppState>) -> impl IntoResponse {
    let config_error = state.narrator().err().map(|e| e.to_string());
    Html(page::index(config_error.as_deref()))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    configured: bool,
}

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        configured: state.is_configured(),
    })
}
