//! narratord - museum artifact narrator daemon
//!
//! Upload a photo of an artifact, get a three-sentence story from a vision
//! model and an audio narration of it from a speech backend.

pub mod api;
pub mod artifact;
pub mod config;
pub mod error;
pub mod narration;
pub mod speech;
pub mod vision;

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Result;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info};

pub use config::Config;
pub use error::NarratorError;
pub use narration::{Narration, Narrator};

/// HTTP client shared by a backend, with the timeout if one is configured
pub(crate) fn http_client(config: &Config) -> Result<reqwest::Client, NarratorError> {
    let mut builder = reqwest::Client::builder();
    if let Some(secs) = config.request_timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    Ok(builder.build()?)
}

/// The narratord server instance
pub struct Server {
    config: Config,
    state: api::AppState,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl Server {
    /// Create a new server instance
    ///
    /// Configuration problems (missing credentials, unknown backends) do not
    /// stop the server: they are logged here and shown on every page.
    pub async fn new(config: Config) -> Result<Self> {
        let narrator = match Narrator::from_config(&config) {
            Ok(narrator) => Ok(narrator),
            Err(e) if e.is_configuration() => {
                error!("Narration disabled: {}", e);
                Err(e)
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self::with_state(config, api::AppState::new(narrator)))
    }

    /// Create a server around an already-built narrator
    pub fn with_narrator(config: Config, narrator: Narrator) -> Self {
        Self::with_state(config, api::AppState::new(Ok(narrator)))
    }

    fn with_state(config: Config, state: api::AppState) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            config,
            state,
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// Build the router
    fn router(&self) -> Router {
        api::router(self.state.clone(), self.config.max_upload_bytes)
    }

    /// Run the server until shutdown
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        let local_addr = listener.local_addr()?;
        info!("narratord listening on {}", local_addr);

        let router = self.router();
        let mut shutdown_rx = self.shutdown_rx.clone();

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                shutdown_rx.changed().await.ok();
            })
            .await?;

        info!("narratord shutdown complete");
        Ok(())
    }

    /// Signal the server to shutdown
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Get the configured bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }

    /// True when both backends were built successfully
    pub fn is_configured(&self) -> bool {
        self.state.is_configured()
    }
}
