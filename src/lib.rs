pub mod api;
pub mod config;
pub mod model;
pub mod poller;
pub mod session;
pub mod store;

use api::{ApiError, CaptureControl, HttpBackend};
use config::AppConfig;
use poller::SegmentPoller;
use session::EditorSession;
use std::collections::HashSet;
use std::sync::Arc;
use store::SharedStore;
use tokio::sync::{Mutex, MutexGuard};

/// One backend, one store, one poller and one editor session.
pub struct NotesApp {
    backend: Arc<HttpBackend>,
    store: SharedStore,
    poller: SegmentPoller,
    editor: Mutex<EditorSession>,
}

impl NotesApp {
    pub fn new(config: &AppConfig) -> Result<Self, ApiError> {
        let backend = Arc::new(HttpBackend::from_config(config)?);
        let store = SharedStore::new();
        let poller = SegmentPoller::new(backend.clone(), store.clone(), config.poll_interval());
        let editor = Mutex::new(EditorSession::new(backend.clone(), store.clone()));

        Ok(Self {
            backend,
            store,
            poller,
            editor,
        })
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn poller(&self) -> &SegmentPoller {
        &self.poller
    }

    pub fn backend(&self) -> &HttpBackend {
        &self.backend
    }

    /// The app's only editor session. Holding the guard across a submit
    /// keeps other callers out until the backend answers.
    pub async fn editor(&self) -> MutexGuard<'_, EditorSession> {
        self.editor.lock().await
    }

    /// Begin polling, then ask the backend to start capturing. Polling stays
    /// on even if the acknowledgement fails.
    pub async fn start_listening(&self) -> Result<(), ApiError> {
        self.poller.start();
        self.backend.start_listening().await.map_err(|e| {
            tracing::error!("Error starting listening: {}", e);
            e
        })
    }

    pub async fn stop_listening(&self) -> Result<(), ApiError> {
        self.poller.stop();
        self.backend.stop_listening().await.map_err(|e| {
            tracing::error!("Error stopping listening: {}", e);
            e
        })
    }
}

/// Headless run: listen until Ctrl+C, logging segments as they arrive.
pub async fn run() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Load environment variables from .env file
    let _ = dotenvy::dotenv();

    let config = config::load()?;
    tracing::info!(
        "Using backend {} (poll every {}ms)",
        config.backend_url,
        config.poll_interval_ms
    );

    let app = NotesApp::new(&config)?;
    let _ = app.start_listening().await;

    let mut revisions = app.store().subscribe();
    let store = app.store().clone();
    let reporter = tokio::spawn(async move {
        let mut seen = HashSet::new();
        while revisions.changed().await.is_ok() {
            for segment in store.snapshot() {
                if seen.insert(segment.id.clone()) {
                    tracing::info!("Segment {}: {}", segment.id, segment.text);
                }
            }
        }
    });

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down...");

    let _ = app.stop_listening().await;
    reporter.abort();

    if config.summary_on_stop {
        match app.backend().conversation_summary().await {
            Ok(summary) => tracing::info!("Conversation summary: {}", summary),
            Err(e) => tracing::warn!("Error fetching conversation summary: {}", e),
        }
    }

    Ok(())
}
