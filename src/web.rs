//! Web front end: server-rendered HTML pages over the same `Library` the
//! terminal front end uses.

mod handlers;
mod pages;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::error::StoreError;
use crate::library::Library;

/// Shared router state. Handlers take the lock for the duration of one
/// request, so record operations never interleave.
#[derive(Clone)]
pub struct AppState {
    library: Arc<Mutex<Library>>,
    load_warning: Arc<Mutex<Option<String>>>,
}

impl AppState {
    pub fn new(library: Library, load_warning: Option<StoreError>) -> Self {
        Self {
            library: Arc::new(Mutex::new(library)),
            load_warning: Arc::new(Mutex::new(load_warning.map(|err| {
                format!("Could not load library ({err}). Starting with an empty library.")
            }))),
        }
    }

    fn library(&self) -> MutexGuard<'_, Library> {
        self.library.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The load warning, handed out once.
    fn take_load_warning(&self) -> Option<String> {
        self.load_warning
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    fn flush(&self) -> Result<(), StoreError> {
        self.library().flush()
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::library_view))
        .route("/add", get(handlers::add_form).post(handlers::add_book))
        .route(
            "/remove",
            get(handlers::remove_form).post(handlers::remove_book),
        )
        .route("/remove/position", post(handlers::remove_position))
        .route("/search", get(handlers::search))
        .route("/stats", get(handlers::statistics))
        .with_state(state)
}

/// Serve until Ctrl+C (or SIGTERM), then write the library one last time.
pub async fn serve(
    library: Library,
    load_warning: Option<StoreError>,
    bind: &str,
    open_browser: bool,
) -> Result<()> {
    let state = AppState::new(library, load_warning);
    let app = build_router(state.clone());

    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    let addr = listener
        .local_addr()
        .context("failed to read listener address")?;
    let url = format!("http://{addr}/");
    info!("library web front end listening on {url}");

    if open_browser {
        if let Err(err) = open::that(&url) {
            warn!("could not open a browser at {url}: {err}");
        }
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown_signal())
        .await
        .context("web server failed")?;

    state.flush().context("failed to save library on shutdown")?;
    info!("library saved, web front end stopped");
    Ok(())
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => {}
                    _ = tokio::signal::ctrl_c() => {}
                }
                info!("shutdown signal received");
                return;
            }
            Err(err) => warn!("could not register SIGTERM handler: {err}"),
        }
    }
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("could not listen for ctrl+c: {err}");
    }
    info!("shutdown signal received");
}
