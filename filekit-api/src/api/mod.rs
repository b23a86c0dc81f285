//! Router, shared state and the handlers behind every tool endpoint.
//!
//! Each tool handler follows the same lifecycle: read the multipart form,
//! persist the input, run the tool (an external process for media, the PDF
//! and document libraries on the blocking pool for everything else), write
//! the output under `processed/` and answer with its download URL.

mod documents;
mod download;
mod format;
mod media;
mod pdf;
mod upload;

pub use format::{FormatRequest, FormatResponse};
pub use upload::{UploadForm, UploadedFile};

use crate::config::ServerConfig;
use crate::error::AppError;
use axum::{
    extract::DefaultBodyLimit,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use filekit::{ToolInvoker, TransientStorage};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;

/// State shared by every handler. Cloning is cheap: the invoker's job
/// slots live behind an `Arc`.
#[derive(Debug, Clone)]
pub struct AppState {
    pub storage: TransientStorage,
    pub invoker: ToolInvoker,
    pub body_limit: usize,
}

impl AppState {
    /// Build the state for `config`, creating the storage directories.
    pub async fn from_config(config: &ServerConfig) -> filekit::Result<Self> {
        let storage = TransientStorage::new(&config.data_dir);
        storage.prepare().await?;
        Ok(Self {
            storage,
            invoker: ToolInvoker::new(config.invoker_config()),
            body_limit: config.body_limit(),
        })
    }
}

/// Successful tool response: where to fetch the result.
#[derive(Debug, Serialize, Deserialize)]
pub struct ToolResponse {
    pub url: String,
}

impl ToolResponse {
    pub fn for_path(path: &Path) -> Json<Self> {
        Json(Self {
            url: TransientStorage::download_url(path),
        })
    }
}

/// Build the application router with all routes configured.
///
/// # Routes
///
/// - `GET /api/health`
/// - `POST /api/tools/{convert,compressor,chop}`: media tools
/// - `POST /api/tools/pdf/{split,rotate,organize,merge,watermark}`
/// - `POST /api/tools/{word-to-pdf,image-to-pdf}`
/// - `POST /api/tools/format`: JSON body, answered inline
/// - `GET /api/download?file=<name>`
pub fn app(state: AppState) -> Router {
    let body_limit = state.body_limit;

    Router::new()
        .route("/api/health", get(health_check))
        // Media
        .route("/api/tools/convert", post(media::convert))
        .route("/api/tools/compressor", post(media::compress))
        .route("/api/tools/chop", post(media::chop))
        // PDF
        .route("/api/tools/pdf/split", post(pdf::split))
        .route("/api/tools/pdf/rotate", post(pdf::rotate))
        .route("/api/tools/pdf/organize", post(pdf::organize))
        .route("/api/tools/pdf/merge", post(pdf::merge))
        .route("/api/tools/pdf/watermark", post(pdf::watermark))
        // Documents
        .route("/api/tools/word-to-pdf", post(documents::word_to_pdf))
        .route("/api/tools/image-to-pdf", post(documents::image_to_pdf))
        .route("/api/tools/format", post(format::format))
        .route("/api/download", get(download::download))
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Health check endpoint for monitoring and load balancing
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "filekit API",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Run CPU-bound library work on the blocking pool.
pub(crate) async fn blocking<T, F>(work: F) -> Result<T, AppError>
where
    F: FnOnce() -> filekit::Result<T> + Send + 'static,
    T: Send + 'static,
{
    Ok(tokio::task::spawn_blocking(work).await??)
}

/// Remove a half-written output after a failed run.
pub(crate) async fn discard(path: &Path) {
    if let Err(err) = tokio::fs::remove_file(path).await {
        if err.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %err, "failed to remove partial output");
        }
    }
}
