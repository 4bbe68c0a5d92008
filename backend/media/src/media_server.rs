//! Serves stored label images over HTTP.
//!
//! Mount at `/uploads`:
//!   GET /uploads/:filename  returns the stored image, with its sniffed type

use axum::{
    Router,
    extract::{Path, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use tokio::fs;
use tracing::{debug, warn};

use crate::mime_detect::ImageFormat;
use crate::upload::UploadStore;

pub fn upload_router(store: UploadStore) -> Router {
    Router::new()
        .route("/:filename", get(serve_upload))
        .with_state(store)
}

pub async fn serve_upload(
    Path(filename): Path<String>,
    State(store): State<UploadStore>,
) -> Response {
    let Some(path) = store.resolve(&filename) else {
        return (StatusCode::BAD_REQUEST, "Invalid filename").into_response();
    };
    debug!(path = %path.display(), "Serving upload");

    match fs::read(&path).await {
        Ok(bytes) => {
            let mime = ImageFormat::sniff(&bytes)
                .or_else(|| ImageFormat::from_path(&path))
                .map(ImageFormat::mime)
                .unwrap_or("application/octet-stream");
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, HeaderValue::from_static(mime)),
                    (header::CACHE_CONTROL, HeaderValue::from_static("public, max-age=86400")),
                ],
                bytes,
            )
                .into_response()
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            (StatusCode::NOT_FOUND, "Upload not found").into_response()
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read upload");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to read upload").into_response()
        }
    }
}
