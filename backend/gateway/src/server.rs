//! Router assembly and the serve loop.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use labelscan_analysis::LabelAnalyzer;
use labelscan_config::GatewayConfig;
use labelscan_core::OcrEngine;
use labelscan_media::{UploadStore, upload_router};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, instrument};

use crate::handlers;
use crate::rate_limit::RateLimiter;
use crate::registry::ReportRegistry;

/// Multipart framing allowed on top of the image size limit.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Application state shared across routes.
#[derive(Clone)]
pub struct GatewayState {
    pub analyzer: Arc<LabelAnalyzer>,
    pub ocr: Arc<dyn OcrEngine>,
    pub store: UploadStore,
    pub registry: ReportRegistry,
    pub limiter: Option<RateLimiter>,
    pub max_upload_bytes: usize,
    pub public_base_url: Option<String>,
    pub started_at: Instant,
}

impl GatewayState {
    pub fn new(config: &GatewayConfig, analyzer: LabelAnalyzer, ocr: Arc<dyn OcrEngine>) -> Self {
        Self {
            analyzer: Arc::new(analyzer),
            ocr,
            store: UploadStore::new(config.upload_dir()),
            registry: ReportRegistry::new(config.max_reports()),
            limiter: config.rate_limit.as_ref().map(RateLimiter::from_config),
            max_upload_bytes: config.max_upload_bytes(),
            public_base_url: config
                .public_base_url
                .as_deref()
                .map(|url| url.trim_end_matches('/').to_string()),
            started_at: Instant::now(),
        }
    }
}

pub fn build_router(state: GatewayState) -> Router {
    let body_limit = state.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD);
    let store = state.store.clone();

    Router::new()
        .route("/api/upload", post(handlers::upload))
        .route("/api/reports", get(handlers::list_reports))
        .route("/api/reports/:id", get(handlers::get_report))
        .route("/api/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
        .nest("/uploads", upload_router(store))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Bind `addr` and serve until the process is stopped.
#[instrument(skip(state))]
pub async fn start_server(addr: SocketAddr, state: GatewayState) -> Result<()> {
    state.store.ensure_dir().await?;
    let app = build_router(state);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("cannot bind {addr}"))?;
    info!(%addr, "LabelScan gateway listening");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("gateway server error")?;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutdown signal received");
}
