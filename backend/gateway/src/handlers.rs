//! Route handlers.

use std::net::SocketAddr;

use axum::{
    Json,
    extract::{ConnectInfo, FromRequest, Multipart, Path, Query, Request, State},
    http::{HeaderMap, StatusCode, header},
};
use bytes::Bytes;
use chrono::Utc;
use labelscan_core::LabelError;
use labelscan_logging::{AnalysisEvent, EventLogger};
use labelscan_media::validate_upload;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ApiError;
use crate::registry::LabelResult;
use crate::server::GatewayState;

/// `POST /api/upload`: raw image body, or multipart with a `file` field.
pub async fn upload(
    State(state): State<GatewayState>,
    connect: Option<ConnectInfo<SocketAddr>>,
    request: Request,
) -> Result<Json<LabelResult>, ApiError> {
    let client = client_key(connect.as_ref(), request.headers());
    if let Some(limiter) = &state.limiter {
        if !limiter.check(&client).await {
            return Err(ApiError::RateLimited);
        }
    }

    let base_url = base_url(&state, request.headers());
    let (data, declared) = read_upload(request, state.max_upload_bytes).await?;
    let format = validate_upload(&data, declared.as_deref(), state.max_upload_bytes)?;
    let stored = state.store.save(&data, format).await?;
    let id = stored.id.to_string();
    EventLogger::log_event(
        &id,
        AnalysisEvent::UploadReceived {
            filename: stored.filename.clone(),
            mime: stored.mime.to_string(),
            bytes: stored.size,
        },
    );

    let report = match state.analyzer.analyze_image(state.ocr.as_ref(), &data).await {
        Ok(report) => report,
        Err(e) => {
            EventLogger::log_event(
                &id,
                AnalysisEvent::RequestFailed {
                    stage: "ocr".into(),
                    error_msg: e.to_string(),
                },
            );
            // No report will reference the image
            if let Err(cleanup) = state.store.remove(&stored.filename).await {
                warn!(error = %cleanup, "Failed to remove orphaned upload");
            }
            return Err(e.into());
        }
    };

    EventLogger::log_event(
        &id,
        AnalysisEvent::ReportReady {
            nutrients: report.nutrients().len(),
            allergens: report.allergens().len(),
            warnings: report.warnings().to_vec(),
            translated: report.translation().is_some(),
        },
    );

    let result = LabelResult {
        id: stored.id,
        filename: stored.filename,
        text: report.source_raw_text().as_str().to_string(),
        report,
        created_at: Utc::now(),
        detail_url: format!("{base_url}/api/reports/{id}"),
    };
    if let Some(evicted) = state.registry.insert(result.clone()).await {
        // Evicted reports take their image with them
        if let Err(e) = state.store.remove(&evicted.filename).await {
            warn!(id = %evicted.id, error = %e, "Failed to remove evicted upload");
        }
    }
    info!(%id, "Label analyzed");
    Ok(Json(result))
}

async fn read_upload(request: Request, limit: usize) -> Result<(Bytes, Option<String>), LabelError> {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let is_multipart = content_type
        .as_deref()
        .is_some_and(|ct| ct.starts_with("multipart/form-data"));
    if !is_multipart {
        let declared_len = request
            .headers()
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<usize>().ok());
        if let Some(size) = declared_len.filter(|&size| size > limit) {
            return Err(LabelError::UploadTooLarge { size, limit });
        }
        let data = axum::body::to_bytes(request.into_body(), limit.saturating_add(1))
            .await
            .map_err(|_| LabelError::UploadTooLarge {
                size: declared_len.unwrap_or(limit.saturating_add(1)),
                limit,
            })?;
        return Ok((data, content_type));
    }

    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|e| LabelError::InvalidUpload(e.body_text()))?;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let declared = field.content_type().map(str::to_string);
        let data = field.bytes().await.map_err(|e| multipart_error(e, limit))?;
        return Ok((data, declared));
    }
    Err(LabelError::InvalidUpload("no file provided".into()))
}

fn multipart_error(e: axum::extract::multipart::MultipartError, limit: usize) -> LabelError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        LabelError::UploadTooLarge {
            size: limit.saturating_add(1),
            limit,
        }
    } else {
        LabelError::InvalidUpload(e.body_text())
    }
}

fn client_key(connect: Option<&ConnectInfo<SocketAddr>>, headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| connect.map(|ConnectInfo(addr)| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

fn base_url(state: &GatewayState, headers: &HeaderMap) -> String {
    if let Some(url) = &state.public_base_url {
        return url.clone();
    }
    headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(|host| format!("http://{host}"))
        .unwrap_or_default()
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<usize>,
}

/// `GET /api/reports`, most recent first.
pub async fn list_reports(
    State(state): State<GatewayState>,
    Query(query): Query<ListQuery>,
) -> Json<Value> {
    let reports = state.registry.list(query.limit).await;
    Json(json!({
        "total": state.registry.len().await,
        "reports": reports,
    }))
}

/// `GET /api/reports/:id`
pub async fn get_report(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> Result<Json<LabelResult>, ApiError> {
    let parsed = Uuid::parse_str(&id).map_err(|_| LabelError::NotFound(id.clone()))?;
    state
        .registry
        .get(&parsed)
        .await
        .map(Json)
        .ok_or_else(|| LabelError::NotFound(id).into())
}

/// `GET /api/health`
pub async fn health(State(state): State<GatewayState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "labelscan",
        "version": env!("CARGO_PKG_VERSION"),
        "uptimeSeconds": state.started_at.elapsed().as_secs(),
        "reports": state.registry.len().await,
        "ocrEngine": state.ocr.name(),
        "translation": state.analyzer.translation_enabled(),
    }))
}
