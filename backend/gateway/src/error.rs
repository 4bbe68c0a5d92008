//! HTTP mapping for request failures.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use labelscan_core::{LabelError, OcrError};
use serde_json::json;
use tracing::{error, warn};

#[derive(Debug)]
pub enum ApiError {
    Label(LabelError),
    RateLimited,
}

impl From<LabelError> for ApiError {
    fn from(e: LabelError) -> Self {
        ApiError::Label(e)
    }
}

pub fn status_for(e: &LabelError) -> StatusCode {
    match e {
        LabelError::InvalidUpload(_) => StatusCode::BAD_REQUEST,
        LabelError::UploadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        LabelError::UnsupportedMedia(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        LabelError::Ocr(OcrError::EmptyImage) => StatusCode::BAD_REQUEST,
        LabelError::Ocr(OcrError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
        LabelError::Ocr(OcrError::Engine(_)) => StatusCode::BAD_GATEWAY,
        LabelError::NotFound(_) => StatusCode::NOT_FOUND,
        LabelError::Config(_) | LabelError::Storage(_) | LabelError::Other(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "too many uploads, slow down".to_string(),
            ),
            ApiError::Label(e) => (status_for(e), e.to_string()),
        };
        if status.is_server_error() {
            error!(%status, error = %message, "Request failed");
        } else {
            warn!(%status, error = %message, "Request rejected");
        }
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn maps_failures_to_status() {
        let cases = [
            (LabelError::InvalidUpload("x".into()), 400),
            (LabelError::UploadTooLarge { size: 2, limit: 1 }, 413),
            (LabelError::UnsupportedMedia("text/plain".into()), 415),
            (LabelError::Ocr(OcrError::Timeout(Duration::from_secs(1))), 504),
            (LabelError::Ocr(OcrError::Engine("x".into())), 502),
            (LabelError::NotFound("id".into()), 404),
            (LabelError::Storage("disk".into()), 500),
        ];
        for (e, code) in cases {
            assert_eq!(status_for(&e).as_u16(), code, "{e}");
        }
    }

    #[test]
    fn rate_limited_is_429() {
        let response = ApiError::RateLimited.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}
