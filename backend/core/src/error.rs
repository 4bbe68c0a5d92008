use std::time::Duration;

use thiserror::Error;

/// Failure of the OCR capability. Always fatal for the request it belongs to.
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("OCR timed out after {0:?}")]
    Timeout(Duration),

    #[error("OCR engine failed: {0}")]
    Engine(String),

    #[error("image payload is empty")]
    EmptyImage,
}

/// Failure of the translation capability. Never fatal; it degrades the report.
#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("translation timed out after {0:?}")]
    Timeout(Duration),

    #[error("translation service unavailable: {0}")]
    Unavailable(String),

    #[error("translation HTTP error ({status}): {message}")]
    Http { status: u16, message: String },

    #[error("translation is disabled")]
    Disabled,
}

/// Top-level error type for LabelScan requests.
#[derive(Debug, Error)]
pub enum LabelError {
    #[error("invalid upload: {0}")]
    InvalidUpload(String),

    #[error("upload too large: {size} bytes (limit {limit})")]
    UploadTooLarge { size: usize, limit: usize },

    #[error("unsupported media type: {0}")]
    UnsupportedMedia(String),

    #[error(transparent)]
    Ocr(#[from] OcrError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("report not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LabelError {
    /// Upload-stage errors are rejected before the analysis pipeline runs.
    pub fn is_upload_error(&self) -> bool {
        matches!(
            self,
            LabelError::InvalidUpload(_)
                | LabelError::UploadTooLarge { .. }
                | LabelError::UnsupportedMedia(_)
        )
    }
}
