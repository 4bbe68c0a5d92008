//! Upload validation and on-disk storage.
//!
//! Validation runs before anything is written or analyzed: an upload that
//! fails here never reaches OCR.

use std::path::{Path, PathBuf};

use labelscan_core::LabelError;
use serde::Serialize;
use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

use crate::mime_detect::{is_acceptable_content_type, ImageFormat};

/// Check size, declared type, and signature. Returns the sniffed format.
pub fn validate_upload(
    data: &[u8],
    content_type: Option<&str>,
    limit: usize,
) -> Result<ImageFormat, LabelError> {
    if data.is_empty() {
        return Err(LabelError::InvalidUpload("no image data provided".into()));
    }
    if data.len() > limit {
        return Err(LabelError::UploadTooLarge {
            size: data.len(),
            limit,
        });
    }
    if let Some(content_type) = content_type {
        if !is_acceptable_content_type(content_type) {
            return Err(LabelError::UnsupportedMedia(content_type.to_string()));
        }
    }
    ImageFormat::sniff(data)
        .ok_or_else(|| LabelError::UnsupportedMedia("unrecognized image signature".into()))
}

/// A saved upload.
#[derive(Debug, Clone, Serialize)]
pub struct StoredUpload {
    pub id: Uuid,
    /// `<id>.<ext>`, relative to the store directory
    pub filename: String,
    #[serde(skip)]
    pub path: PathBuf,
    pub mime: &'static str,
    pub size: usize,
}

/// Flat directory of uploads named `<uuid>.<ext>`.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn ensure_dir(&self) -> Result<(), LabelError> {
        fs::create_dir_all(&self.dir).await.map_err(|e| {
            LabelError::Storage(format!("cannot create {}: {e}", self.dir.display()))
        })
    }

    pub async fn save(&self, data: &[u8], format: ImageFormat) -> Result<StoredUpload, LabelError> {
        self.ensure_dir().await?;
        let id = Uuid::new_v4();
        let filename = format!("{id}.{}", format.extension());
        let path = self.dir.join(&filename);

        fs::write(&path, data)
            .await
            .map_err(|e| LabelError::Storage(format!("cannot write {}: {e}", path.display())))?;

        info!(%id, mime = format.mime(), bytes = data.len(), "Stored upload");
        Ok(StoredUpload {
            id,
            filename,
            path,
            mime: format.mime(),
            size: data.len(),
        })
    }

    /// Resolve a stored filename, refusing anything that could escape the
    /// store directory.
    pub fn resolve(&self, filename: &str) -> Option<PathBuf> {
        let safe = !filename.is_empty()
            && !filename.contains("..")
            && !filename.contains('/')
            && !filename.contains('\\');
        if !safe {
            debug!(%filename, "Rejected suspicious upload path");
            return None;
        }
        Some(self.dir.join(filename))
    }

    pub async fn remove(&self, filename: &str) -> Result<(), LabelError> {
        let Some(path) = self.resolve(filename) else {
            return Err(LabelError::NotFound(filename.to_string()));
        };
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(LabelError::NotFound(filename.to_string()))
            }
            Err(e) => Err(LabelError::Storage(format!("cannot remove {}: {e}", path.display()))),
        }
    }
}
