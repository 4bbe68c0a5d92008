//! Tesseract CLI adapter.
//!
//! One `tesseract <image> stdout` run per page-segmentation mode. Label
//! layouts vary (tables, single columns, sparse text), so the passes are
//! merged: unique non-empty lines, first-seen order.

use std::collections::HashSet;
use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use labelscan_config::defaults::DEFAULT_PAGE_SEG_MODES;
use labelscan_config::OcrConfig;
use labelscan_core::{OcrEngine, OcrError, RawText};
use tokio::process::Command;
use tracing::{debug, warn};

pub struct TesseractOcr {
    command: String,
    languages: String,
    page_seg_modes: Vec<u8>,
}

impl TesseractOcr {
    pub fn new() -> Self {
        Self::from_config(&OcrConfig::default())
    }

    pub fn from_config(config: &OcrConfig) -> Self {
        let page_seg_modes = if config.page_seg_modes.is_empty() {
            DEFAULT_PAGE_SEG_MODES.to_vec()
        } else {
            config.page_seg_modes.clone()
        };
        Self {
            command: config.tesseract_cmd().to_string(),
            languages: config.language_hint(),
            page_seg_modes,
        }
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }

    async fn run_pass(&self, image: &Path, psm: u8) -> Result<String, OcrError> {
        let output = Command::new(&self.command)
            .arg(image)
            .arg("stdout")
            .args(["-l", &self.languages])
            .args(["--oem", "3", "--psm", &psm.to_string()])
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| OcrError::Engine(format!("failed to run {}: {e}", self.command)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::Engine(format!(
                "tesseract --psm {psm} exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for TesseractOcr {
    fn default() -> Self {
        Self::new()
    }
}

/// Unique trimmed non-empty lines across all passes, in first-seen order.
pub fn merge_passes<'a>(passes: impl IntoIterator<Item = &'a str>) -> String {
    let mut seen = HashSet::new();
    let mut lines = Vec::new();
    for pass in passes {
        for line in pass.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if seen.insert(line) {
                lines.push(line);
            }
        }
    }
    lines.join("\n")
}

#[async_trait]
impl OcrEngine for TesseractOcr {
    fn name(&self) -> &str {
        "tesseract"
    }

    async fn recognize(&self, image: &[u8]) -> Result<RawText, OcrError> {
        if image.is_empty() {
            return Err(OcrError::EmptyImage);
        }

        let file = tempfile::Builder::new()
            .prefix("labelscan-ocr-")
            .tempfile()
            .map_err(|e| OcrError::Engine(format!("temp file: {e}")))?;
        tokio::fs::write(file.path(), image)
            .await
            .map_err(|e| OcrError::Engine(format!("temp file: {e}")))?;

        let mut passes = Vec::with_capacity(self.page_seg_modes.len());
        let mut last_error = None;
        for &psm in &self.page_seg_modes {
            match self.run_pass(file.path(), psm).await {
                Ok(text) => {
                    debug!(psm, chars = text.chars().count(), "Tesseract pass complete");
                    passes.push(text);
                }
                Err(e) => {
                    warn!(psm, error = %e, "Tesseract pass failed");
                    last_error = Some(e);
                }
            }
        }

        // Only fail when no pass produced output
        if passes.is_empty() {
            return Err(last_error.unwrap_or_else(|| OcrError::Engine("no OCR passes configured".into())));
        }
        Ok(RawText::new(merge_passes(passes.iter().map(String::as_str))))
    }
}
