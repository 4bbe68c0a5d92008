//! `labelscan status`: ask a running gateway for its health.

use anyhow::{Context, Result};
use serde_json::Value;

use crate::terminal_output::{note_error, note_success};

pub async fn run(base_url: &str) -> Result<bool> {
    let url = format!("{}/api/health", base_url.trim_end_matches('/'));
    let response = match reqwest::Client::new().get(&url).send().await {
        Ok(response) => response,
        Err(_) => {
            note_error(&format!("LabelScan is not running at {base_url}"));
            return Ok(false);
        }
    };

    if !response.status().is_success() {
        note_error(&format!("Health check returned {}", response.status()));
        return Ok(false);
    }
    let body: Value = response.json().await.context("health response was not JSON")?;
    note_success(&format!(
        "LabelScan {} up {}s, {} report(s), OCR engine {}, translation {}",
        body["version"].as_str().unwrap_or("?"),
        body["uptimeSeconds"],
        body["reports"],
        body["ocrEngine"].as_str().unwrap_or("?"),
        if body["translation"].as_bool().unwrap_or(false) { "on" } else { "off" },
    ));
    Ok(true)
}
