//! Config file loading.

use crate::schema::LabelScanConfig;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Default config file name within the config directory.
const CONFIG_FILE_NAME: &str = "labelscan.yaml";

/// Resolve the LabelScan config directory.
/// Priority: `LABELSCAN_CONFIG_DIR` env > `~/.labelscan/` > `./.labelscan`
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("LABELSCAN_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    match dirs::home_dir() {
        Some(home) => home.join(".labelscan"),
        None => PathBuf::from(".labelscan"),
    }
}

/// Resolve the full path to the main config file.
pub fn config_file_path(config_dir: &Path) -> PathBuf {
    config_dir.join(CONFIG_FILE_NAME)
}

/// Read the raw YAML tree from disk, before env substitution.
///
/// Returns `Ok(None)` if the file doesn't exist (first run).
pub async fn load_config_value(path: &Path) -> Result<Option<serde_json::Value>> {
    if !path.exists() {
        debug!(path = %path.display(), "Config file does not exist; using defaults");
        return Ok(None);
    }

    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let value = parse_yaml(&raw)
        .with_context(|| format!("Failed to parse config YAML at: {}", path.display()))?;

    info!(path = %path.display(), "Loaded config");
    Ok(Some(value))
}

/// Parse YAML text into a JSON value tree. An empty document yields `{}`.
pub fn parse_yaml(raw: &str) -> Result<serde_json::Value> {
    if raw.trim().is_empty() {
        return Ok(serde_json::Value::Object(Default::default()));
    }
    let value: serde_json::Value = serde_yaml::from_str(raw)?;
    Ok(match value {
        serde_json::Value::Null => serde_json::Value::Object(Default::default()),
        other => other,
    })
}

/// Load and parse the typed config from disk, without env substitution.
pub async fn load_config(path: &Path) -> Result<LabelScanConfig> {
    match load_config_value(path).await? {
        Some(value) => serde_json::from_value(value)
            .with_context(|| format!("Invalid config at: {}", path.display())),
        None => Ok(LabelScanConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("nope.yaml")).await.unwrap();
        assert!(config.analysis.nutrients.is_empty());
    }

    #[tokio::test]
    async fn reads_camel_case_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = config_file_path(dir.path());
        tokio::fs::write(&path, "analysis:\n  maxTokenDistance: 5\ngateway:\n  port: 8080\n")
            .await
            .unwrap();
        let config = load_config(&path).await.unwrap();
        assert_eq!(config.analysis.max_token_distance, Some(5));
        assert_eq!(config.gateway.port(), 8080);
    }

    #[test]
    fn empty_document_is_empty_object() {
        assert!(parse_yaml("").unwrap().as_object().unwrap().is_empty());
        assert!(parse_yaml("# only a comment\n").unwrap().is_object());
    }
}
