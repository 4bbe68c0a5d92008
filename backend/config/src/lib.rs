//! `labelscan-config`: runtime configuration for the label analyzer.
//!
//! Provides:
//! - Typed config schema (vocabulary tables, OCR, translation, gateway, logging)
//! - YAML loading with a defaults-on-missing-file fallback
//! - `${ENV_VAR}` substitution
//! - Config redaction for safe logging/display
//! - Default value application
//! - Validation

pub mod defaults;
pub mod env;
pub mod io;
pub mod redact;
pub mod schema;
pub mod validation;

pub use defaults::{apply_all_defaults, default_config};
pub use env::{collect_referenced_vars, resolve_env_vars, resolve_env_vars_with, MissingEnvVarError};
pub use io::{config_dir, config_file_path, load_config, load_config_value, parse_yaml};
pub use redact::{collect_redacted_paths, redact};
pub use schema::{
    AllergenCategoryConfig, AnalysisConfig, GatewayConfig, LabelScanConfig, LoggingConfig,
    NegationConfig, NutrientFieldConfig, OcrConfig, RateLimitConfig, TranslationConfig,
    TranslationSource, UnitSpellingConfig,
};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

/// Load, apply env substitution, apply defaults, and validate a config file.
///
/// This is the main entry point for loading a config at runtime. A missing
/// file yields the built-in defaults.
pub async fn load_and_prepare(path: &Path) -> Result<LabelScanConfig> {
    let value = load_config_value(path)
        .await?
        .unwrap_or_else(|| Value::Object(Default::default()));
    let env: HashMap<String, String> = std::env::vars().collect();
    prepare(value, &env)
}

/// Same pipeline as [`load_and_prepare`], from YAML text and an explicit env.
pub fn load_from_str(yaml: &str, env: &HashMap<String, String>) -> Result<LabelScanConfig> {
    prepare(parse_yaml(yaml)?, env)
}

fn prepare(value: Value, env: &HashMap<String, String>) -> Result<LabelScanConfig> {
    let value = resolve_env_vars_with(&value, env).context("Failed to resolve env vars in config")?;

    let config: LabelScanConfig =
        serde_json::from_value(value).context("Failed to deserialize config")?;
    let config = apply_all_defaults(config);

    let report = validate(&config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    for error in &report.errors {
        tracing::error!(path = %error.path, message = %error.message, "Config error");
    }
    if let Some(first) = report.errors.into_iter().next() {
        bail!(first);
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_gives_full_defaults() {
        let config = load_from_str("", &HashMap::new()).unwrap();
        assert_eq!(config.analysis.nutrients.len(), 8);
        assert_eq!(config.analysis.allergens.len(), 11);
        assert_eq!(config.ocr.language_hint(), "kor+eng");
        assert!(!config.translation.is_active());
    }

    #[test]
    fn env_credentials_activate_translation() {
        let yaml = "translation:\n  clientId: ${PAPAGO_ID}\n  clientSecret: ${PAPAGO_SECRET}\n";
        let env: HashMap<String, String> = [("PAPAGO_ID", "id"), ("PAPAGO_SECRET", "secret")]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let config = load_from_str(yaml, &env).unwrap();
        assert!(config.translation.is_active());
    }

    #[test]
    fn custom_vocabulary_replaces_builtin() {
        let yaml = r#"
analysis:
  nutrients:
    - field: SODIUM
      keywords: ["natrium"]
"#;
        let config = load_from_str(yaml, &HashMap::new()).unwrap();
        assert_eq!(config.analysis.nutrients.len(), 1);
        assert_eq!(config.analysis.nutrients[0].keywords, vec!["natrium"]);
        assert_eq!(config.analysis.allergens.len(), 11);
    }

    #[test]
    fn validation_error_fails_load() {
        let yaml = "ocr:\n  timeoutSecs: 0\n";
        assert!(load_from_str(yaml, &HashMap::new()).is_err());
    }

    #[tokio::test]
    async fn missing_file_prepares_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_and_prepare(&dir.path().join("labelscan.yaml")).await.unwrap();
        assert_eq!(config.gateway.port(), 5000);
    }
}
