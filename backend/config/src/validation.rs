//! Config validation: vocabulary sanity and limit checks.

use std::collections::HashSet;

use labelscan_core::{AllergenCategory, NutrientField};
use thiserror::Error;

use crate::schema::LabelScanConfig;

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// All errors and warnings found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

pub fn validate(config: &LabelScanConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_nutrients(config, &mut report);
    validate_allergens(config, &mut report);
    validate_units(config, &mut report);
    validate_ocr(config, &mut report);
    validate_translation(config, &mut report);
    validate_gateway(config, &mut report);
    report
}

fn blank(words: &[String]) -> bool {
    words.iter().any(|w| w.trim().is_empty())
}

fn validate_nutrients(config: &LabelScanConfig, report: &mut ValidationReport) {
    let mut seen: HashSet<NutrientField> = HashSet::new();
    for (i, row) in config.analysis.nutrients.iter().enumerate() {
        let path = format!("analysis.nutrients[{i}]");
        if !seen.insert(row.field) {
            report.error(&path, format!("{} is listed more than once", row.field));
        }
        if row.keywords.is_empty() {
            report.error(format!("{path}.keywords"), "At least one keyword is required");
        }
        if blank(&row.keywords) {
            report.error(format!("{path}.keywords"), "Keywords cannot be blank");
        }
        if row.max_plausible().is_nan() || row.max_plausible() <= 0.0 {
            report.error(format!("{path}.maxPlausible"), "maxPlausible must be > 0");
        }
        if !row.accepted_units.is_empty() && !row.accepted_units.contains(&row.canonical_unit()) {
            report.warn(
                format!("{path}.acceptedUnits"),
                "Canonical unit is not among the accepted units",
            );
        }
    }
}

fn validate_allergens(config: &LabelScanConfig, report: &mut ValidationReport) {
    let mut seen: HashSet<AllergenCategory> = HashSet::new();
    for (i, row) in config.analysis.allergens.iter().enumerate() {
        let path = format!("analysis.allergens[{i}]");
        if !seen.insert(row.category) {
            report.error(&path, format!("{} is listed more than once", row.category));
        }
        if row.keywords.is_empty() {
            report.error(format!("{path}.keywords"), "At least one keyword is required");
        }
        if blank(&row.keywords) || blank(&row.exclusions) {
            report.error(&path, "Keywords and exclusions cannot be blank");
        }
    }
    let negation = &config.analysis.negation;
    if blank(&negation.prefix) || blank(&negation.suffix) || blank(&negation.positive) {
        report.error("analysis.negation", "Negation markers cannot be blank");
    }
    if config.analysis.negation_window() == 0 {
        report.warn(
            "analysis.negationWindow",
            "negationWindow of 0 only honors markers directly after the keyword",
        );
    }
    if !negation.prefix.is_empty() && negation.positive.is_empty() {
        report.warn(
            "analysis.negation.positive",
            "No presence words configured; negation may reach past \"contains\"",
        );
    }
}

fn validate_units(config: &LabelScanConfig, report: &mut ValidationReport) {
    for (i, row) in config.analysis.units.iter().enumerate() {
        if row.spellings.is_empty() || blank(&row.spellings) {
            report.error(
                format!("analysis.units[{i}].spellings"),
                "Unit spellings cannot be empty or blank",
            );
        }
    }
}

fn validate_ocr(config: &LabelScanConfig, report: &mut ValidationReport) {
    if config.ocr.timeout_secs == Some(0) {
        report.error("ocr.timeoutSecs", "timeoutSecs must be >= 1");
    }
    for psm in &config.ocr.page_seg_modes {
        if *psm > 13 {
            report.error(
                "ocr.pageSegModes",
                format!("Unknown page segmentation mode {psm}; valid modes are 0-13"),
            );
        }
    }
}

fn validate_translation(config: &LabelScanConfig, report: &mut ValidationReport) {
    let tr = &config.translation;
    if tr.timeout_secs == Some(0) {
        report.error("translation.timeoutSecs", "timeoutSecs must be >= 1");
    }
    if let Some(provider) = &tr.provider {
        if !matches!(provider.as_str(), "papago" | "none") {
            report.error(
                "translation.provider",
                format!("Unknown translation provider '{provider}'. Use 'papago' or 'none'"),
            );
        }
    }
    if tr.enabled != Some(false) && tr.provider.as_deref() != Some("none") && !tr.is_active() {
        report.warn(
            "translation",
            "No translation credentials configured; reports will carry no translation",
        );
    }
    if !matches!(tr.target_lang(), "ko" | "en") {
        report.warn(
            "translation.targetLang",
            format!("Target language '{}' is not ko or en", tr.target_lang()),
        );
    }
}

fn validate_gateway(config: &LabelScanConfig, report: &mut ValidationReport) {
    let gw = &config.gateway;
    let port = gw.port();
    if port < 1024 && port != 80 && port != 443 {
        report.warn(
            "gateway.port",
            format!("Port {port} requires elevated privileges; consider using a port >= 1024"),
        );
    }
    if gw.max_upload_bytes() == 0 {
        report.error("gateway.maxUploadBytes", "maxUploadBytes must be > 0");
    }
    if gw.max_reports() == 0 {
        report.error("gateway.maxReports", "maxReports must be >= 1");
    }
    if let Some(rl) = &gw.rate_limit {
        if rl.max_requests == 0 || rl.window_secs == 0 {
            report.error(
                "gateway.rateLimit",
                "maxRequests and windowSecs must both be >= 1",
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::default_config;

    #[test]
    fn defaults_are_valid() {
        let report = validate(&default_config());
        assert!(report.is_valid(), "{:?}", report.errors);
    }

    #[test]
    fn duplicate_field_is_error() {
        let mut config = default_config();
        let sugar = config.analysis.nutrients[0].clone();
        config.analysis.nutrients.push(sugar);
        let report = validate(&config);
        assert!(report
            .errors
            .iter()
            .any(|e| e.message.contains("SUGAR is listed more than once")));
    }

    #[test]
    fn zero_limits_are_errors() {
        let mut config = default_config();
        config.ocr.timeout_secs = Some(0);
        config.gateway.max_reports = Some(0);
        let report = validate(&config);
        assert_eq!(report.errors.len(), 2);
    }

    #[test]
    fn missing_credentials_is_warning() {
        let report = validate(&default_config());
        assert!(report.warnings.iter().any(|w| w.path == "translation"));
    }

    #[test]
    fn negation_without_presence_words_is_warning() {
        let mut config = default_config();
        assert!(!report_has(&validate(&config), "analysis.negation.positive"));
        config.analysis.negation.positive.clear();
        assert!(report_has(&validate(&config), "analysis.negation.positive"));
        config.analysis.negation.positive.push("  ".into());
        assert!(!validate(&config).is_valid());
    }

    fn report_has(report: &ValidationReport, path: &str) -> bool {
        report.warnings.iter().any(|w| w.path == path)
    }
}
