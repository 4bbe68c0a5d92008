//! LabelScan configuration schema.
//!
//! Typed for serde YAML/JSON deserialization. Scalar knobs are optional in the
//! file; [`crate::defaults::apply_all_defaults`] fills them in, and the
//! accessor methods below fall back to the same defaults.

use std::path::PathBuf;
use std::time::Duration;

use labelscan_core::{AllergenCategory, NutrientField, Unit};
use serde::{Deserialize, Serialize};

use crate::defaults::*;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Root configuration, loaded once at process start and shared read-only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelScanConfig {
    /// Vocabulary tables and matching limits for the analysis pipeline
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// OCR engine settings
    #[serde(default)]
    pub ocr: OcrConfig,

    /// Translation service settings
    #[serde(default)]
    pub translation: TranslationConfig,

    /// HTTP gateway settings
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// Analysis vocabulary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisConfig {
    /// Max tokens allowed between a nutrient keyword and its number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_token_distance: Option<usize>,

    /// Max tokens allowed between an allergen keyword and a suffix negation marker
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negation_window: Option<usize>,

    /// Max tokens allowed between a prefix negation marker and the keyword
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix_negation_window: Option<usize>,

    #[serde(default)]
    pub nutrients: Vec<NutrientFieldConfig>,

    #[serde(default)]
    pub allergens: Vec<AllergenCategoryConfig>,

    /// Negation markers shared by every allergen category
    #[serde(default)]
    pub negation: NegationConfig,

    /// Spellings recognized for each mass unit
    #[serde(default)]
    pub units: Vec<UnitSpellingConfig>,
}

impl AnalysisConfig {
    pub fn max_token_distance(&self) -> usize {
        self.max_token_distance.unwrap_or(DEFAULT_MAX_TOKEN_DISTANCE)
    }

    pub fn negation_window(&self) -> usize {
        self.negation_window.unwrap_or(DEFAULT_NEGATION_WINDOW)
    }

    pub fn prefix_negation_window(&self) -> usize {
        self.prefix_negation_window
            .unwrap_or(DEFAULT_PREFIX_NEGATION_WINDOW)
    }
}

/// One row of the nutrient field table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutrientFieldConfig {
    pub field: NutrientField,

    /// Label keywords and abbreviations, matched case-insensitively
    pub keywords: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical_unit: Option<Unit>,

    /// Units a value may be printed in; empty means every mass unit
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub accepted_units: Vec<Unit>,

    /// Largest believable value, expressed in the canonical unit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_plausible: Option<f64>,
}

impl NutrientFieldConfig {
    pub fn canonical_unit(&self) -> Unit {
        self.canonical_unit.unwrap_or_else(|| self.field.default_unit())
    }

    pub fn accepted_units(&self) -> Vec<Unit> {
        if self.accepted_units.is_empty() {
            Unit::ALL.to_vec()
        } else {
            self.accepted_units.clone()
        }
    }

    pub fn max_plausible(&self) -> f64 {
        self.max_plausible
            .unwrap_or_else(|| default_max_plausible(self.field))
    }
}

/// One row of the allergen category table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllergenCategoryConfig {
    pub category: AllergenCategory,

    pub keywords: Vec<String>,

    /// Words that start like a keyword but mean something else (e.g. "밀폐")
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclusions: Vec<String>,

    /// Extra negation markers only applied to this category
    #[serde(default)]
    pub negation: NegationConfig,
}

/// Negation marker phrases, split by where they sit relative to the keyword,
/// plus the presence words that end a negation window.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NegationConfig {
    /// Markers written before the allergen ("free of milk")
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prefix: Vec<String>,

    /// Markers written after the allergen ("우유 함유하지 않음")
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suffix: Vec<String>,

    /// Words asserting presence ("함유", "contains"); no negation reaches
    /// across one
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub positive: Vec<String>,
}

impl NegationConfig {
    pub fn is_empty(&self) -> bool {
        self.prefix.is_empty() && self.suffix.is_empty() && self.positive.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitSpellingConfig {
    pub unit: Unit,
    pub spellings: Vec<String>,
}

// ---------------------------------------------------------------------------
// OCR
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrConfig {
    /// Tesseract language hints, joined with '+'
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub languages: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// Page segmentation modes to run; every pass is merged
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub page_seg_modes: Vec<u8>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tesseract_cmd: Option<String>,
}

impl OcrConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_OCR_TIMEOUT_SECS))
    }

    pub fn language_hint(&self) -> String {
        if self.languages.is_empty() {
            DEFAULT_OCR_LANGUAGES.join("+")
        } else {
            self.languages.join("+")
        }
    }

    pub fn tesseract_cmd(&self) -> &str {
        self.tesseract_cmd.as_deref().unwrap_or(DEFAULT_TESSERACT_CMD)
    }
}

// ---------------------------------------------------------------------------
// Translation
// ---------------------------------------------------------------------------

/// Which text is sent to the translation service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranslationSource {
    #[default]
    Normalized,
    Raw,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    /// "papago" is the only network provider; "none" disables translation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_lang: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<TranslationSource>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
}

impl TranslationConfig {
    /// Enabled and carrying credentials.
    pub fn is_active(&self) -> bool {
        self.enabled.unwrap_or(true)
            && self.provider.as_deref() != Some("none")
            && self.client_id.as_deref().is_some_and(|s| !s.is_empty())
            && self.client_secret.as_deref().is_some_and(|s| !s.is_empty())
    }

    pub fn target_lang(&self) -> &str {
        self.target_lang.as_deref().unwrap_or(DEFAULT_TARGET_LANG)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TRANSLATION_TIMEOUT_SECS))
    }

    pub fn source(&self) -> TranslationSource {
        self.source.unwrap_or_default()
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.as_deref().unwrap_or(DEFAULT_PAPAGO_ENDPOINT)
    }
}

// ---------------------------------------------------------------------------
// Gateway
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Where uploaded images are stored as `<uuid>.<ext>`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_dir: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_upload_bytes: Option<usize>,

    /// Reports kept in memory before the oldest are dropped
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_reports: Option<usize>,

    /// External base URL used to build `detailUrl` links
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_base_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<RateLimitConfig>,
}

impl GatewayConfig {
    pub fn host(&self) -> &str {
        self.host.as_deref().unwrap_or(DEFAULT_GATEWAY_HOST)
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_GATEWAY_PORT)
    }

    pub fn upload_dir(&self) -> PathBuf {
        self.upload_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_UPLOAD_DIR))
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes.unwrap_or(DEFAULT_MAX_UPLOAD_BYTES)
    }

    pub fn max_reports(&self) -> usize {
        self.max_reports.unwrap_or(DEFAULT_MAX_REPORTS)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: DEFAULT_RATE_LIMIT_REQUESTS,
            window_secs: DEFAULT_RATE_LIMIT_WINDOW_SECS,
        }
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,

    /// Directory for the rolling NDJSON log file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

impl LoggingConfig {
    pub fn level(&self) -> &str {
        self.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn dir(&self) -> PathBuf {
        self.dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR))
    }
}
