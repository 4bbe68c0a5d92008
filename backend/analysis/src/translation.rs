//! Translation orchestrator: best-effort translation attached to a report.
//!
//! Translation never fails the analysis. Any error, timeout, or empty reply
//! becomes a warning and the report is otherwise returned untouched.

use std::sync::Arc;
use std::time::Duration;

use labelscan_config::{TranslationConfig, TranslationSource};
use labelscan_core::{AnalysisReport, TranslateError, Translator};
use tokio::time::timeout;
use tracing::{debug, warn};

/// How and where to translate.
#[derive(Debug, Clone)]
pub struct TranslationPolicy {
    pub target_lang: String,
    pub timeout: Duration,
    pub source: TranslationSource,
}

impl TranslationPolicy {
    pub fn from_config(config: &TranslationConfig) -> Self {
        Self {
            target_lang: config.target_lang().to_string(),
            timeout: config.timeout(),
            source: config.source(),
        }
    }
}

impl Default for TranslationPolicy {
    fn default() -> Self {
        Self::from_config(&TranslationConfig::default())
    }
}

fn contains_hangul(text: &str) -> bool {
    text.chars()
        .any(|c| matches!(c, '\u{AC00}'..='\u{D7A3}' | '\u{1100}'..='\u{11FF}' | '\u{3130}'..='\u{318F}'))
}

/// Pick `(source, target)` for `text`. Hangul means Korean source; anything
/// else is treated as English. A target equal to the source flips to the
/// other of ko/en.
pub fn guess_lang_pair(text: &str, target: &str) -> (String, String) {
    let source = if contains_hangul(text) { "ko" } else { "en" };
    let target = if target.eq_ignore_ascii_case(source) {
        if source == "ko" { "en" } else { "ko" }
    } else {
        target
    };
    (source.to_string(), target.to_string())
}

/// Translate the report's text and return the report with either the
/// translation or a warning attached.
pub async fn attach_translation(
    report: AnalysisReport,
    translator: &dyn Translator,
    policy: &TranslationPolicy,
) -> AnalysisReport {
    let text = match policy.source {
        TranslationSource::Normalized => report.normalized_text().as_str(),
        TranslationSource::Raw => report.source_raw_text().as_str(),
    }
    .trim()
    .to_string();
    if text.is_empty() {
        return report;
    }

    let (source, target) = guess_lang_pair(&text, &policy.target_lang);
    debug!(provider = translator.name(), %source, %target, chars = text.chars().count(), "Requesting translation");

    match timeout(policy.timeout, translator.translate(&text, &source, &target)).await {
        Ok(Ok(translated)) if !translated.trim().is_empty() => report.with_translation(translated),
        Ok(Ok(_)) => {
            warn!(provider = translator.name(), "Translation returned empty text");
            report.with_warning("translation returned empty text")
        }
        Ok(Err(TranslateError::Timeout(limit))) => {
            warn!(provider = translator.name(), ?limit, "Translation timed out");
            report.with_warning(format!("translation timed out after {limit:?}"))
        }
        Ok(Err(e)) => {
            warn!(provider = translator.name(), error = %e, "Translation failed");
            report.with_warning(e.to_string())
        }
        Err(_) => {
            warn!(provider = translator.name(), limit = ?policy.timeout, "Translation timed out");
            report.with_warning(format!("translation timed out after {:?}", policy.timeout))
        }
    }
}

/// Holds the optional translator and the policy used with it.
#[derive(Clone, Default)]
pub struct TranslationOrchestrator {
    translator: Option<Arc<dyn Translator>>,
    policy: TranslationPolicy,
}

impl TranslationOrchestrator {
    pub fn new(translator: Arc<dyn Translator>, policy: TranslationPolicy) -> Self {
        Self {
            translator: Some(translator),
            policy,
        }
    }

    /// No translator: reports pass through unchanged.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Disabled for now, but remembers the policy for a translator added later.
    pub fn disabled_with_policy(policy: TranslationPolicy) -> Self {
        Self {
            translator: None,
            policy,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.translator.is_some()
    }

    pub fn policy(&self) -> &TranslationPolicy {
        &self.policy
    }

    pub async fn attach(&self, report: AnalysisReport) -> AnalysisReport {
        match &self.translator {
            Some(translator) => attach_translation(report, translator.as_ref(), &self.policy).await,
            None => report,
        }
    }
}

impl std::fmt::Debug for TranslationOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslationOrchestrator")
            .field("translator", &self.translator.as_ref().map(|t| t.name().to_string()))
            .field("policy", &self.policy)
            .finish()
    }
}
