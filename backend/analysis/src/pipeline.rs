//! `LabelAnalyzer`: the whole pipeline behind one facade.
//!
//! Built once from configuration and shared read-only (`Arc<LabelAnalyzer>`)
//! by every concurrent request.

use std::sync::Arc;
use std::time::{Duration, Instant};

use labelscan_config::{AnalysisConfig, LabelScanConfig};
use labelscan_core::{AnalysisReport, LabelError, OcrEngine, OcrError, RawText, Translator};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::allergens::AllergenDetector;
use crate::assemble::ReportAssembler;
use crate::normalize::Normalizer;
use crate::nutrients::NutrientExtractor;
use crate::translation::{TranslationOrchestrator, TranslationPolicy};

#[derive(Debug, Clone)]
pub struct LabelAnalyzer {
    normalizer: Normalizer,
    nutrients: NutrientExtractor,
    allergens: AllergenDetector,
    assembler: ReportAssembler,
    translation: TranslationOrchestrator,
    ocr_timeout: Duration,
}

impl LabelAnalyzer {
    /// Compile the vocabulary tables. Translation starts disabled; see
    /// [`LabelAnalyzer::with_translator`].
    pub fn new(config: &LabelScanConfig) -> Result<Self, LabelError> {
        let mut analyzer = Self::from_analysis(&config.analysis)?;
        analyzer.ocr_timeout = config.ocr.timeout();
        analyzer.translation = TranslationOrchestrator::disabled_with_policy(
            TranslationPolicy::from_config(&config.translation),
        );
        Ok(analyzer)
    }

    pub fn from_analysis(analysis: &AnalysisConfig) -> Result<Self, LabelError> {
        let normalizer = Normalizer::new(&analysis.units)
            .map_err(|e| LabelError::Config(format!("unit spellings: {e}")))?;
        let nutrients = NutrientExtractor::new(analysis);
        let assembler = ReportAssembler::new(nutrients.fields().iter().copied());

        Ok(Self {
            normalizer,
            nutrients,
            allergens: AllergenDetector::new(analysis),
            assembler,
            translation: TranslationOrchestrator::disabled(),
            ocr_timeout: labelscan_config::OcrConfig::default().timeout(),
        })
    }

    /// Attach a translation capability, keeping the configured policy.
    pub fn with_translator(mut self, translator: Arc<dyn Translator>) -> Self {
        let policy = self.translation.policy().clone();
        self.translation = TranslationOrchestrator::new(translator, policy);
        self
    }

    pub fn with_ocr_timeout(mut self, limit: Duration) -> Self {
        self.ocr_timeout = limit;
        self
    }

    pub fn translation_enabled(&self) -> bool {
        self.translation.is_enabled()
    }

    /// Normalize, extract, and assemble. Pure; never fails.
    pub fn analyze_text(&self, raw: RawText) -> AnalysisReport {
        let started = Instant::now();
        let normalized = self.normalizer.normalize(&raw);
        let nutrients = self.nutrients.extract(&normalized);
        let allergens = self.allergens.detect(&normalized);
        let report = self.assembler.assemble(raw, normalized, nutrients, allergens);
        debug!(
            nutrients = report.nutrients().len(),
            allergens = report.allergens().len(),
            warnings = report.warnings().len(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "Analyzed label text"
        );
        report
    }

    /// [`analyze_text`](Self::analyze_text) followed by best-effort translation.
    pub async fn analyze(&self, raw: RawText) -> AnalysisReport {
        let report = self.analyze_text(raw);
        self.translation.attach(report).await
    }

    /// Run OCR under the configured timeout.
    pub async fn recognize(&self, ocr: &dyn OcrEngine, image: &[u8]) -> Result<RawText, OcrError> {
        if image.is_empty() {
            return Err(OcrError::EmptyImage);
        }
        let started = Instant::now();
        match timeout(self.ocr_timeout, ocr.recognize(image)).await {
            Ok(Ok(raw)) => {
                info!(
                    engine = ocr.name(),
                    bytes = image.len(),
                    chars = raw.as_str().chars().count(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "OCR complete"
                );
                Ok(raw)
            }
            Ok(Err(e)) => {
                warn!(engine = ocr.name(), error = %e, "OCR failed");
                Err(e)
            }
            Err(_) => {
                warn!(engine = ocr.name(), limit = ?self.ocr_timeout, "OCR timed out");
                Err(OcrError::Timeout(self.ocr_timeout))
            }
        }
    }

    /// OCR, then the full text pipeline. Only OCR failures are errors.
    pub async fn analyze_image(
        &self,
        ocr: &dyn OcrEngine,
        image: &[u8],
    ) -> Result<AnalysisReport, LabelError> {
        let raw = self.recognize(ocr, image).await?;
        Ok(self.analyze(raw).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use labelscan_config::default_config;
    use labelscan_core::{AllergenCategory, NutrientField, Unit};
    use labelscan_providers::mock::{MockOcr, MockTranslator};

    fn analyzer() -> LabelAnalyzer {
        LabelAnalyzer::new(&default_config()).unwrap()
    }

    #[test]
    fn korean_label_end_to_end() {
        let report = analyzer().analyze_text(RawText::new("설탕 함유량: 5g, 우유 함유하지 않음"));
        let sugar = report.nutrient(NutrientField::Sugar).unwrap();
        assert_eq!((sugar.value, sugar.unit), (5.0, Unit::G));
        assert!(!report.allergen(AllergenCategory::Milk).unwrap().present);
        assert!(report.translation().is_none());
    }

    #[test]
    fn missing_field_tolerance() {
        let report = analyzer().analyze_text(RawText::new("나트륨 500mg"));
        assert_eq!(report.nutrient(NutrientField::Sodium).unwrap().value, 500.0);
        assert!(report.nutrient(NutrientField::Sugar).is_none());
        assert!(report.warnings().iter().any(|w| w == "SUGAR not found"));
        assert!(!report.warnings().iter().any(|w| w == "SODIUM not found"));
    }

    #[test]
    fn malformed_number_rejection() {
        let report = analyzer().analyze_text(RawText::new("나트륨: -999999mg"));
        assert!(report.nutrient(NutrientField::Sodium).is_none());
        assert_eq!(
            report.warnings()[0],
            "discarded implausible SODIUM value \"-999999mg\""
        );
    }

    #[test]
    fn every_raw_span_is_literal_substring() {
        let report = analyzer().analyze_text(RawText::new(
            "영양정보 총 내용량 100g\n나트륨 1l0 ㎎ 5%\n탄수화물 20g 당류 1Og\n지방 3.5g 단백질 2g\n\
             알레르기: 우유, 대두, 밀 함유. 땅콩 미함유",
        ));
        let text = report.normalized_text().as_str();
        for record in report.nutrients().values() {
            assert!(text.contains(&record.raw_span), "{}", record.raw_span);
        }
        for allergen in report.allergens().values() {
            assert!(text.contains(&allergen.raw_span), "{}", allergen.raw_span);
        }
        assert_eq!(report.nutrient(NutrientField::Sodium).unwrap().value, 110.0);
        assert_eq!(report.nutrient(NutrientField::Sugar).unwrap().value, 10.0);
        assert!(report
            .warnings()
            .iter()
            .any(|w| w.starts_with("SODIUM value corrected")));
        assert!(!report.allergen(AllergenCategory::Peanut).unwrap().present);
        assert!(report.allergen(AllergenCategory::Wheat).unwrap().present);
    }

    #[tokio::test]
    async fn image_pipeline_with_translation() {
        let analyzer = analyzer().with_translator(Arc::new(
            MockTranslator::new().with_reply("Sodium 500mg"),
        ));
        let ocr = MockOcr::new().with_text("나트륨 500mg");
        let report = analyzer.analyze_image(&ocr, b"\xFF\xD8\xFF").await.unwrap();
        assert_eq!(report.translation(), Some("Sodium 500mg"));
        assert_eq!(report.nutrient(NutrientField::Sodium).unwrap().value, 500.0);
    }

    #[tokio::test]
    async fn translation_failure_keeps_fields() {
        let ocr = MockOcr::new().with_text("나트륨 500mg");
        let plain = analyzer().analyze_image(&ocr, b"img").await.unwrap();
        let degraded = analyzer()
            .with_translator(Arc::new(MockTranslator::new().failing("down")))
            .analyze_image(&ocr, b"img")
            .await
            .unwrap();
        assert!(degraded.translation().is_none());
        assert_eq!(degraded.nutrients(), plain.nutrients());
        assert_eq!(degraded.allergens(), plain.allergens());
        assert_eq!(degraded.warnings().len(), plain.warnings().len() + 1);
    }

    #[tokio::test]
    async fn ocr_timeout_is_request_failure() {
        let ocr = MockOcr::new()
            .with_text("나트륨 500mg")
            .with_delay(Duration::from_secs(5));
        let analyzer = analyzer().with_ocr_timeout(Duration::from_millis(50));
        let err = analyzer.analyze_image(&ocr, b"img").await.unwrap_err();
        assert!(matches!(err, LabelError::Ocr(OcrError::Timeout(_))));
    }

    #[tokio::test]
    async fn ocr_failure_and_empty_image() {
        let ocr = MockOcr::new().failing("tesseract missing");
        let err = analyzer().analyze_image(&ocr, b"img").await.unwrap_err();
        assert!(matches!(err, LabelError::Ocr(OcrError::Engine(_))));

        let err = analyzer()
            .analyze_image(&MockOcr::new(), b"")
            .await
            .unwrap_err();
        assert!(matches!(err, LabelError::Ocr(OcrError::EmptyImage)));
    }

    #[tokio::test]
    async fn concurrent_requests_share_one_analyzer() {
        let analyzer = Arc::new(analyzer());
        let handles: Vec<_> = ["나트륨 100mg", "나트륨 200mg", "나트륨 300mg"]
            .into_iter()
            .map(|text| {
                let analyzer = Arc::clone(&analyzer);
                tokio::spawn(async move { analyzer.analyze(RawText::new(text)).await })
            })
            .collect();
        let mut values = Vec::new();
        for handle in handles {
            let report = handle.await.unwrap();
            values.push(report.nutrient(NutrientField::Sodium).unwrap().value);
        }
        assert_eq!(values, vec![100.0, 200.0, 300.0]);
    }
}
