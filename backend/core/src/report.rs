use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::text::{NormalizedText, RawText};
use crate::types::{AllergenCategory, NutrientField, Unit};

/// A quantified nutrient fact found in normalized label text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutrientRecord {
    pub field: NutrientField,
    /// Value already converted into `unit`, the field's canonical unit.
    pub value: f64,
    pub unit: Unit,
    /// Keyword-through-unit slice of the normalized text.
    pub raw_span: String,
    /// Byte offset of `raw_span` inside the normalized text.
    pub offset: usize,
    /// Tokens between the keyword and the number. Smaller is a tighter match.
    pub token_distance: usize,
}

impl NutrientRecord {
    pub fn span_end(&self) -> usize {
        self.offset + self.raw_span.len()
    }
}

/// One allergen mention. `present == false` marks an explicit negated
/// statement, never the absence of a mention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllergenMatch {
    pub category: AllergenCategory,
    pub present: bool,
    pub raw_span: String,
    pub offset: usize,
}

/// The structured result for one label image.
///
/// Built once by the report assembler. The only way to change a report is to
/// consume it through [`AnalysisReport::with_translation`] or
/// [`AnalysisReport::with_warning`], which return a new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    source_raw_text: RawText,
    normalized_text: NormalizedText,
    nutrients: BTreeMap<NutrientField, NutrientRecord>,
    allergens: BTreeMap<AllergenCategory, AllergenMatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    translation: Option<String>,
    #[serde(default)]
    warnings: Vec<String>,
}

impl AnalysisReport {
    pub fn new(
        source_raw_text: RawText,
        normalized_text: NormalizedText,
        nutrients: BTreeMap<NutrientField, NutrientRecord>,
        allergens: BTreeMap<AllergenCategory, AllergenMatch>,
        warnings: Vec<String>,
    ) -> Self {
        Self {
            source_raw_text,
            normalized_text,
            nutrients,
            allergens,
            translation: None,
            warnings,
        }
    }

    pub fn source_raw_text(&self) -> &RawText {
        &self.source_raw_text
    }

    pub fn normalized_text(&self) -> &NormalizedText {
        &self.normalized_text
    }

    pub fn nutrients(&self) -> &BTreeMap<NutrientField, NutrientRecord> {
        &self.nutrients
    }

    pub fn nutrient(&self, field: NutrientField) -> Option<&NutrientRecord> {
        self.nutrients.get(&field)
    }

    pub fn allergens(&self) -> &BTreeMap<AllergenCategory, AllergenMatch> {
        &self.allergens
    }

    pub fn allergen(&self, category: AllergenCategory) -> Option<&AllergenMatch> {
        self.allergens.get(&category)
    }

    pub fn translation(&self) -> Option<&str> {
        self.translation.as_deref()
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// True when neither nutrients nor allergens could be extracted.
    pub fn is_empty(&self) -> bool {
        self.nutrients.is_empty() && self.allergens.is_empty()
    }

    pub fn with_translation(mut self, translation: impl Into<String>) -> Self {
        self.translation = Some(translation.into());
        self
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sodium_record() -> NutrientRecord {
        NutrientRecord {
            field: NutrientField::Sodium,
            value: 500.0,
            unit: Unit::Mg,
            raw_span: "나트륨 500mg".into(),
            offset: 0,
            token_distance: 0,
        }
    }

    #[test]
    fn serializes_camel_case_maps() {
        let mut nutrients = BTreeMap::new();
        nutrients.insert(NutrientField::Sodium, sodium_record());
        let report = AnalysisReport::new(
            RawText::new("나트륨 500mg"),
            NormalizedText::new("나트륨 500mg".into(), vec![]),
            nutrients,
            BTreeMap::new(),
            vec!["SUGAR not found".into()],
        );

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["nutrients"]["SODIUM"]["value"], 500.0);
        assert_eq!(json["nutrients"]["SODIUM"]["unit"], "MG");
        assert_eq!(json["nutrients"]["SODIUM"]["rawSpan"], "나트륨 500mg");
        assert!(json.get("translation").is_none());
        assert_eq!(json["warnings"][0], "SUGAR not found");
    }

    #[test]
    fn translation_and_warnings_return_new_report() {
        let report = AnalysisReport::new(
            RawText::default(),
            NormalizedText::default(),
            BTreeMap::new(),
            BTreeMap::new(),
            vec![],
        );
        assert!(report.is_empty());

        let translated = report.clone().with_translation("Sodium 500mg");
        assert_eq!(translated.translation(), Some("Sodium 500mg"));
        assert!(report.translation().is_none());

        let warned = translated.with_warning("note");
        assert_eq!(warned.warnings(), ["note".to_string()]);
    }

    #[test]
    fn span_end_covers_raw_span() {
        let record = sodium_record();
        assert_eq!(record.span_end(), "나트륨 500mg".len());
    }
}
