//! Report assembler: dedupe extractor output, compute warnings, freeze.

use labelscan_core::{AllergenMatch, AnalysisReport, NormalizedText, NutrientField, RawText};

use crate::allergens::resolve_allergens;
use crate::nutrients::{select_canonical, NutrientExtraction};

#[derive(Debug, Clone)]
pub struct ReportAssembler {
    fields: Vec<NutrientField>,
}

impl ReportAssembler {
    /// `fields` are the nutrient fields a complete label is expected to carry.
    pub fn new(fields: impl IntoIterator<Item = NutrientField>) -> Self {
        Self {
            fields: fields.into_iter().collect(),
        }
    }

    /// Never fails. Warnings come out in a stable order: discarded values,
    /// OCR-corrected values, missing fields, allergen conflicts, empty text.
    pub fn assemble(
        &self,
        raw: RawText,
        normalized: NormalizedText,
        nutrients: NutrientExtraction,
        allergens: Vec<AllergenMatch>,
    ) -> AnalysisReport {
        let mut warnings = nutrients.warnings;
        let selected = select_canonical(nutrients.records);
        let resolution = resolve_allergens(allergens);

        for (field, record) in &selected {
            if normalized.corrected_within(record.offset, record.span_end()) {
                warnings.push(format!(
                    "{field} value corrected for OCR character confusion: \"{}\"",
                    record.raw_span
                ));
            }
        }
        for field in &self.fields {
            if !selected.contains_key(field) {
                warnings.push(format!("{field} not found"));
            }
        }
        for category in &resolution.conflicts {
            warnings.push(format!(
                "conflicting mentions for {category} resolved to present"
            ));
        }
        if normalized.is_empty() {
            warnings.push("no text recognized".to_string());
        }

        AnalysisReport::new(raw, normalized, selected, resolution.allergens, warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use labelscan_core::{AllergenCategory, Correction, NutrientRecord, Unit};

    fn record(field: NutrientField, value: f64, offset: usize, distance: usize) -> NutrientRecord {
        NutrientRecord {
            field,
            value,
            unit: field.default_unit(),
            raw_span: "나트륨 110mg".into(),
            offset,
            token_distance: distance,
        }
    }

    fn allergen(category: AllergenCategory, present: bool, offset: usize) -> AllergenMatch {
        AllergenMatch {
            category,
            present,
            raw_span: "우유".into(),
            offset,
        }
    }

    fn normalized(text: &str) -> NormalizedText {
        NormalizedText::new(text.into(), vec![])
    }

    #[test]
    fn dedupes_and_orders_warnings() {
        let assembler = ReportAssembler::new([NutrientField::Sugar, NutrientField::Sodium]);
        let extraction = NutrientExtraction {
            records: vec![
                record(NutrientField::Sodium, 220.0, 30, 1),
                record(NutrientField::Sodium, 110.0, 60, 0),
            ],
            warnings: vec!["discarded implausible SODIUM value \"-1mg\"".into()],
        };
        let allergens = vec![
            allergen(AllergenCategory::Milk, false, 0),
            allergen(AllergenCategory::Milk, true, 20),
        ];

        let report = assembler.assemble(
            RawText::new("x"),
            normalized("x"),
            extraction,
            allergens,
        );

        assert_eq!(report.nutrients().len(), 1);
        assert_eq!(report.nutrient(NutrientField::Sodium).unwrap().value, 110.0);
        assert!(report.allergen(AllergenCategory::Milk).unwrap().present);
        assert_eq!(
            report.warnings(),
            [
                "discarded implausible SODIUM value \"-1mg\"".to_string(),
                "SUGAR not found".to_string(),
                "conflicting mentions for MILK resolved to present".to_string(),
            ]
        );
    }

    #[test]
    fn empty_text_is_a_valid_report() {
        let assembler = ReportAssembler::new([NutrientField::Sugar]);
        let report = assembler.assemble(
            RawText::new("  "),
            NormalizedText::default(),
            NutrientExtraction::default(),
            vec![],
        );
        assert!(report.is_empty());
        assert_eq!(
            report.warnings(),
            ["SUGAR not found".to_string(), "no text recognized".to_string()]
        );
    }

    #[test]
    fn flags_corrected_values() {
        let text = NormalizedText::new(
            "나트륨 110mg".into(),
            vec![Correction {
                offset: "나트륨 1".len(),
                original: 'l',
                replacement: '1',
            }],
        );
        let extraction = NutrientExtraction {
            records: vec![record(NutrientField::Sodium, 110.0, 0, 0)],
            warnings: vec![],
        };
        let report = ReportAssembler::new([NutrientField::Sodium]).assemble(
            RawText::new("나트륨 1l0mg"),
            text,
            extraction,
            vec![],
        );
        assert_eq!(
            report.warnings(),
            ["SODIUM value corrected for OCR character confusion: \"나트륨 110mg\"".to_string()]
        );
        assert_eq!(report.nutrient(NutrientField::Sodium).unwrap().unit, Unit::Mg);
    }
}
