//! Nutrient extractor: keyword → bounded scan → number + unit → record.

use std::collections::{BTreeMap, HashMap, HashSet};

use labelscan_config::{AnalysisConfig, UnitSpellingConfig};
use labelscan_core::{NormalizedText, NutrientField, NutrientRecord, Unit};
use tracing::debug;

use crate::matcher::{tokenize, PhraseSet, TokenKind};

/// Everything the extractor found, before deduplication.
#[derive(Debug, Clone, Default)]
pub struct NutrientExtraction {
    /// Every accepted record, in reading order.
    pub records: Vec<NutrientRecord>,
    /// One entry per discarded value.
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone)]
struct FieldSpec {
    canonical: Unit,
    accepted: Vec<Unit>,
    max_plausible: f64,
}

#[derive(Debug, Clone)]
pub struct NutrientExtractor {
    keywords: PhraseSet<NutrientField>,
    specs: HashMap<NutrientField, FieldSpec>,
    fields: Vec<NutrientField>,
    units: HashMap<String, Unit>,
    max_token_distance: usize,
}

enum Rejection {
    Malformed,
    Implausible,
}

impl NutrientExtractor {
    pub fn new(config: &AnalysisConfig) -> Self {
        let mut keywords = PhraseSet::new();
        let mut specs = HashMap::new();
        let mut fields = Vec::new();
        for row in &config.nutrients {
            for keyword in &row.keywords {
                keywords.insert(keyword, row.field);
            }
            if !fields.contains(&row.field) {
                fields.push(row.field);
            }
            specs.insert(
                row.field,
                FieldSpec {
                    canonical: row.canonical_unit(),
                    accepted: row.accepted_units(),
                    max_plausible: row.max_plausible(),
                },
            );
        }

        Self {
            keywords,
            specs,
            fields,
            units: unit_table(&config.units),
            max_token_distance: config.max_token_distance(),
        }
    }

    /// Configured fields, in table order.
    pub fn fields(&self) -> &[NutrientField] {
        &self.fields
    }

    pub fn extract(&self, text: &NormalizedText) -> NutrientExtraction {
        let source = text.as_str();
        let tokens = tokenize(source);
        let hits = self.keywords.find_all(&tokens);
        let keyword_starts: HashSet<usize> = hits.iter().map(|h| h.start).collect();

        let mut extraction = NutrientExtraction::default();
        for hit in &hits {
            let Some(spec) = self.specs.get(&hit.owner) else {
                continue;
            };
            let last = (hit.end + self.max_token_distance).min(tokens.len().saturating_sub(1));

            for at in hit.end..=last {
                if keyword_starts.contains(&at) {
                    break;
                }
                let number = &tokens[at];
                if number.kind != TokenKind::Number {
                    continue;
                }
                let Some(unit_token) = tokens.get(at + 1) else {
                    break;
                };
                if unit_token.kind != TokenKind::Word
                    || !source[number.end..unit_token.start].trim().is_empty()
                {
                    continue;
                }
                let Some(&unit) = self.units.get(&unit_token.folded) else {
                    continue;
                };
                if !spec.accepted.contains(&unit) {
                    continue;
                }

                let value_text = &source[number.start..unit_token.end];
                match read_value(spec, number.text, unit) {
                    Ok(value) => extraction.records.push(NutrientRecord {
                        field: hit.owner,
                        value,
                        unit: spec.canonical,
                        raw_span: source[hit.from..unit_token.end].to_string(),
                        offset: hit.from,
                        token_distance: at - hit.end,
                    }),
                    Err(rejection) => {
                        let kind = match rejection {
                            Rejection::Malformed => "malformed",
                            Rejection::Implausible => "implausible",
                        };
                        debug!(field = %hit.owner, value = value_text, kind, "Discarded nutrient value");
                        extraction
                            .warnings
                            .push(format!("discarded {kind} {} value \"{value_text}\"", hit.owner));
                    }
                }
                break;
            }
        }

        extraction
    }
}

fn unit_table(rows: &[UnitSpellingConfig]) -> HashMap<String, Unit> {
    let mut table: HashMap<String, Unit> =
        Unit::ALL.iter().map(|u| (u.symbol().to_string(), *u)).collect();
    for row in rows {
        for spelling in &row.spellings {
            let folded = spelling.trim().to_lowercase();
            if !folded.is_empty() {
                table.insert(folded, row.unit);
            }
        }
    }
    table
}

fn read_value(spec: &FieldSpec, text: &str, unit: Unit) -> Result<f64, Rejection> {
    let value = parse_number(text).ok_or(Rejection::Malformed)?;
    if !value.is_finite() || value < 0.0 {
        return Err(Rejection::Implausible);
    }
    let converted = unit.convert(value, spec.canonical);
    if converted > spec.max_plausible {
        return Err(Rejection::Implausible);
    }
    Ok(converted)
}

/// Parse an OCR'd number. `1,200` is twelve hundred, `0,5` and `12,5` use a
/// decimal comma, and with both marks present the last one is the decimal.
pub fn parse_number(text: &str) -> Option<f64> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };

    let cleaned = match (digits.rfind('.'), digits.rfind(',')) {
        (Some(dot), Some(comma)) if comma > dot => digits.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => digits.replace(',', ""),
        (None, Some(_)) if is_thousands_grouped(digits) => digits.replace(',', ""),
        (None, Some(_)) if digits.matches(',').count() == 1 => digits.replace(',', "."),
        (None, Some(_)) => return None,
        _ => digits.to_string(),
    };

    if cleaned.is_empty()
        || cleaned.matches('.').count() > 1
        || !cleaned.chars().all(|c| c.is_ascii_digit() || c == '.')
    {
        return None;
    }
    let value: f64 = cleaned.parse().ok()?;
    Some(if negative { -value } else { value })
}

fn is_thousands_grouped(digits: &str) -> bool {
    let mut groups = digits.split(',');
    let head_ok = groups
        .next()
        .is_some_and(|g| (1..=3).contains(&g.len()) && g != "0");
    head_ok && groups.all(|g| g.len() == 3)
}

/// One record per field: smallest keyword-to-number distance wins, ties go
/// to the earliest in reading order.
pub fn select_canonical(
    records: impl IntoIterator<Item = NutrientRecord>,
) -> BTreeMap<NutrientField, NutrientRecord> {
    let mut selected: BTreeMap<NutrientField, NutrientRecord> = BTreeMap::new();
    for record in records {
        let closer = selected.get(&record.field).map_or(true, |current| {
            (record.token_distance, record.offset) < (current.token_distance, current.offset)
        });
        if closer {
            selected.insert(record.field, record);
        }
    }
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use labelscan_config::default_config;
    use labelscan_core::RawText;

    fn extractor() -> NutrientExtractor {
        NutrientExtractor::new(&default_config().analysis)
    }

    fn extract(text: &str) -> NutrientExtraction {
        extractor().extract(&normalize(&RawText::new(text)))
    }

    fn value_of(text: &str, field: NutrientField) -> Option<(f64, Unit)> {
        select_canonical(extract(text).records)
            .get(&field)
            .map(|r| (r.value, r.unit))
    }

    #[test]
    fn sodium_spellings_share_canonical_value() {
        for text in [
            "나트륨 500mg",
            "나트륨 500 mg",
            "나트륨 0.5g",
            "나트륨 500㎎",
            "Sodium 500 MG",
            "나트륨: 500밀리그램",
            "나트륨 500000mcg",
        ] {
            assert_eq!(
                value_of(text, NutrientField::Sodium),
                Some((500.0, Unit::Mg)),
                "{text}"
            );
        }
    }

    #[test]
    fn sugar_in_grams() {
        assert_eq!(
            value_of("설탕 함유량: 5g, 우유 함유하지 않음", NutrientField::Sugar),
            Some((5.0, Unit::G))
        );
        assert_eq!(
            value_of("당류 1,200mg", NutrientField::Sugar),
            Some((1.2, Unit::G))
        );
    }

    #[test]
    fn per_gram_is_not_sugar() {
        let extraction = extract("1회 제공량 30g당 나트륨 110mg");
        let selected = select_canonical(extraction.records);
        assert!(selected.get(&NutrientField::Sugar).is_none());
        assert_eq!(selected[&NutrientField::Sodium].value, 110.0);
    }

    #[test]
    fn negative_value_is_discarded_with_warning() {
        let extraction = extract("나트륨: -999999mg");
        assert!(extraction.records.is_empty());
        assert_eq!(
            extraction.warnings,
            vec!["discarded implausible SODIUM value \"-999999mg\"".to_string()]
        );
    }

    #[test]
    fn absurd_magnitude_is_discarded() {
        let extraction = extract("당류 99999g");
        assert!(extraction.records.is_empty());
        assert_eq!(extraction.warnings.len(), 1);
        assert!(extraction.warnings[0].contains("SUGAR"));
    }

    #[test]
    fn malformed_number_is_discarded() {
        let extraction = extract("나트륨 1.2.3mg");
        assert!(extraction.records.is_empty());
        assert_eq!(
            extraction.warnings,
            vec!["discarded malformed SODIUM value \"1.2.3mg\"".to_string()]
        );
    }

    #[test]
    fn skips_percent_and_finds_value() {
        let extraction = extract("나트륨 (25%) 500mg");
        let record = &extraction.records[0];
        assert_eq!(record.value, 500.0);
        assert_eq!(record.token_distance, 2);
        assert_eq!(record.raw_span, "나트륨 (25%) 500mg");
    }

    #[test]
    fn scan_is_bounded() {
        assert!(extract("나트륨 a b c d 500mg").records.is_empty());
        assert_eq!(extract("나트륨 a b c 500mg").records.len(), 1);
    }

    #[test]
    fn scan_stops_at_next_keyword() {
        let selected = select_canonical(extract("나트륨 당류 5g").records);
        assert!(selected.get(&NutrientField::Sodium).is_none());
        assert_eq!(selected[&NutrientField::Sugar].value, 5.0);
    }

    #[test]
    fn closer_mention_wins_then_first() {
        let extraction = extract("나트륨 기준 220mg 나트륨 110mg 나트륨 330mg");
        assert_eq!(extraction.records.len(), 3);
        let selected = select_canonical(extraction.records);
        assert_eq!(selected[&NutrientField::Sodium].value, 110.0);

        let selected = select_canonical(extract("나트륨 110mg 나트륨 220mg").records);
        assert_eq!(selected[&NutrientField::Sodium].value, 110.0);
    }

    #[test]
    fn raw_span_is_substring_of_text() {
        let text = normalize(&RawText::new("Total Sugars 12 g\nSodium 1O0 mg"));
        let extraction = extractor().extract(&text);
        assert_eq!(extraction.records.len(), 2);
        for record in &extraction.records {
            assert!(text.as_str().contains(&record.raw_span));
            assert_eq!(&text.as_str()[record.offset..record.span_end()], record.raw_span);
        }
    }

    #[test]
    fn compound_korean_keywords_keep_their_field() {
        let extraction = extract("포화지방 1.5g 트랜스지방 0g 가당연유당류 7g");
        let fields: Vec<_> = extraction.records.iter().map(|r| r.field).collect();
        assert_eq!(
            fields,
            vec![NutrientField::SaturatedFat, NutrientField::TransFat, NutrientField::Sugar]
        );
        assert_eq!(extraction.records[2].raw_span, "당류 7g");
    }

    #[test]
    fn microgram_values_are_not_floored() {
        let selected = select_canonical(extract("트랜스지방 40mcg").records);
        let trans = &selected[&NutrientField::TransFat];
        assert_eq!((trans.value, trans.unit), (0.00004, Unit::G));
    }

    #[test]
    fn english_fields() {
        let selected = select_canonical(
            extract("Total Fat 8g Saturated Fat 1g Trans Fat 0g Cholesterol 0mg Protein 3g").records,
        );
        assert_eq!(selected[&NutrientField::Fat].value, 8.0);
        assert_eq!(selected[&NutrientField::SaturatedFat].value, 1.0);
        assert_eq!(selected[&NutrientField::TransFat].value, 0.0);
        assert_eq!(selected[&NutrientField::Cholesterol].unit, Unit::Mg);
        assert_eq!(selected[&NutrientField::Protein].value, 3.0);
    }

    #[test]
    fn parses_number_formats() {
        assert_eq!(parse_number("1,200"), Some(1200.0));
        assert_eq!(parse_number("0,5"), Some(0.5));
        assert_eq!(parse_number("12,5"), Some(12.5));
        assert_eq!(parse_number("1,200.5"), Some(1200.5));
        assert_eq!(parse_number("1.200,5"), Some(1200.5));
        assert_eq!(parse_number("-3"), Some(-3.0));
        assert_eq!(parse_number("1.2.3"), None);
        assert_eq!(parse_number("1,2,3"), None);
    }
}
