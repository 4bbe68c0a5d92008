//! Text normalizer: raw OCR output → canonical text for pattern matching.
//!
//! Steps run in a fixed order:
//! 1. full-width ASCII and ideographic space → half-width
//! 2. single-glyph unit symbols (`㎎`, `㎍`, `μg`, ...) → ASCII spellings
//! 3. whitespace runs → one space; runs holding a line break → one `\n`,
//!    so later stages still see where a line ended
//! 4. `500 mg` → `500mg`, unit spellings rewritten to their canonical symbol
//! 5. allow-listed OCR confusions (`O`/`o` → `0`, `l`/`I`/`|` → `1`) fixed
//!    inside numeric context only
//!
//! The whole transform is idempotent. Digits split by spaces (`5 0 0mg`) are
//! never merged.

use std::collections::HashMap;

use labelscan_config::defaults::default_units;
use labelscan_config::UnitSpellingConfig;
use labelscan_core::{Correction, NormalizedText, RawText, Unit};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static LINE_BREAKS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*[\r\n]\s*").unwrap());
static SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\S\n]+").unwrap());

static DEFAULT_NORMALIZER: Lazy<Normalizer> = Lazy::new(|| {
    Normalizer::new(&default_units()).expect("built-in unit spellings form a valid pattern")
});

const SYMBOL_FOLDS: &[(&str, &str)] = &[
    ("㎎", "mg"),
    ("㎍", "mcg"),
    ("μg", "mcg"),
    ("µg", "mcg"),
    ("㎏", "kg"),
    ("㎉", "kcal"),
    ("㎖", "ml"),
];

/// Non-mass units that still get glued to their number, kept as written.
const PASSTHROUGH_UNITS: &[&str] = &["kcal", "kj", "kg", "ml", "%"];

/// Normalize with the built-in unit spellings.
pub fn normalize(raw: &RawText) -> NormalizedText {
    DEFAULT_NORMALIZER.normalize(raw)
}

#[derive(Debug, Clone)]
pub struct Normalizer {
    unit_join: Regex,
    /// lowercase spelling → canonical symbol
    canonical: HashMap<String, &'static str>,
}

impl Normalizer {
    pub fn new(units: &[UnitSpellingConfig]) -> Result<Self, regex::Error> {
        let mut canonical: HashMap<String, &'static str> = Unit::ALL
            .iter()
            .map(|u| (u.symbol().to_string(), u.symbol()))
            .collect();
        for row in units {
            for spelling in &row.spellings {
                let folded = fold_unit_symbols(&spelling.trim().to_lowercase());
                if !folded.is_empty() {
                    canonical.insert(folded, row.unit.symbol());
                }
            }
        }

        let mut spellings: Vec<String> = canonical.keys().cloned().collect();
        spellings.extend(PASSTHROUGH_UNITS.iter().map(|s| s.to_string()));
        spellings.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then(a.cmp(b)));
        spellings.dedup();

        let alternation = spellings
            .iter()
            .map(|s| regex::escape(s))
            .collect::<Vec<_>>()
            .join("|");
        let unit_join = Regex::new(&format!(r"(?i)(\d) ?({alternation})"))?;

        Ok(Self {
            unit_join,
            canonical,
        })
    }

    pub fn normalize(&self, raw: &RawText) -> NormalizedText {
        let folded = fold_unit_symbols(&fold_width(raw.as_str()));
        let lines = LINE_BREAKS.replace_all(folded.trim(), "\n");
        let collapsed = SPACES.replace_all(&lines, " ");
        let joined = self.join_units(&collapsed);
        let (text, corrections) = correct_confusions(&joined);
        NormalizedText::new(text, corrections)
    }

    fn join_units(&self, text: &str) -> String {
        self.unit_join
            .replace_all(text, |caps: &Captures| {
                let end = caps.get(0).map_or(text.len(), |m| m.end());
                if text[end..].starts_with(|c: char| c.is_ascii_alphabetic()) {
                    return caps[0].to_string();
                }
                let unit = &caps[2];
                let symbol = self
                    .canonical
                    .get(&unit.to_lowercase())
                    .copied()
                    .unwrap_or(unit);
                format!("{}{}", &caps[1], symbol)
            })
            .into_owned()
    }
}

fn fold_width(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{3000}' => ' ',
            '\u{FF01}'..='\u{FF5E}' => char::from_u32(c as u32 - 0xFEE0).unwrap_or(c),
            _ => c,
        })
        .collect()
}

fn fold_unit_symbols(text: &str) -> String {
    SYMBOL_FOLDS
        .iter()
        .fold(text.to_string(), |acc, (from, to)| acc.replace(from, to))
}

fn confusable_digit(c: char) -> Option<char> {
    match c {
        'O' | 'o' => Some('0'),
        'l' | 'I' | '|' => Some('1'),
        _ => None,
    }
}

/// What follows a run of confusable characters.
#[derive(Debug, PartialEq, Eq)]
enum Ahead {
    Digit,
    /// `.` followed by a digit
    Point,
    /// `,` followed by a digit
    Comma,
    /// a canonical unit symbol, exactly as step 4 leaves it
    Unit,
    Other,
}

fn classify_ahead(rest: &str) -> Ahead {
    let mut chars = rest.chars();
    match chars.next() {
        Some(c) if c.is_ascii_digit() => return Ahead::Digit,
        // a confusable after the point counts: it may become a digit later in this pass
        Some(sep @ ('.' | ','))
            if chars
                .next()
                .is_some_and(|c| c.is_ascii_digit() || confusable_digit(c).is_some()) =>
        {
            return if sep == '.' { Ahead::Point } else { Ahead::Comma };
        }
        _ => {}
    }
    let is_unit = Unit::ALL
        .iter()
        .map(|u| u.symbol())
        .chain(PASSTHROUGH_UNITS.iter().copied())
        .any(|sym| {
            rest.strip_prefix(sym)
                .is_some_and(|after| !after.starts_with(|c: char| c.is_ascii_alphabetic()))
        });
    if is_unit {
        Ahead::Unit
    } else {
        Ahead::Other
    }
}

fn correct_confusions(text: &str) -> (String, Vec<Correction>) {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut out = String::with_capacity(text.len());
    let mut corrections = Vec::new();

    for (i, &(_, c)) in chars.iter().enumerate() {
        let Some(digit) = confusable_digit(c) else {
            out.push(c);
            continue;
        };

        let next = chars[i + 1..]
            .iter()
            .find(|(_, ch)| confusable_digit(*ch).is_none())
            .map_or(text.len(), |(pos, _)| *pos);
        let ahead = classify_ahead(&text[next..]);

        let fix = match out.chars().next_back() {
            Some(prev) if prev.is_ascii_digit() => ahead != Ahead::Other,
            Some(prev) if prev.is_ascii_alphanumeric() => false,
            _ => c != '|' && matches!(ahead, Ahead::Digit | Ahead::Point),
        };

        if fix {
            corrections.push(Correction {
                offset: out.len(),
                original: c,
                replacement: digit,
            });
            out.push(digit);
        } else {
            out.push(c);
        }
    }

    (out, corrections)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(s: &str) -> String {
        normalize(&RawText::new(s)).as_str().to_string()
    }

    #[test]
    fn collapses_whitespace_and_keeps_lines() {
        assert_eq!(norm("  나트륨\n\n 500mg \t 당류\r\n5g  "), "나트륨\n500mg 당류\n5g");
        assert_eq!(norm("대두 함유 \r\n  합성보존료　무첨가"), "대두 함유\n합성보존료 무첨가");
        assert_eq!(norm(" \n\t "), "");
    }

    #[test]
    fn folds_full_width_and_unit_glyphs() {
        assert_eq!(norm("나트륨　５００㎎"), "나트륨 500mg");
        assert_eq!(norm("비타민D 5 μg"), "비타민D 5mcg");
        assert_eq!(norm("열량 200 ㎉"), "열량 200kcal");
    }

    #[test]
    fn joins_number_and_unit() {
        assert_eq!(norm("sodium 500 mg"), "sodium 500mg");
        assert_eq!(norm("sodium 500 MG"), "sodium 500mg");
        assert_eq!(norm("당류 5 그램"), "당류 5g");
        assert_eq!(norm("나트륨 500 밀리그램"), "나트륨 500mg");
        assert_eq!(norm("1일 기준치 25 %"), "1일 기준치 25%");
        assert_eq!(norm("sugar 5 grams"), "sugar 5g");
    }

    #[test]
    fn does_not_join_into_words() {
        assert_eq!(norm("contains 5 good things"), "contains 5 good things");
        assert_eq!(norm("5 0 0mg"), "5 0 0mg");
    }

    #[test]
    fn corrects_confusions_in_numeric_context() {
        let text = normalize(&RawText::new("나트륨 1O0mg 당류 O.5g"));
        assert_eq!(text.as_str(), "나트륨 100mg 당류 0.5g");
        assert_eq!(text.corrections().len(), 2);
        assert_eq!(text.corrections()[0].original, 'O');
        assert_eq!(text.corrections()[0].replacement, '0');
        let offset = text.corrections()[0].offset;
        assert_eq!(&text.as_str()[offset..offset + 1], "0");
    }

    #[test]
    fn leaves_words_alone() {
        for s in ["Iron 5mg", "Oil blend", "No milk", "lot 12", "Vol. 1", "Sodium lOw"] {
            let text = normalize(&RawText::new(s));
            assert_eq!(text.as_str(), s, "{s}");
            assert!(text.corrections().is_empty());
        }
    }

    #[test]
    fn pipe_only_fixed_after_digit() {
        assert_eq!(norm("|5"), "|5");
        assert_eq!(norm("5|0mg"), "510mg");
    }

    #[test]
    fn idempotent() {
        let samples = [
            "나트륨 ５００ ㎎ (25%)",
            "Sodium 1O0 mg, Sugars O.5 g",
            "당류 5 그램\n우유 함유하지 않음",
            "lOl 5 0 0mg |I 2,OOO mg",
            "o.o5g 1 l O",
            "  ",
            "5O 그램 5O그램",
        ];
        for s in samples {
            let once = normalize(&RawText::new(s));
            let twice = normalize(&RawText::new(once.as_str()));
            assert_eq!(once.as_str(), twice.as_str(), "{s:?}");
            assert!(twice.corrections().is_empty(), "{s:?}");
        }
    }

    #[test]
    fn custom_spellings() {
        let units = vec![UnitSpellingConfig {
            unit: Unit::Mg,
            spellings: vec!["milligramm".into()],
        }];
        let normalizer = Normalizer::new(&units).unwrap();
        let text = normalizer.normalize(&RawText::new("Natrium 40 milligramm"));
        assert_eq!(text.as_str(), "Natrium 40mg");
    }
}
