//! Allergen detector with negation handling.
//!
//! Every keyword hit is one occurrence. An occurrence is negated when a
//! negation marker follows it within `negation_window` tokens (suffix
//! markers) or precedes it within `prefix_negation_window` tokens (prefix
//! markers). The window never crosses a clause break, a line break, another
//! allergen keyword or a word asserting presence (`함유`, `contains`).

use std::collections::{BTreeMap, BTreeSet};

use labelscan_config::{AnalysisConfig, NegationConfig};
use labelscan_core::{AllergenCategory, AllergenMatch, NormalizedText};

use crate::matcher::{tokenize, Hit, PhraseSet, Token};

/// Markers tagged `None` apply to every category.
type MarkerSet = PhraseSet<Option<AllergenCategory>>;
type Marker = Hit<Option<AllergenCategory>>;

#[derive(Debug, Clone, Default)]
struct Markers {
    prefix: MarkerSet,
    suffix: MarkerSet,
    positive: MarkerSet,
}

impl Markers {
    fn add(&mut self, config: &NegationConfig, owner: Option<AllergenCategory>) {
        for marker in &config.prefix {
            self.prefix.insert(marker, owner);
        }
        for marker in &config.suffix {
            self.suffix.insert(marker, owner);
        }
        for marker in &config.positive {
            self.positive.insert(marker, owner);
        }
    }
}

/// Everything found in one text, shared by every occurrence check.
struct Scan<'t> {
    tokens: Vec<Token<'t>>,
    hits: Vec<Hit<AllergenCategory>>,
    prefix: Vec<Marker>,
    suffix: Vec<Marker>,
    positive: Vec<Marker>,
}

#[derive(Debug, Clone)]
pub struct AllergenDetector {
    keywords: PhraseSet<AllergenCategory>,
    markers: Markers,
    window: usize,
    prefix_window: usize,
}

impl AllergenDetector {
    pub fn new(config: &AnalysisConfig) -> Self {
        let mut keywords = PhraseSet::new();
        let mut markers = Markers::default();

        markers.add(&config.negation, None);
        for row in &config.allergens {
            for keyword in &row.keywords {
                keywords.insert_with_exclusions(keyword, row.category, &row.exclusions);
            }
            markers.add(&row.negation, Some(row.category));
        }

        Self {
            keywords,
            markers,
            window: config.negation_window(),
            prefix_window: config.prefix_negation_window(),
        }
    }

    /// Every occurrence in reading order, unresolved.
    pub fn detect(&self, text: &NormalizedText) -> Vec<AllergenMatch> {
        let source = text.as_str();
        let tokens = tokenize(source);
        let scan = Scan {
            hits: self.keywords.find_all(&tokens),
            prefix: self.markers.prefix.find_all(&tokens),
            suffix: self.markers.suffix.find_all(&tokens),
            positive: self.markers.positive.find_all(&tokens),
            tokens,
        };

        scan.hits
            .iter()
            .map(|hit| {
                let (start, end, present) = match self.negating_marker(hit, &scan) {
                    Some(marker) => (
                        hit.start.min(marker.start),
                        hit.end.max(marker.end),
                        false,
                    ),
                    None => (hit.start, hit.end, true),
                };
                let (from, to) = (scan.tokens[start].start, scan.tokens[end - 1].end);
                AllergenMatch {
                    category: hit.owner,
                    present,
                    raw_span: source[from..to].to_string(),
                    offset: from,
                }
            })
            .collect()
    }

    fn negating_marker(&self, hit: &Hit<AllergenCategory>, scan: &Scan<'_>) -> Option<Marker> {
        let applies = |marker: &&Marker| marker.owner.map_or(true, |category| category == hit.owner);

        // A suffix glued to the keyword's own token (`우유미함유`) sits at gap 0.
        let after = scan
            .suffix
            .iter()
            .filter(applies)
            .filter(|m| m.from >= hit.to && m.start.saturating_sub(hit.end) <= self.window)
            .find(|m| clear_between(scan, hit.owner, (hit.end, m.start), (hit.to, m.from)));

        let before = || {
            scan.prefix
                .iter()
                .rev()
                .filter(applies)
                .filter(|m| m.to <= hit.from && hit.start.saturating_sub(m.end) <= self.prefix_window)
                .find(|m| clear_between(scan, hit.owner, (m.end, hit.start), (m.to, hit.from)))
        };

        after.or_else(before).copied()
    }
}

/// Nothing stops negation between a keyword and a marker: no clause or line
/// break before tokens `first..=last`, and no other keyword or presence word
/// inside the byte range `from..to`.
fn clear_between(
    scan: &Scan<'_>,
    category: AllergenCategory,
    (first, last): (usize, usize),
    (from, to): (usize, usize),
) -> bool {
    let no_break = scan
        .tokens
        .get(first..=last)
        .unwrap_or_default()
        .iter()
        .all(|t| !t.break_before && !t.line_before);
    let no_keyword = !scan.hits.iter().any(|h| h.within(from, to));
    let no_assertion = !scan
        .positive
        .iter()
        .any(|p| p.owner.map_or(true, |c| c == category) && p.within(from, to));
    no_break && no_keyword && no_assertion
}

/// Per-category outcome of the positive-wins rule.
#[derive(Debug, Clone, Default)]
pub struct AllergenResolution {
    pub allergens: BTreeMap<AllergenCategory, AllergenMatch>,
    /// Categories that had both positive and negated occurrences.
    pub conflicts: BTreeSet<AllergenCategory>,
}

/// Collapse occurrences to one per category. Any positive occurrence makes
/// the category present; only all-negated categories resolve to absent.
/// Within the winning polarity the earliest occurrence is kept.
pub fn resolve_allergens(occurrences: impl IntoIterator<Item = AllergenMatch>) -> AllergenResolution {
    let mut resolution = AllergenResolution::default();
    let mut positive = BTreeSet::new();
    let mut negated = BTreeSet::new();

    for occurrence in occurrences {
        if occurrence.present {
            positive.insert(occurrence.category);
        } else {
            negated.insert(occurrence.category);
        }
        let wins = resolution
            .allergens
            .get(&occurrence.category)
            .map_or(true, |current| {
                (!occurrence.present, occurrence.offset) < (!current.present, current.offset)
            });
        if wins {
            resolution.allergens.insert(occurrence.category, occurrence);
        }
    }

    resolution.conflicts = positive.intersection(&negated).copied().collect();
    resolution
}
