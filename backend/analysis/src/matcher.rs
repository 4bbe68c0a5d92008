//! Shared tokenizer and phrase matcher.
//!
//! Both extractors interpret their vocabulary tables through this one
//! routine; neither carries field-specific matching logic.

/// Characters that end a clause. Negation never reaches across one.
const CLAUSE_BREAKS: &[char] = &[',', ';', '.', '(', ')', '/', '[', ']'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Word,
    Number,
}

#[derive(Debug, Clone)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    /// Lowercased `text`, used for comparisons.
    pub folded: String,
    /// Byte range inside the tokenized text.
    pub start: usize,
    pub end: usize,
    /// A clause break separates this token from the previous one.
    pub break_before: bool,
    /// A line break separates this token from the previous one.
    pub line_before: bool,
}

fn is_hangul(c: char) -> bool {
    matches!(c, '\u{AC00}'..='\u{D7A3}' | '\u{1100}'..='\u{11FF}' | '\u{3130}'..='\u{318F}')
}

/// Split text into words and numbers.
///
/// Numbers glued to labels split off (`나트륨110mg` → `나트륨`, `110`, `mg`),
/// as do Hangul and non-Hangul letter runs. A `-` directly before a digit is
/// part of the number when it follows whitespace, `:` or the start of text.
/// `%` is a word of its own; other punctuation only separates.
pub fn tokenize(text: &str) -> Vec<Token<'_>> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let byte_at = |i: usize| chars.get(i).map_or(text.len(), |(pos, _)| *pos);
    let digit_at = |i: usize| chars.get(i).is_some_and(|(_, c)| c.is_ascii_digit());

    let mut tokens = Vec::new();
    let mut pending_break = false;
    let mut pending_line = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i].1;
        let negative_sign = c == '-'
            && digit_at(i + 1)
            && (i == 0 || chars[i - 1].1 == ':' || chars[i - 1].1.is_whitespace());

        let (kind, next) = if c.is_ascii_digit() || negative_sign {
            let mut j = i + 1;
            while j < chars.len() {
                let ch = chars[j].1;
                if ch.is_ascii_digit() || (matches!(ch, '.' | ',') && digit_at(j + 1)) {
                    j += 1;
                } else {
                    break;
                }
            }
            (TokenKind::Number, j)
        } else if c == '%' {
            (TokenKind::Word, i + 1)
        } else if c.is_alphabetic() {
            let hangul = is_hangul(c);
            let mut j = i + 1;
            while j < chars.len() && chars[j].1.is_alphabetic() && is_hangul(chars[j].1) == hangul {
                j += 1;
            }
            (TokenKind::Word, j)
        } else {
            if CLAUSE_BREAKS.contains(&c) {
                pending_break = true;
            }
            if c == '\n' {
                pending_line = true;
            }
            i += 1;
            continue;
        };

        let (start, end) = (byte_at(i), byte_at(next));
        let break_before = std::mem::take(&mut pending_break) && !tokens.is_empty();
        let line_before = std::mem::take(&mut pending_line) && !tokens.is_empty();
        tokens.push(Token {
            kind,
            text: &text[start..end],
            folded: text[start..end].to_lowercase(),
            start,
            end,
            break_before,
            line_before,
        });
        i = next;
    }

    tokens
}

/// Whether `token` starts with `part` without running on into more ASCII
/// letters: `fat` matches `fat` but not `fatty`; `우유` matches `우유분말`.
fn prefix_matches(token: &str, part: &str) -> bool {
    token
        .strip_prefix(part)
        .is_some_and(|rest| !rest.starts_with(|c: char| c.is_ascii_alphabetic()))
}

/// Byte offsets inside `token.folded` where `part` may begin.
///
/// A part of two or more Hangul syllables matches anywhere inside a Hangul
/// token, since Korean compounds carry no separator (`탈지분유`, `볶음땅콩`).
/// Everything else must start the token.
fn part_offsets(token: &Token<'_>, part: &str) -> Vec<usize> {
    let inner = part.chars().count() > 1
        && part.chars().all(is_hangul)
        && token.text.starts_with(is_hangul);
    if inner {
        token.folded.match_indices(part).map(|(i, _)| i).collect()
    } else if prefix_matches(&token.folded, part) {
        vec![0]
    } else {
        Vec::new()
    }
}

/// Byte position in the source text of `offset` bytes into `token.folded`.
fn source_pos(token: &Token<'_>, offset: usize) -> usize {
    (token.start + offset).min(token.end)
}

/// Where a phrase occurs, starting from one token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurrence {
    /// Byte offset of the first part inside the first token's folded text.
    pub offset: usize,
    /// Token index one past the match.
    pub end: usize,
    /// Byte range inside the tokenized text.
    pub from: usize,
    pub to: usize,
}

/// A keyword or marker, possibly several words long.
#[derive(Debug, Clone)]
pub struct Phrase {
    parts: Vec<String>,
    chars: usize,
}

impl Phrase {
    pub fn new(text: &str) -> Option<Self> {
        let parts: Vec<String> = text.split_whitespace().map(str::to_lowercase).collect();
        if parts.is_empty() {
            return None;
        }
        let chars = parts.iter().map(|p| p.chars().count()).sum();
        Some(Self { parts, chars })
    }

    /// Every occurrence whose first part lies inside `tokens[at]`.
    pub fn occurrences_at(&self, tokens: &[Token<'_>], at: usize) -> Vec<Occurrence> {
        let Some(first) = tokens.get(at) else {
            return Vec::new();
        };
        let Some((head, rest)) = self.parts.split_first() else {
            return Vec::new();
        };

        for (i, part) in rest.iter().enumerate() {
            let Some(token) = tokens.get(at + 1 + i) else {
                return Vec::new();
            };
            if token.break_before || !prefix_matches(&token.folded, part) {
                return Vec::new();
            }
        }

        let end = at + self.parts.len();
        part_offsets(first, head)
            .into_iter()
            .map(|offset| {
                let to = match rest.last() {
                    Some(last) => source_pos(&tokens[end - 1], last.len()),
                    None => source_pos(first, offset + head.len()),
                };
                Occurrence {
                    offset,
                    end,
                    from: source_pos(first, offset),
                    to,
                }
            })
            .collect()
    }

    /// Token index one past the first occurrence starting at `tokens[at]`.
    pub fn match_at(&self, tokens: &[Token<'_>], at: usize) -> Option<usize> {
        self.occurrences_at(tokens, at).first().map(|o| o.end)
    }

    fn head_len(&self) -> usize {
        self.parts.first().map_or(0, String::len)
    }
}

/// One phrase occurrence, as a token range plus the exact byte range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit<T> {
    pub owner: T,
    pub start: usize,
    pub end: usize,
    pub from: usize,
    pub to: usize,
    /// Insertion order of the matching phrase; lower wins ties.
    rank: usize,
    chars: usize,
}

impl<T> Hit<T> {
    fn len(&self) -> usize {
        self.end - self.start
    }

    fn covers(&self, other: &Hit<T>) -> bool {
        self.from <= other.from && other.to <= self.to
    }

    fn beats(&self, other: &Hit<T>) -> bool {
        (self.len(), self.chars, std::cmp::Reverse(self.rank))
            > (other.len(), other.chars, std::cmp::Reverse(other.rank))
    }

    /// Lies entirely within the byte range `from..to`.
    pub fn within(&self, from: usize, to: usize) -> bool {
        from <= self.from && self.to <= to
    }
}

#[derive(Debug, Clone)]
struct Entry<T> {
    phrase: Phrase,
    owner: T,
    exclusions: Vec<String>,
}

impl<T> Entry<T> {
    /// An exclusion spelled around the hit vetoes it: `밀폐` is not wheat,
    /// `땅콩버터` is not butter.
    fn excluded(&self, folded: &str, offset: usize) -> bool {
        let end = offset + self.phrase.head_len();
        self.exclusions.iter().any(|e| {
            folded
                .match_indices(e.as_str())
                .any(|(i, m)| i <= offset && end <= i + m.len())
        })
    }
}

/// A vocabulary of phrases, each tagged with the field or category it
/// stands for.
#[derive(Debug, Clone)]
pub struct PhraseSet<T> {
    entries: Vec<Entry<T>>,
}

impl<T> Default for PhraseSet<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T: Copy> PhraseSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, text: &str, owner: T) {
        self.insert_with_exclusions(text, owner, &[]);
    }

    /// `exclusions` veto a hit they spell around (`밀폐` is not wheat).
    pub fn insert_with_exclusions(&mut self, text: &str, owner: T, exclusions: &[String]) {
        if let Some(phrase) = Phrase::new(text) {
            self.entries.push(Entry {
                phrase,
                owner,
                exclusions: exclusions
                    .iter()
                    .map(|e| e.trim().to_lowercase())
                    .filter(|e| !e.is_empty())
                    .collect(),
            });
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every hit in reading order. A hit lying inside a longer (or equally
    /// long, earlier-listed) hit is dropped, so `total sugars` yields one hit
    /// and `밀크` is milk rather than wheat.
    pub fn find_all(&self, tokens: &[Token<'_>]) -> Vec<Hit<T>> {
        let mut raw = Vec::new();
        for at in 0..tokens.len() {
            for (rank, entry) in self.entries.iter().enumerate() {
                for found in entry.phrase.occurrences_at(tokens, at) {
                    if entry.excluded(&tokens[at].folded, found.offset) {
                        continue;
                    }
                    raw.push(Hit {
                        owner: entry.owner,
                        start: at,
                        end: found.end,
                        from: found.from,
                        to: found.to,
                        rank,
                        chars: entry.phrase.chars,
                    });
                }
            }
        }
        raw.sort_by_key(|hit| (hit.from, hit.to));

        raw.iter()
            .enumerate()
            .filter(|(i, hit)| {
                !raw.iter()
                    .enumerate()
                    .any(|(j, other)| *i != j && other.covers(hit) && other.beats(hit))
            })
            .map(|(_, hit)| *hit)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts<'a>(tokens: &'a [Token<'a>]) -> Vec<&'a str> {
        tokens.iter().map(|t| t.text).collect()
    }

    #[test]
    fn splits_numbers_units_and_scripts() {
        let tokens = tokenize("나트륨110mg(6%) 30g당");
        assert_eq!(
            texts(&tokens),
            vec!["나트륨", "110", "mg", "6", "%", "30", "g", "당"]
        );
        assert_eq!(tokens[1].kind, TokenKind::Number);
        assert!(tokens[3].break_before);
        assert!(tokens[5].break_before);
        assert!(!tokens[2].break_before);
    }

    #[test]
    fn keeps_decimal_and_grouping_marks() {
        let tokens = tokenize("1,200mg 0.5g 5, 6");
        assert_eq!(texts(&tokens), vec!["1,200", "mg", "0.5", "g", "5", "6"]);
        assert!(tokens[5].break_before);
    }

    #[test]
    fn negative_sign_only_after_space_or_colon() {
        let tokens = tokenize("나트륨: -999999mg 10-20g");
        assert_eq!(texts(&tokens), vec!["나트륨", "-999999", "mg", "10", "20", "g"]);
    }

    #[test]
    fn byte_offsets_slice_back() {
        let text = "당류 5g, 우유";
        for token in tokenize(text) {
            assert_eq!(&text[token.start..token.end], token.text);
        }
    }

    #[test]
    fn phrase_prefix_rules() {
        let tokens = tokenize("Fatty acids, total fat 3g, 우유분말");
        let fat = Phrase::new("fat").unwrap();
        assert_eq!(fat.match_at(&tokens, 0), None);
        assert_eq!(fat.match_at(&tokens, 3), Some(4));
        let total_fat = Phrase::new("Total  Fat").unwrap();
        assert_eq!(total_fat.match_at(&tokens, 2), Some(4));
        let milk = Phrase::new("우유").unwrap();
        assert_eq!(milk.match_at(&tokens, 6), Some(7));
    }

    #[test]
    fn phrase_does_not_span_clause_break() {
        let tokens = tokenize("free, of");
        assert_eq!(Phrase::new("free of").unwrap().match_at(&tokens, 0), None);
    }

    #[test]
    fn longest_hit_wins_overlap() {
        let mut set = PhraseSet::new();
        set.insert("sugars", "plain");
        set.insert("total sugars", "total");
        let hits = set.find_all(&tokenize("Total Sugars 5g"));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].owner, "total");
        assert_eq!((hits[0].start, hits[0].end), (0, 2));
    }

    #[test]
    fn longer_keyword_wins_same_token() {
        let mut set = PhraseSet::new();
        set.insert("밀", "wheat");
        set.insert("밀크", "milk");
        let hits = set.find_all(&tokenize("밀크초콜릿"));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].owner, "milk");
    }

    #[test]
    fn exclusions_veto_hits() {
        let mut set = PhraseSet::new();
        set.insert_with_exclusions("밀", "wheat", &["밀폐".to_string()]);
        assert!(set.find_all(&tokenize("밀폐 용기")).is_empty());
        assert_eq!(set.find_all(&tokenize("밀가루")).len(), 1);
    }

    #[test]
    fn records_line_breaks() {
        let tokens = tokenize("대두 함유\n보존료 무첨가, 우유");
        assert!(tokens[2].line_before);
        assert!(!tokens[2].break_before);
        assert!(!tokens[1].line_before);
        assert!(tokens[4].break_before && !tokens[4].line_before);
    }

    #[test]
    fn hangul_keywords_match_inside_compounds() {
        let text = "탈지분유, 볶음땅콩";
        let tokens = tokenize(text);
        let mut set = PhraseSet::new();
        set.insert("분유", "milk");
        set.insert("땅콩", "peanut");
        let hits = set.find_all(&tokens);
        assert_eq!(hits.len(), 2);
        assert_eq!(&text[hits[0].from..hits[0].to], "분유");
        assert_eq!(&text[hits[1].from..hits[1].to], "땅콩");
        assert_eq!((hits[1].start, hits[1].end), (1, 2));
    }

    #[test]
    fn single_syllables_and_ascii_stay_anchored() {
        let mut set = PhraseSet::new();
        set.insert("밀", "wheat");
        set.insert("nut", "nut");
        assert!(set.find_all(&tokenize("메밀 doughnut")).is_empty());
        assert_eq!(set.find_all(&tokenize("밀가루 nut")).len(), 2);
    }

    #[test]
    fn exclusions_apply_inside_compounds() {
        let mut set = PhraseSet::new();
        set.insert_with_exclusions("버터", "butter", &["땅콩버터".to_string()]);
        assert!(set.find_all(&tokenize("볶음땅콩버터")).is_empty());
        assert_eq!(set.find_all(&tokenize("가염버터")).len(), 1);
    }
}
