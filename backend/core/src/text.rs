//! Text wrappers passed between pipeline stages.

use serde::{Deserialize, Serialize};

/// Unmodified OCR output for one label image.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawText(String);

impl RawText {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<&str> for RawText {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for RawText {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A single OCR character-confusion fix applied during normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Correction {
    /// Byte offset of the replacement inside the normalized text.
    pub offset: usize,
    pub original: char,
    pub replacement: char,
}

/// Canonical form of a [`RawText`], ready for pattern matching.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NormalizedText {
    text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    corrections: Vec<Correction>,
}

impl NormalizedText {
    pub fn new(text: String, corrections: Vec<Correction>) -> Self {
        Self { text, corrections }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn corrections(&self) -> &[Correction] {
        &self.corrections
    }

    /// Whether any confusion correction landed inside `start..end`.
    pub fn corrected_within(&self, start: usize, end: usize) -> bool {
        self.corrections
            .iter()
            .any(|c| c.offset >= start && c.offset < end)
    }
}
