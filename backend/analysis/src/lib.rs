//! `labelscan-analysis`: the label-text analysis pipeline.
//!
//! raw OCR text → [`normalize`] → {[`nutrients`], [`allergens`]} →
//! [`assemble`] → optional [`translation`] → `AnalysisReport`.
//!
//! Everything except translation is synchronous and free of I/O, so it can
//! be unit-tested with plain strings and run concurrently without locks.

pub mod allergens;
pub mod assemble;
pub mod matcher;
pub mod normalize;
pub mod nutrients;
pub mod pipeline;
pub mod translation;

pub use allergens::{resolve_allergens, AllergenDetector, AllergenResolution};
pub use assemble::ReportAssembler;
pub use normalize::{normalize, Normalizer};
pub use nutrients::{parse_number, select_canonical, NutrientExtraction, NutrientExtractor};
pub use pipeline::LabelAnalyzer;
pub use translation::{attach_translation, guess_lang_pair, TranslationOrchestrator, TranslationPolicy};
