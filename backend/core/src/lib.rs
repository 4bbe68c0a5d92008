pub mod error;
pub mod report;
pub mod text;
pub mod traits;
pub mod types;

pub use error::{LabelError, OcrError, TranslateError};
pub use report::{AllergenMatch, AnalysisReport, NutrientRecord};
pub use text::{Correction, NormalizedText, RawText};
pub use traits::{OcrEngine, Translator};
pub use types::{AllergenCategory, NutrientField, Unit};
