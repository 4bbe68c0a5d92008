use async_trait::async_trait;

use crate::error::{OcrError, TranslateError};
use crate::text::RawText;

/// Turns one label image into raw text.
///
/// Implementations perform I/O; the analysis core only ever sees the
/// returned [`RawText`]. Timeouts are applied by the caller.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Engine name used in logs (e.g., "tesseract").
    fn name(&self) -> &str;

    async fn recognize(&self, image: &[u8]) -> Result<RawText, OcrError>;
}

/// Translates text between two languages.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Provider name used in logs (e.g., "papago").
    fn name(&self) -> &str;

    /// `source` and `target` are ISO 639-1 codes ("ko", "en").
    async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String, TranslateError>;
}
