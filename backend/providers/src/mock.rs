//! In-memory capability doubles with canned behavior.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use labelscan_core::{OcrEngine, OcrError, RawText, TranslateError, Translator};

/// OCR double that returns fixed text, fails, or stalls.
#[derive(Debug, Default)]
pub struct MockOcr {
    text: String,
    failure: Option<String>,
    delay: Option<Duration>,
}

impl MockOcr {
    /// Recognizes nothing until [`with_text`](Self::with_text) is set.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl OcrEngine for MockOcr {
    fn name(&self) -> &str {
        "mock"
    }

    async fn recognize(&self, _image: &[u8]) -> Result<RawText, OcrError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.failure {
            Some(message) => Err(OcrError::Engine(message.clone())),
            None => Ok(RawText::new(self.text.clone())),
        }
    }
}

/// Translator double. Every call is recorded as `(text, source, target)`.
#[derive(Debug, Default)]
pub struct MockTranslator {
    reply: Option<String>,
    failure: Option<String>,
    delay: Option<Duration>,
    calls: Mutex<Vec<(String, String, String)>>,
}

impl MockTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reply(mut self, reply: impl Into<String>) -> Self {
        self.reply = Some(reply.into());
        self
    }

    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<(String, String, String)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Translator for MockTranslator {
    fn name(&self) -> &str {
        "mock"
    }

    async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String, TranslateError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((text.to_string(), source.to_string(), target.to_string()));
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = &self.failure {
            return Err(TranslateError::Unavailable(message.clone()));
        }
        // Without a canned reply, echo the input back
        Ok(self.reply.clone().unwrap_or_else(|| text.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_ocr_modes() {
        let ocr = MockOcr::new().with_text("나트륨 500mg");
        assert_eq!(ocr.recognize(b"x").await.unwrap().as_str(), "나트륨 500mg");
        assert!(MockOcr::new().recognize(b"x").await.unwrap().as_str().is_empty());

        let err = MockOcr::new().failing("boom").recognize(b"x").await.unwrap_err();
        assert!(matches!(err, OcrError::Engine(m) if m == "boom"));
    }

    #[tokio::test]
    async fn mock_translator_records_calls() {
        let translator = MockTranslator::new();
        let out = translator.translate("당류", "ko", "en").await.unwrap();
        assert_eq!(out, "당류");
        assert_eq!(translator.calls().len(), 1);

        let err = MockTranslator::new()
            .failing("down")
            .translate("a", "en", "ko")
            .await
            .unwrap_err();
        assert!(matches!(err, TranslateError::Unavailable(_)));
    }
}
