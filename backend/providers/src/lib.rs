//! Capability adapters behind the `OcrEngine` and `Translator` traits.
//!
//! - [`tesseract::TesseractOcr`] shells out to the Tesseract CLI
//! - [`papago::PapagoTranslator`] calls the Papago NMT HTTP API
//! - [`mock`] holds in-memory doubles for tests

pub mod mock;
pub mod papago;
pub mod tesseract;

pub use papago::PapagoTranslator;
pub use tesseract::TesseractOcr;
