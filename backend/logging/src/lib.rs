//! Structured logging for LabelScan.
//!
//! Console output plus daily-rotated NDJSON files, and redacted analysis
//! events for the request audit trail.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{AnalysisEvent, EventLogEntry, EventLogger};
pub use logger::{init_console_logger, init_logger};
pub use redact::redact_sensitive_data;
