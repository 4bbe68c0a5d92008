//! Analysis audit events, written through `tracing` under the
//! `analysis_events` target.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::redact::redact_sensitive_data;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnalysisEvent {
    UploadReceived {
        filename: String,
        mime: String,
        bytes: usize,
    },
    OcrCompleted {
        engine: String,
        chars: usize,
        elapsed_ms: u64,
    },
    ReportReady {
        nutrients: usize,
        allergens: usize,
        warnings: Vec<String>,
        translated: bool,
    },
    RequestFailed {
        stage: String,
        error_msg: String,
    },
}

impl AnalysisEvent {
    fn redact(&mut self) {
        match self {
            AnalysisEvent::ReportReady { warnings, .. } => {
                for warning in warnings.iter_mut() {
                    *warning = redact_sensitive_data(warning);
                }
            }
            AnalysisEvent::RequestFailed { error_msg, .. } => {
                *error_msg = redact_sensitive_data(error_msg);
            }
            AnalysisEvent::UploadReceived { .. } | AnalysisEvent::OcrCompleted { .. } => {}
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EventLogEntry {
    pub report_id: String,
    pub timestamp: DateTime<Utc>,
    pub event: AnalysisEvent,
}

pub struct EventLogger;

impl EventLogger {
    /// Redacted entry for `event`, stamped now.
    pub fn entry(report_id: &str, mut event: AnalysisEvent) -> EventLogEntry {
        event.redact();
        EventLogEntry {
            report_id: report_id.to_string(),
            timestamp: Utc::now(),
            event,
        }
    }

    pub fn log_event(report_id: &str, event: AnalysisEvent) {
        let entry = Self::entry(report_id, event);
        match serde_json::to_string(&entry) {
            Ok(json) => info!(target: "analysis_events", event = %json, "Analysis event"),
            Err(_) => info!(target: "analysis_events", event = ?entry, "Analysis event"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_is_redacted_and_tagged() {
        let entry = EventLogger::entry(
            "r-1",
            AnalysisEvent::RequestFailed {
                stage: "translation".into(),
                error_msg: "401 for X-NCP-APIGW-API-KEY: s3cr3t".into(),
            },
        );
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["report_id"], "r-1");
        assert_eq!(json["event"]["type"], "request_failed");
        assert!(!json["event"]["error_msg"].as_str().unwrap().contains("s3cr3t"));
    }

    #[test]
    fn report_warnings_are_redacted() {
        let entry = EventLogger::entry(
            "r-2",
            AnalysisEvent::ReportReady {
                nutrients: 2,
                allergens: 1,
                warnings: vec!["SUGAR not found".into(), "call 080-023-5181".into()],
                translated: false,
            },
        );
        let AnalysisEvent::ReportReady { warnings, .. } = entry.event else {
            panic!("wrong variant");
        };
        assert_eq!(warnings[0], "SUGAR not found");
        assert_eq!(warnings[1], "call [REDACTED_PHONE]");
    }
}
