//! Dispatch outcomes published on the result channel.

use serde::{Deserialize, Serialize};

use shopfloor_core::CorrelationId;

use crate::envelope::EventEnvelope;
use crate::result::ResultMessage;
use crate::status::{StatusFill, StatusIndication, StatusShape};

/// Final classification of a queued command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Resolution {
    /// Processed and succeeded.
    Success,
    /// Processed; the backend reported a failure.
    Failure { message: String },
    /// Not processed when the single check ran. Not an error.
    Timeout { window_ms: u64 },
}

impl Resolution {
    pub fn is_success(&self) -> bool {
        matches!(self, Resolution::Success)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DispatchOutcome {
    /// The payload did not satisfy its mode; nothing reached the backend.
    InsufficientPayload {
        mode: Option<String>,
        reason: String,
    },
    /// The command row was written; a confirmation check is armed.
    Submitted {
        correlation_id: CorrelationId,
        mode: String,
        workstation_id: Option<String>,
    },
    /// The armed confirmation check ran.
    Resolved {
        correlation_id: CorrelationId,
        resolution: Resolution,
        result: ResultMessage,
    },
    /// Rows answering a read mode.
    Rows { mode: String, result: ResultMessage },
    /// A persistence or connectivity error delivered as data.
    Failed {
        correlation_id: Option<CorrelationId>,
        result: ResultMessage,
    },
}

impl DispatchOutcome {
    pub fn event_type(&self) -> &'static str {
        match self {
            DispatchOutcome::InsufficientPayload { .. } => "dispatch.insufficient_payload",
            DispatchOutcome::Submitted { .. } => "dispatch.submitted",
            DispatchOutcome::Resolved { .. } => "dispatch.resolved",
            DispatchOutcome::Rows { .. } => "dispatch.rows",
            DispatchOutcome::Failed { .. } => "dispatch.failed",
        }
    }

    pub fn correlation_id(&self) -> Option<CorrelationId> {
        match self {
            DispatchOutcome::Submitted { correlation_id, .. }
            | DispatchOutcome::Resolved { correlation_id, .. } => Some(*correlation_id),
            DispatchOutcome::Failed { correlation_id, .. } => *correlation_id,
            DispatchOutcome::InsufficientPayload { .. } | DispatchOutcome::Rows { .. } => None,
        }
    }

    pub fn result(&self) -> Option<&ResultMessage> {
        match self {
            DispatchOutcome::Resolved { result, .. }
            | DispatchOutcome::Rows { result, .. }
            | DispatchOutcome::Failed { result, .. } => Some(result),
            DispatchOutcome::InsufficientPayload { .. } | DispatchOutcome::Submitted { .. } => {
                None
            }
        }
    }

    pub fn status(&self) -> StatusIndication {
        use StatusFill::*;
        use StatusShape::*;

        match self {
            DispatchOutcome::InsufficientPayload { .. } => {
                StatusIndication::new(Red, Dot, "payload data not enough!")
            }
            DispatchOutcome::Submitted { .. } => {
                StatusIndication::new(Yellow, Dot, "sent, awaiting approval")
            }
            DispatchOutcome::Resolved { resolution, .. } => match resolution {
                Resolution::Success => StatusIndication::new(Green, Dot, "done"),
                Resolution::Failure { message } => {
                    StatusIndication::new(Yellow, Dot, format!("done with error: {message}"))
                }
                Resolution::Timeout { window_ms } => StatusIndication::new(
                    Blue,
                    Dot,
                    format!("command not processed in {window_ms} ms"),
                ),
            },
            DispatchOutcome::Rows { .. } => StatusIndication::new(Green, Dot, "done"),
            DispatchOutcome::Failed { result, .. } => {
                let text = result
                    .error
                    .as_ref()
                    .map(|e| e.details.clone())
                    .unwrap_or_else(|| "error".to_string());
                StatusIndication::new(Red, Ring, text)
            }
        }
    }
}

pub type DispatchEvent = EventEnvelope<DispatchOutcome>;

impl EventEnvelope<DispatchOutcome> {
    pub fn status(&self) -> StatusIndication {
        self.payload().status()
    }

    pub fn event_type(&self) -> &'static str {
        self.payload().event_type()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::ErrorReport;
    use serde_json::json;
    use shopfloor_core::CompanyId;
    use uuid::Uuid;

    #[test]
    fn resolution_statuses() {
        let resolved = |resolution| DispatchOutcome::Resolved {
            correlation_id: CorrelationId::new(4),
            resolution,
            result: ResultMessage::default(),
        };

        assert_eq!(resolved(Resolution::Success).status().text, "done");
        assert_eq!(
            resolved(Resolution::Failure {
                message: "no plan".into()
            })
            .status()
            .text,
            "done with error: no plan"
        );
        let timeout = resolved(Resolution::Timeout { window_ms: 2000 }).status();
        assert_eq!(timeout.text, "command not processed in 2000 ms");
        assert_eq!(timeout.fill, StatusFill::Blue);
    }

    #[test]
    fn failed_status_shows_the_error_message() {
        let outcome = DispatchOutcome::Failed {
            correlation_id: None,
            result: ResultMessage::error(ErrorReport::new("ConnectivityError", "socket closed")),
        };
        let status = outcome.status();
        assert_eq!(status.text, "socket closed");
        assert_eq!(status.shape, StatusShape::Ring);
    }

    #[test]
    fn failed_status_includes_the_preceding_backend_error() {
        let report = ErrorReport::new("PersistenceError", "Cannot insert duplicate key")
            .with_preceding(Some("Violation of PRIMARY KEY constraint"));
        let outcome = DispatchOutcome::Failed {
            correlation_id: Some(CorrelationId::new(3)),
            result: ResultMessage::error(report),
        };
        assert_eq!(
            outcome.status().text,
            "Cannot insert duplicate key (Violation of PRIMARY KEY constraint)"
        );
    }

    #[test]
    fn envelope_serializes_tagged_outcome() {
        let request_id = Uuid::now_v7();
        let event = DispatchEvent::new(
            request_id,
            CompanyId::new(1),
            DispatchOutcome::Submitted {
                correlation_id: CorrelationId::new(10),
                mode: "1".into(),
                workstation_id: Some("5".into()),
            },
        );

        assert_eq!(event.request_id(), request_id);
        assert_eq!(event.event_type(), "dispatch.submitted");
        assert_eq!(event.payload().correlation_id(), Some(CorrelationId::new(10)));

        let v = serde_json::to_value(&event).unwrap();
        assert_eq!(v["payload"]["type"], json!("submitted"));
        assert_eq!(v["payload"]["correlation_id"], json!(10));
    }
}
