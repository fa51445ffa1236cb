//! Outbound result shape: `{payload: Rows[], error?: {message, code, ...}}`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// One backend row, column name to value.
pub type Row = Map<String, JsonValue>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultMessage {
    pub payload: Vec<Row>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorReport>,
}

impl ResultMessage {
    pub fn rows(payload: Vec<Row>) -> Self {
        Self {
            payload,
            error: None,
        }
    }

    pub fn error(report: ErrorReport) -> Self {
        Self {
            payload: Vec::new(),
            error: Some(report),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Diagnostic details of a surfaced backend error.
///
/// Fields the backend did not supply stay `None` and are omitted on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReport {
    pub message: String,
    /// `message`, followed by the preceding backend error in parentheses when there was one.
    pub details: String,
    /// Error family, e.g. `"PersistenceError"`.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_number: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proc_name: Option<String>,
}

impl ErrorReport {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            details: message.clone(),
            message,
            name: name.into(),
            ..Self::default()
        }
    }

    /// Append the preceding backend error to `details`.
    pub fn with_preceding(mut self, preceding: Option<&str>) -> Self {
        if let Some(prev) = preceding.filter(|p| !p.is_empty()) {
            self.details = format!("{} ({prev})", self.message);
        }
        self
    }
}
