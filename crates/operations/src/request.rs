//! Inbound terminal requests.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::mode::FieldName;

/// Raw request as received from a terminal: `{WorkstationId, operationMode, ...}`.
///
/// Values are kept exactly as sent; the validator decides which of them are
/// usable and the command payload echoes them verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationRequest {
    fields: Map<String, JsonValue>,
}

pub const OPERATION_MODE_KEY: &str = "operationMode";

impl OperationRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from any JSON value; non-objects yield an empty request.
    pub fn from_json(value: JsonValue) -> Self {
        match value {
            JsonValue::Object(fields) => Self { fields },
            _ => Self::default(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Replace the requested mode code (used for configured mode overrides).
    pub fn with_mode(self, code: &str) -> Self {
        self.with(OPERATION_MODE_KEY, code)
    }

    /// Mode code as text; numeric codes are accepted too.
    pub fn operation_mode(&self) -> Option<String> {
        match self.fields.get(OPERATION_MODE_KEY)? {
            JsonValue::String(s) => Some(s.clone()),
            JsonValue::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn get(&self, field: FieldName) -> Option<&JsonValue> {
        self.fields.get(field.as_str())
    }

    /// Field value when it counts as present; see [`is_truthy`].
    pub fn present(&self, field: FieldName) -> Option<&JsonValue> {
        self.get(field).filter(|v| is_truthy(v))
    }
}

/// Presence rule used by upstream callers: `null`, `false`, `0` and `""` count
/// as missing. `"0"` is a non-empty string and counts as present.
pub fn is_truthy(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => false,
        JsonValue::Bool(b) => *b,
        JsonValue::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        JsonValue::String(s) => !s.is_empty(),
        JsonValue::Array(_) | JsonValue::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn falsy_values() {
        for v in [json!(null), json!(false), json!(0), json!(0.0), json!(-0.0), json!("")] {
            assert!(!is_truthy(&v), "{v} should be falsy");
        }
    }

    #[test]
    fn truthy_values() {
        for v in [json!("0"), json!(1), json!(-3), json!(0.5), json!(true), json!([]), json!({})] {
            assert!(is_truthy(&v), "{v} should be truthy");
        }
    }

    #[test]
    fn operation_mode_accepts_strings_and_numbers() {
        let r = OperationRequest::new().with("operationMode", "16");
        assert_eq!(r.operation_mode().as_deref(), Some("16"));

        let r = OperationRequest::new().with("operationMode", 100);
        assert_eq!(r.operation_mode().as_deref(), Some("100"));

        let r = OperationRequest::new().with("operationMode", json!(null));
        assert_eq!(r.operation_mode(), None);
    }

    #[test]
    fn request_deserializes_from_terminal_json() {
        let r: OperationRequest =
            serde_json::from_value(json!({"WorkstationId": "5", "PlanId": "9", "operationMode": "1"}))
                .unwrap();
        assert_eq!(r.present(FieldName::PlanId), Some(&json!("9")));
        assert_eq!(r.present(FieldName::EmployeeId), None);
    }

    #[test]
    fn with_mode_overrides_requested_mode() {
        let r = OperationRequest::new().with("operationMode", "1").with_mode("100");
        assert_eq!(r.operation_mode().as_deref(), Some("100"));
    }
}
