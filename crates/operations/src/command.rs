//! Command payloads and the envelope handed to the queue writer.
//!
//! Field names and order are part of the wire contract with the backend
//! consumer: each variant serializes to exactly the object the consumer reads,
//! e.g. `{"WorkstationId":"5","PlanId":"9"}`.

use serde::Serialize;
use serde_json::Value as JsonValue;

use shopfloor_core::WorkstationId;

use crate::mode::OperationMode;

/// Typed command payload, one variant per operation mode.
///
/// Identifier values are the terminal's JSON values, echoed verbatim.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Command {
    LoadJobPlan {
        #[serde(rename = "WorkstationId")]
        workstation_id: JsonValue,
        #[serde(rename = "PlanId")]
        plan_id: JsonValue,
    },
    FinishProduction {
        #[serde(rename = "WorkstationId")]
        workstation_id: JsonValue,
        #[serde(rename = "Quantity")]
        quantity: i64,
        #[serde(rename = "ReferenceQuantityType")]
        reference_quantity_type: i64,
        #[serde(rename = "IsQuantityApproved")]
        is_quantity_approved: bool,
    },
    /// Start/change stoppage and start test mode.
    Stoppage {
        #[serde(rename = "WorkstationId")]
        workstation_id: JsonValue,
        #[serde(rename = "StoppageCauseId")]
        stoppage_cause_id: JsonValue,
    },
    /// Login/logout employee.
    Employee {
        #[serde(rename = "WorkstationId")]
        workstation_id: JsonValue,
        #[serde(rename = "EmployeeId")]
        employee_id: JsonValue,
    },
    ShiftedShift {
        #[serde(rename = "WorkstationId")]
        workstation_id: JsonValue,
        #[serde(rename = "LineId")]
        line_id: JsonValue,
    },
    CreateDefect {
        #[serde(rename = "WorkstationId")]
        workstation_id: JsonValue,
        #[serde(rename = "DefectId")]
        defect_id: JsonValue,
        #[serde(rename = "StockId")]
        stock_id: JsonValue,
        #[serde(rename = "Quantity")]
        quantity: JsonValue,
        #[serde(rename = "ReferenceQuantityType")]
        reference_quantity_type: i64,
    },
    /// Finish stoppage, finish test mode and the workstation-scoped reads.
    Workstation {
        #[serde(rename = "WorkstationId")]
        workstation_id: JsonValue,
    },
    /// Workstation listing: `{}`.
    Empty {},
}

impl Command {
    /// Serialize in wire order (a `serde_json::Value` would sort the keys).
    pub fn to_wire(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Validated command, ready for either the queue writer (write modes) or the
/// filter composer (read modes).
///
/// Only the validator builds envelopes, so a rejected payload can never reach
/// the queue.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandEnvelope {
    workstation_id: Option<WorkstationId>,
    mode: OperationMode,
    command: Command,
    command_json: String,
}

impl CommandEnvelope {
    pub(crate) fn new(
        workstation_id: Option<WorkstationId>,
        mode: OperationMode,
        command: Command,
    ) -> Result<Self, serde_json::Error> {
        let command_json = command.to_wire()?;
        Ok(Self {
            workstation_id,
            mode,
            command,
            command_json,
        })
    }

    /// `None` only for the workstation listing when the terminal sent no id.
    pub fn workstation_id(&self) -> Option<&WorkstationId> {
        self.workstation_id.as_ref()
    }

    pub fn mode(&self) -> OperationMode {
        self.mode
    }

    pub fn command(&self) -> &Command {
        &self.command
    }

    /// Serialized command payload as stored in the queue's `COMMAND` column.
    pub fn command_json(&self) -> &str {
        &self.command_json
    }

    pub fn is_read(&self) -> bool {
        self.mode.is_read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn field_order_matches_wire_contract() {
        let cmd = Command::CreateDefect {
            workstation_id: json!("5"),
            defect_id: json!("3"),
            stock_id: json!("77"),
            quantity: json!(2),
            reference_quantity_type: 0,
        };
        assert_eq!(
            cmd.to_wire().unwrap(),
            r#"{"WorkstationId":"5","DefectId":"3","StockId":"77","Quantity":2,"ReferenceQuantityType":0}"#
        );
    }

    #[test]
    fn finish_production_carries_fixed_fields() {
        let cmd = Command::FinishProduction {
            workstation_id: json!("8"),
            quantity: 0,
            reference_quantity_type: 0,
            is_quantity_approved: false,
        };
        assert_eq!(
            cmd.to_wire().unwrap(),
            r#"{"WorkstationId":"8","Quantity":0,"ReferenceQuantityType":0,"IsQuantityApproved":false}"#
        );
    }

    #[test]
    fn empty_command_is_an_empty_object() {
        assert_eq!(Command::Empty {}.to_wire().unwrap(), "{}");
    }
}
