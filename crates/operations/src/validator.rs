//! Payload validation: raw terminal request → [`CommandEnvelope`].
//!
//! A field counts as present only when it is truthy (see
//! [`is_truthy`](crate::request::is_truthy)). This means a defect report with
//! `Quantity: 0` is rejected as insufficient; terminals rely on that behaviour,
//! so it is kept as is.

use serde_json::Value as JsonValue;
use thiserror::Error;

use shopfloor_core::WorkstationId;

use crate::command::{Command, CommandEnvelope};
use crate::mode::{FieldName, OperationMode};
use crate::request::OperationRequest;

/// Why a payload was not turned into a command.
///
/// Reported to the terminal as "insufficient payload"; never reaches the backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationFailure {
    #[error("request carries no operation mode")]
    MissingMode,

    #[error("unknown operation mode: {0:?}")]
    UnknownMode(String),

    #[error("operation mode {mode} requires {field}")]
    MissingField {
        mode: &'static str,
        field: FieldName,
    },

    #[error("command payload could not be encoded: {0}")]
    Encoding(String),
}

/// Validate a request using the mode code it carries.
pub fn validate(request: &OperationRequest) -> Result<CommandEnvelope, ValidationFailure> {
    let code = request
        .operation_mode()
        .ok_or(ValidationFailure::MissingMode)?;
    let mode = code.parse::<OperationMode>()?;
    validate_as(mode, request)
}

/// Validate a request against an already-resolved mode.
pub fn validate_as(
    mode: OperationMode,
    request: &OperationRequest,
) -> Result<CommandEnvelope, ValidationFailure> {
    for &field in mode.required_fields() {
        if request.present(field).is_none() {
            return Err(ValidationFailure::MissingField {
                mode: mode.code(),
                field,
            });
        }
    }

    let value = |field: FieldName| request.present(field).cloned().unwrap_or(JsonValue::Null);
    let ws = value(FieldName::WorkstationId);

    let command = match mode {
        OperationMode::LoadJobPlan => Command::LoadJobPlan {
            workstation_id: ws.clone(),
            plan_id: value(FieldName::PlanId),
        },
        OperationMode::FinishProduction => Command::FinishProduction {
            workstation_id: ws.clone(),
            quantity: 0,
            reference_quantity_type: 0,
            is_quantity_approved: false,
        },
        OperationMode::StartStoppage
        | OperationMode::ChangeStoppage
        | OperationMode::StartTestMode => Command::Stoppage {
            workstation_id: ws.clone(),
            stoppage_cause_id: value(FieldName::StoppageCauseId),
        },
        OperationMode::LoginEmployee | OperationMode::LogoutEmployee => Command::Employee {
            workstation_id: ws.clone(),
            employee_id: value(FieldName::EmployeeId),
        },
        OperationMode::ShiftedShift => Command::ShiftedShift {
            workstation_id: ws.clone(),
            line_id: value(FieldName::LineId),
        },
        OperationMode::CreateDefect => Command::CreateDefect {
            workstation_id: ws.clone(),
            defect_id: value(FieldName::DefectId),
            stock_id: value(FieldName::StockId),
            quantity: value(FieldName::Quantity),
            reference_quantity_type: 0,
        },
        OperationMode::FinishStoppage
        | OperationMode::FinishTestMode
        | OperationMode::ListJobPlans
        | OperationMode::ListStoppageCauses
        | OperationMode::StationStatus => Command::Workstation {
            workstation_id: ws.clone(),
        },
        OperationMode::ListWorkstations => Command::Empty {},
    };

    let workstation_id = request
        .present(FieldName::WorkstationId)
        .map(|v| WorkstationId::from_json(v).unwrap_or_else(|| WorkstationId::new(v.to_string())));

    CommandEnvelope::new(workstation_id, mode, command)
        .map_err(|e| ValidationFailure::Encoding(e.to_string()))
}
