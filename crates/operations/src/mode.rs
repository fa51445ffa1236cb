//! Mode registry: the fixed set of operation modes a terminal may request.
//!
//! Codes are the backend's `COMMANDTYPE` values. Write modes are queued for the
//! machine-control backend; read modes are answered directly from the database.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Whether a mode is queued for the backend or answered by a read query.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeKind {
    Write,
    Read,
}

/// Payload fields a mode may require.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldName {
    WorkstationId,
    PlanId,
    StoppageCauseId,
    EmployeeId,
    LineId,
    DefectId,
    StockId,
    Quantity,
}

impl FieldName {
    /// Key used in terminal payloads and in command JSON.
    pub fn as_str(self) -> &'static str {
        match self {
            FieldName::WorkstationId => "WorkstationId",
            FieldName::PlanId => "PlanId",
            FieldName::StoppageCauseId => "StoppageCauseId",
            FieldName::EmployeeId => "EmployeeId",
            FieldName::LineId => "LineId",
            FieldName::DefectId => "DefectId",
            FieldName::StockId => "StockId",
            FieldName::Quantity => "Quantity",
        }
    }
}

impl core::fmt::Display for FieldName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed set of operation modes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationMode {
    LoadJobPlan,
    FinishProduction,
    StartStoppage,
    ChangeStoppage,
    FinishStoppage,
    LoginEmployee,
    LogoutEmployee,
    ShiftedShift,
    StartTestMode,
    FinishTestMode,
    CreateDefect,
    ListJobPlans,
    ListStoppageCauses,
    ListWorkstations,
    StationStatus,
}

use FieldName::{
    DefectId, EmployeeId, LineId, PlanId, Quantity, StockId, StoppageCauseId, WorkstationId,
};

impl OperationMode {
    pub const ALL: [OperationMode; 15] = [
        OperationMode::LoadJobPlan,
        OperationMode::FinishProduction,
        OperationMode::StartStoppage,
        OperationMode::ChangeStoppage,
        OperationMode::FinishStoppage,
        OperationMode::LoginEmployee,
        OperationMode::LogoutEmployee,
        OperationMode::ShiftedShift,
        OperationMode::StartTestMode,
        OperationMode::FinishTestMode,
        OperationMode::CreateDefect,
        OperationMode::ListJobPlans,
        OperationMode::ListStoppageCauses,
        OperationMode::ListWorkstations,
        OperationMode::StationStatus,
    ];

    /// Backend command-type code.
    pub fn code(self) -> &'static str {
        match self {
            OperationMode::LoadJobPlan => "1",
            OperationMode::FinishProduction => "4",
            OperationMode::StartStoppage => "5",
            OperationMode::ChangeStoppage => "6",
            OperationMode::FinishStoppage => "7",
            OperationMode::LoginEmployee => "9",
            OperationMode::LogoutEmployee => "10",
            OperationMode::ShiftedShift => "13",
            OperationMode::StartTestMode => "14",
            OperationMode::FinishTestMode => "15",
            OperationMode::CreateDefect => "16",
            OperationMode::ListJobPlans => "100",
            OperationMode::ListStoppageCauses => "101",
            OperationMode::ListWorkstations => "102",
            OperationMode::StationStatus => "103",
        }
    }

    /// Numeric form of [`code`](Self::code), bound as `COMMANDTYPE`.
    pub fn command_type(self) -> i32 {
        match self {
            OperationMode::LoadJobPlan => 1,
            OperationMode::FinishProduction => 4,
            OperationMode::StartStoppage => 5,
            OperationMode::ChangeStoppage => 6,
            OperationMode::FinishStoppage => 7,
            OperationMode::LoginEmployee => 9,
            OperationMode::LogoutEmployee => 10,
            OperationMode::ShiftedShift => 13,
            OperationMode::StartTestMode => 14,
            OperationMode::FinishTestMode => 15,
            OperationMode::CreateDefect => 16,
            OperationMode::ListJobPlans => 100,
            OperationMode::ListStoppageCauses => 101,
            OperationMode::ListWorkstations => 102,
            OperationMode::StationStatus => 103,
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim();
        Self::ALL.into_iter().find(|m| m.code() == code)
    }

    pub fn kind(self) -> ModeKind {
        match self {
            OperationMode::ListJobPlans
            | OperationMode::ListStoppageCauses
            | OperationMode::ListWorkstations
            | OperationMode::StationStatus => ModeKind::Read,
            _ => ModeKind::Write,
        }
    }

    pub fn is_read(self) -> bool {
        self.kind() == ModeKind::Read
    }

    /// Fields that must be present (truthy) for the payload to be accepted.
    pub fn required_fields(self) -> &'static [FieldName] {
        match self {
            OperationMode::LoadJobPlan => &[WorkstationId, PlanId],
            OperationMode::FinishProduction => &[WorkstationId],
            OperationMode::StartStoppage | OperationMode::ChangeStoppage => {
                &[WorkstationId, StoppageCauseId]
            }
            OperationMode::FinishStoppage => &[WorkstationId],
            OperationMode::LoginEmployee | OperationMode::LogoutEmployee => {
                &[WorkstationId, EmployeeId]
            }
            OperationMode::ShiftedShift => &[WorkstationId, LineId],
            OperationMode::StartTestMode => &[WorkstationId, StoppageCauseId],
            OperationMode::FinishTestMode => &[WorkstationId],
            OperationMode::CreateDefect => &[WorkstationId, DefectId, StockId, Quantity],
            OperationMode::ListJobPlans => &[WorkstationId],
            OperationMode::ListStoppageCauses => &[WorkstationId],
            OperationMode::ListWorkstations => &[],
            OperationMode::StationStatus => &[WorkstationId],
        }
    }

    /// Human-readable name, used in logs and status text.
    pub fn label(self) -> &'static str {
        match self {
            OperationMode::LoadJobPlan => "load job plan",
            OperationMode::FinishProduction => "finish production",
            OperationMode::StartStoppage => "start stoppage",
            OperationMode::ChangeStoppage => "change stoppage",
            OperationMode::FinishStoppage => "finish stoppage",
            OperationMode::LoginEmployee => "login employee",
            OperationMode::LogoutEmployee => "logout employee",
            OperationMode::ShiftedShift => "shifted shift",
            OperationMode::StartTestMode => "start test mode",
            OperationMode::FinishTestMode => "finish test mode",
            OperationMode::CreateDefect => "create defect",
            OperationMode::ListJobPlans => "list open job plans",
            OperationMode::ListStoppageCauses => "list stoppage causes",
            OperationMode::ListWorkstations => "list workstations",
            OperationMode::StationStatus => "station status",
        }
    }
}

impl core::fmt::Display for OperationMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for OperationMode {
    type Err = crate::validator::ValidationFailure;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s).ok_or_else(|| crate::validator::ValidationFailure::UnknownMode(s.to_string()))
    }
}

/// Extract the mode code from a configured mode option (`"<code>|<label>"`).
///
/// Returns `None` when the option carries no `|`, in which case the request's own
/// `operationMode` stands. Older terminal flows forced mode `1` in that case;
/// this one does not.
pub fn mode_override(option: &str) -> Option<&str> {
    let (code, _label) = option.split_once('|')?;
    Some(code.trim())
}
