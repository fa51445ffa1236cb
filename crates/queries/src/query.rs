//! Parameterised statements handed to the backend.
//!
//! Values never get spliced into SQL text; each statement names its
//! parameters (`@companyId`, `@workstationId`, ...) and carries their values.

use serde::{Deserialize, Serialize};

use shopfloor_core::{CompanyId, CorrelationId, PeriodId, UserId, WorkstationId};

/// Which statement a [`Query`] is; used for logging and by simulated backends.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    AllocateCorrelationId,
    InsertQueueRecord,
    SelectResponse,
    JobPlans,
    StoppageCauses,
    Workstations,
    StationStatus,
}

impl StatementKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StatementKind::AllocateCorrelationId => "allocate_correlation_id",
            StatementKind::InsertQueueRecord => "insert_queue_record",
            StatementKind::SelectResponse => "select_response",
            StatementKind::JobPlans => "job_plans",
            StatementKind::StoppageCauses => "stoppage_causes",
            StatementKind::Workstations => "workstations",
            StatementKind::StationStatus => "station_status",
        }
    }
}

impl core::fmt::Display for StatementKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bound parameter value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SqlValue {
    Int(i64),
    Text(String),
    Null,
}

impl SqlValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::Int(v) => Some(*v),
            SqlValue::Text(s) => s.trim().parse().ok(),
            SqlValue::Null => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SqlValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int(value)
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        SqlValue::Int(value.into())
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

macro_rules! int_id_value {
    ($($t:ty),*) => {
        $(impl From<$t> for SqlValue {
            fn from(value: $t) -> Self {
                SqlValue::Int(value.get())
            }
        })*
    };
}

int_id_value!(CompanyId, PeriodId, UserId, CorrelationId);

/// Numeric workstation ids bind as integers; anything else is left for the
/// backend to reject.
impl From<&WorkstationId> for SqlValue {
    fn from(value: &WorkstationId) -> Self {
        match value.as_i64() {
            Some(n) => SqlValue::Int(n),
            None => SqlValue::Text(value.as_str().to_string()),
        }
    }
}

/// Named parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Param {
    pub name: &'static str,
    pub value: SqlValue,
}

/// A statement ready for execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Query {
    pub kind: StatementKind,
    pub sql: String,
    pub params: Vec<Param>,
}

impl Query {
    pub fn new(kind: StatementKind, sql: impl Into<String>) -> Self {
        Self {
            kind,
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Bind `value` to `@name`; re-binding a name replaces its value.
    pub fn bind(mut self, name: &'static str, value: impl Into<SqlValue>) -> Self {
        let value = value.into();
        match self.params.iter_mut().find(|p| p.name == name) {
            Some(p) => p.value = value,
            None => self.params.push(Param { name, value }),
        }
        self
    }

    pub fn param(&self, name: &str) -> Option<&SqlValue> {
        self.params.iter().find(|p| p.name == name).map(|p| &p.value)
    }
}

pub mod params {
    pub const COMPANY_ID: &str = "companyId";
    pub const PERIOD_ID: &str = "periodId";
    pub const WORKSTATION_ID: &str = "workstationId";
    pub const USER_ID: &str = "userId";
    pub const COMMAND_ID: &str = "commandId";
    pub const COMMAND_TYPE: &str = "commandType";
    pub const COMMAND: &str = "command";
}
