//! Job-plan listing switches.

use serde::{Deserialize, Serialize};

/// Independent switches for the job-plan listing (mode 100).
///
/// Set once at configuration time; every switch defaults to off.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Only plans whose start date is now or later.
    pub show_only_upcoming: bool,
    /// Only plans whose start date is now or earlier.
    pub show_only_past: bool,
    /// Widen the scope to every station sharing the requesting station's group code.
    pub scope_by_same_station_group: bool,
    /// Widen the scope to every station sharing the requesting station's work center.
    /// Ignored when `scope_by_same_station_group` is set.
    pub scope_by_same_work_center: bool,
    /// Keep plans whose produced quantity already meets the target.
    pub ignore_quantity_exhausted: bool,
    /// Line production: also require this station's own receipts to be below target.
    pub line_production_finish_on_complete: bool,
    /// Require the predecessor operation to have been worked on.
    pub gate_previous_operation_working: bool,
    /// Require the predecessor operation to have produced quantity.
    pub gate_previous_operation_production: bool,
}

/// Which stations a job-plan listing covers.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkstationScope {
    Single,
    StationGroup,
    WorkCenter,
}

/// Which predecessor condition gates a plan.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredecessorGate {
    Working,
    Production,
    /// Either condition is enough.
    WorkingOrProduction,
}

impl FilterConfig {
    pub fn scope(&self) -> WorkstationScope {
        if self.scope_by_same_station_group {
            WorkstationScope::StationGroup
        } else if self.scope_by_same_work_center {
            WorkstationScope::WorkCenter
        } else {
            WorkstationScope::Single
        }
    }

    pub fn predecessor_gate(&self) -> Option<PredecessorGate> {
        match (
            self.gate_previous_operation_working,
            self.gate_previous_operation_production,
        ) {
            (true, true) => Some(PredecessorGate::WorkingOrProduction),
            (true, false) => Some(PredecessorGate::Working),
            (false, true) => Some(PredecessorGate::Production),
            (false, false) => None,
        }
    }
}
