//! Read-query composition for terminal read modes (100 to 103).
//!
//! Every statement is parameterised: company, period and workstation travel as
//! named parameters, never as SQL text.

pub mod filter;
pub mod job_plans;
pub mod predicate;
pub mod query;
pub mod templates;

use thiserror::Error;

use shopfloor_core::{CompanyId, PeriodId, WorkstationId};
use shopfloor_operations::OperationMode;

pub use filter::{FilterConfig, PredecessorGate, WorkstationScope};
pub use job_plans::{job_plan_predicates, job_plans_statement};
pub use predicate::{Clause, ClauseKey, PredicateBuilder};
pub use query::{Param, Query, SqlValue, StatementKind, params};

/// Values a read query is bound against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadContext {
    pub company_id: CompanyId,
    pub period_id: PeriodId,
    pub workstation_id: Option<WorkstationId>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ComposeError {
    #[error("operation mode {0} is not a read mode")]
    NotAReadMode(&'static str),

    #[error("operation mode {0} requires a workstation")]
    MissingWorkstation(&'static str),
}

/// Build the bound statement answering a read mode.
pub fn compose_read_query(
    mode: OperationMode,
    config: &FilterConfig,
    ctx: &ReadContext,
) -> Result<Query, ComposeError> {
    let statement = match mode {
        OperationMode::ListJobPlans => job_plans::job_plans_statement(config)
            .bind(params::PERIOD_ID, ctx.period_id),
        OperationMode::ListStoppageCauses => templates::stoppage_causes_statement(),
        OperationMode::ListWorkstations => {
            return Ok(templates::workstations_statement().bind(params::COMPANY_ID, ctx.company_id));
        }
        OperationMode::StationStatus => templates::station_status_statement(),
        other => return Err(ComposeError::NotAReadMode(other.code())),
    };

    let workstation = ctx
        .workstation_id
        .as_ref()
        .ok_or(ComposeError::MissingWorkstation(mode.code()))?;

    Ok(statement
        .bind(params::COMPANY_ID, ctx.company_id)
        .bind(params::WORKSTATION_ID, workstation))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(ws: Option<&str>) -> ReadContext {
        ReadContext {
            company_id: CompanyId::new(1),
            period_id: PeriodId::new(2024),
            workstation_id: ws.map(WorkstationId::new),
        }
    }

    #[test]
    fn job_plans_bind_company_period_and_station() {
        let q = compose_read_query(
            OperationMode::ListJobPlans,
            &FilterConfig::default(),
            &ctx(Some("5")),
        )
        .unwrap();

        assert_eq!(q.kind, StatementKind::JobPlans);
        assert_eq!(q.param(params::COMPANY_ID), Some(&SqlValue::Int(1)));
        assert_eq!(q.param(params::PERIOD_ID), Some(&SqlValue::Int(2024)));
        assert_eq!(q.param(params::WORKSTATION_ID), Some(&SqlValue::Int(5)));
    }

    #[test]
    fn workstation_listing_needs_only_the_company() {
        let q = compose_read_query(
            OperationMode::ListWorkstations,
            &FilterConfig::default(),
            &ctx(None),
        )
        .unwrap();
        assert_eq!(q.kind, StatementKind::Workstations);
        assert_eq!(q.params.len(), 1);
    }

    #[test]
    fn station_scoped_reads_require_a_workstation() {
        for mode in [
            OperationMode::ListJobPlans,
            OperationMode::ListStoppageCauses,
            OperationMode::StationStatus,
        ] {
            assert_eq!(
                compose_read_query(mode, &FilterConfig::default(), &ctx(None)),
                Err(ComposeError::MissingWorkstation(mode.code()))
            );
        }
    }

    #[test]
    fn write_modes_are_not_composed() {
        assert_eq!(
            compose_read_query(
                OperationMode::LoadJobPlan,
                &FilterConfig::default(),
                &ctx(Some("5"))
            ),
            Err(ComposeError::NotAReadMode("1"))
        );
    }
}
