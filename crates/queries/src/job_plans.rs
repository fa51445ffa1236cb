//! Open job-plan listing (mode 100).
//!
//! The projection (column list and joins) is fixed; the WHERE clause is built
//! from [`FilterConfig`] one fragment per switch, in this order:
//!
//! 1. company and workstation scope
//! 2. base predicate: released plan item, not cancelled, not planned maintenance, has a parent job
//! 3. start date in the future / in the past
//! 4. remaining quantity (unless disabled)
//! 5. line production: this station's own receipts below target
//! 6. predecessor operation gate
//!
//! Results are ordered by start date, then by manual sort key falling back to plan id.

use crate::filter::{FilterConfig, PredecessorGate, WorkstationScope};
use crate::predicate::{ClauseKey, PredicateBuilder};
use crate::query::{Query, StatementKind};

/// `PTASKSID` reserved for planned maintenance tasks.
pub const MAINTENANCE_TASK_ID: i64 = 99;
/// `PIDSTATUS` of a cancelled plan.
pub const CANCELLED_STATUS: i64 = 3;
/// `PIDSTATUS` of a released plan item.
pub const RELEASED_STATUS: i64 = 2;

const PROJECTION: &str = r#"SELECT ROW_NUMBER() OVER(ORDER BY A.SORTID ASC) AS SEQUENCENO,
  A.PWORKSTATIONID, PW.PWORKSTATIONNO, A.SORTID, A.PID, A.DESCRIPTION, A.WORKSTARTDATE, A.PSTOPCAUSEID,
  A.SETUPDURATION, A.EMPDURATION, A.SPEED, A.PJOBORDERID, PJB.PROORDERSNO, PJB.TRANSCODE, A.PEQUIPMENTID,
  PE.PEQUIPMENTNO, A.DURATION, A.FPLANSTARTDATE, A.REQWORKEMPCOUNT, A.ITEMNO, A.PLANSHIFT, A.PLANWEEK,
  A.PLANDAY, A.PRIORITY, A.STOCKID, A.CAPACITY, A.CYCLEUNIT, A.PPROTREEID, A.PPROTREEITEMID,
  A.PRODUCTNUMBER, A.PRODUCTNUMBER1, A.NOTES, DATEPART(WEEK, A.STARTDATE) HAFTA,
  PJB.PJOBORDERGROUPNO, PJB.PJOBORDERGROUPORDERNO, PJB.RECEIPTNO,
  (SELECT TOP 1 B.STOCKNO FROM VE_PPRODUCTPLANITEM B (NOLOCK) WHERE A.COMPANYID = B.COMPANYID AND A.PID = B.PID) STOCKNO,
  (SELECT TOP 1 B.STOCKNAME FROM VE_PPRODUCTPLANITEM B (NOLOCK) WHERE A.COMPANYID = B.COMPANYID AND A.PID = B.PID) STOCKNAME,
  A.CYCLEPERIOD, A.CYCLEOFCOE, A.CYCLEOFPULSE, A.STARTDATE, A.GROUPCODE, A.SPECCODE1, A.SPECCODE2,
  A.QUANTITY ORJQTY, A.QUANTITY2 ORJQTY2, A.QUANTITY3 ORJQTY3, A.PQUANTITY, A.PQUANTITY2, A.PQUANTITY3,
  A.QUANTITY - A.PQUANTITY QUANTITY, A.QUANTITY2 - A.PQUANTITY2 QUANTITY2, A.QUANTITY3 - A.PQUANTITY3 QUANTITY3,
  (SELECT B.RECEIPTNO FROM PJOBORDERPROT B (NOLOCK)
    WHERE B.COMPANYID = @companyId AND B.CPERIODID = @periodId
      AND B.RECEIPTID = (SELECT TOP 1 I.PJOBORDERID FROM PPRODUCTPLANITEM I (NOLOCK) WHERE I.COMPANYID = @companyId AND I.PID = A.PID)) AS PORDERNO,
  A.PPROCESSID, P.PPROCESSNO, P.PPROCESSNAME,
  ISNULL((SELECT O.PORDERSNO FROM PORDERS O (NOLOCK)
    WHERE O.COMPANYID = A.COMPANYID AND O.CPERIODID = @periodId
      AND O.PORDERSID = (SELECT J.PORDERSID FROM PJOBORDERPROT J WHERE J.COMPANYID = A.COMPANYID AND J.CPERIODID = @periodId AND J.RECEIPTID = A.PJOBORDERID)), '') AS URESIPBILGI,
  '' AS SIPBILGI
FROM PPRODUCTPLANWS A (NOLOCK)
LEFT JOIN PPROCESS P ON A.COMPANYID = P.COMPANYID AND A.PPROCESSID = P.PPROCESSID
LEFT JOIN PEQUIPMENT PE ON A.COMPANYID = PE.COMPANYID AND A.PEQUIPMENTID = PE.PEQUIPMENTID
LEFT JOIN PWORKSTATION PW ON A.COMPANYID = PW.COMPANYID AND A.PWORKSTATIONID = PW.PWORKSTATIONID
LEFT JOIN PJOBORDERPROT PJB ON A.COMPANYID = PJB.COMPANYID AND A.PJOBORDERID = PJB.RECEIPTID"#;

const ORDER_BY: &str = "ORDER BY A.STARTDATE, ISNULL(A.SORTID, A.PID)";

fn scope_clause(scope: WorkstationScope) -> String {
    match scope {
        WorkstationScope::Single => "A.PWORKSTATIONID = @workstationId".to_string(),
        WorkstationScope::StationGroup => "A.PWORKSTATIONID IN (SELECT W.PWORKSTATIONID FROM PWORKSTATION W (NOLOCK) \
             WHERE W.COMPANYID = @companyId \
             AND W.GROUPCODE = (SELECT G.GROUPCODE FROM PWORKSTATION G WHERE G.COMPANYID = @companyId AND G.PWORKSTATIONID = @workstationId))"
            .to_string(),
        WorkstationScope::WorkCenter => "A.PWORKSTATIONID IN (SELECT W.PWORKSTATIONID FROM PWORKSTATION W (NOLOCK) \
             WHERE W.COMPANYID = @companyId \
             AND W.PWORKCENTERID = (SELECT C.PWORKCENTERID FROM PWORKSTATION C WHERE C.COMPANYID = @companyId AND C.PWORKSTATIONID = @workstationId))"
            .to_string(),
    }
}

const PREDECESSOR_PRODUCED: &str = "CASE WHEN PJB.PPARENTID != 0 \
     THEN (SELECT SUM(ISNULL(R.QUANTITY, 0)) FROM PRECEIPTOT R (NOLOCK) WHERE R.COMPANYID = PJB.COMPANYID AND R.PJOBORDERID = PJB.PPARENTID) \
     ELSE 1 END > 0";

const PREDECESSOR_WORKED: &str = "EXISTS (SELECT 1 FROM PWSSTATUS S WITH (NOLOCK) \
     INNER JOIN PPRODUCTPLANITEM I WITH (NOLOCK) ON I.COMPANYID = S.COMPANYID AND I.PID = S.PJOBID \
     WHERE S.COMPANYID = A.COMPANYID AND I.PJOBORDERID = PJB.PPARENTID)";

fn predecessor_clause(gate: PredecessorGate) -> String {
    match gate {
        PredecessorGate::Production => format!("({PREDECESSOR_PRODUCED})"),
        PredecessorGate::Working => PREDECESSOR_WORKED.to_string(),
        PredecessorGate::WorkingOrProduction => {
            format!("(({PREDECESSOR_PRODUCED}) OR {PREDECESSOR_WORKED})")
        }
    }
}

/// WHERE clause of the job-plan listing for `config`.
pub fn job_plan_predicates(config: &FilterConfig) -> PredicateBuilder {
    PredicateBuilder::new()
        .push(ClauseKey::Company, "A.COMPANYID = @companyId")
        .push(ClauseKey::WorkstationScope, scope_clause(config.scope()))
        .push(
            ClauseKey::ReleasedPlanItem,
            format!(
                "A.PID IN (SELECT W.PID FROM PPRODUCTPLANWS W, PPRODUCTPLANITEM I, STOCK S (NOLOCK) \
                 WHERE W.COMPANYID = I.COMPANYID AND W.PID = I.PID AND W.PIDSTATUS = {RELEASED_STATUS} \
                 AND I.COMPANYID = S.COMPANYID AND I.STOCKID = S.STOCKID)"
            ),
        )
        .push(ClauseKey::NotCancelled, format!("A.PIDSTATUS <> {CANCELLED_STATUS}"))
        .push(
            ClauseKey::NotMaintenance,
            format!("ISNULL(A.PTASKSID, 0) != {MAINTENANCE_TASK_ID}"),
        )
        .push(ClauseKey::HasParentJob, "ISNULL(A.PPARENTID, 0) > 0")
        .push_if(config.show_only_upcoming, ClauseKey::StartsInFuture, || {
            "A.STARTDATE >= GETDATE()".to_string()
        })
        .push_if(config.show_only_past, ClauseKey::StartedInPast, || {
            "A.STARTDATE <= GETDATE()".to_string()
        })
        .push_if(!config.ignore_quantity_exhausted, ClauseKey::QuantityRemaining, || {
            "A.QUANTITY - A.PQUANTITY > 0".to_string()
        })
        .push_if(
            config.line_production_finish_on_complete,
            ClauseKey::LineQuantityRemaining,
            || {
                "(A.QUANTITY - (SELECT ISNULL(SUM(R.QUANTITY), 0) FROM PRECEIPTOT R WITH (NOLOCK) \
                 WHERE R.COMPANYID = A.COMPANYID AND R.PID = A.PID AND R.PWORKSTATIONID = @workstationId)) > 0"
                    .to_string()
            },
        )
        .push_opt(
            ClauseKey::PredecessorGate,
            config.predecessor_gate().map(predecessor_clause),
        )
}

/// Full job-plan listing statement (parameters are bound by the caller).
pub fn job_plans_statement(config: &FilterConfig) -> Query {
    let predicates = job_plan_predicates(config);
    let sql = format!("{PROJECTION}\n{}\n{ORDER_BY}", predicates.render());
    Query::new(StatementKind::JobPlans, sql)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    fn keys(config: &FilterConfig) -> Vec<ClauseKey> {
        job_plan_predicates(config).clauses().iter().map(|c| c.key).collect()
    }

    #[test]
    fn defaults_scope_to_requesting_station_without_gating() {
        let p = job_plan_predicates(&FilterConfig::default());

        assert_eq!(
            keys(&FilterConfig::default()),
            vec![
                ClauseKey::Company,
                ClauseKey::WorkstationScope,
                ClauseKey::ReleasedPlanItem,
                ClauseKey::NotCancelled,
                ClauseKey::NotMaintenance,
                ClauseKey::HasParentJob,
                ClauseKey::QuantityRemaining,
            ]
        );
        assert_eq!(
            p.get(ClauseKey::WorkstationScope).unwrap().sql,
            "A.PWORKSTATIONID = @workstationId"
        );
        assert!(p.get(ClauseKey::PredecessorGate).is_none());
        assert!(p.get(ClauseKey::LineQuantityRemaining).is_none());
    }

    #[test]
    fn statement_orders_by_start_date_then_sort_key() {
        let q = job_plans_statement(&FilterConfig::default());
        assert_eq!(q.kind, StatementKind::JobPlans);
        assert!(q.sql.ends_with("ORDER BY A.STARTDATE, ISNULL(A.SORTID, A.PID)"));
        assert!(q.sql.contains("WHERE A.COMPANYID = @companyId"));
        assert!(q.sql.contains("A.PIDSTATUS <> 3"));
        assert!(q.sql.contains("ISNULL(A.PTASKSID, 0) != 99"));
    }

    #[test]
    fn ignoring_quantity_removes_only_the_quantity_clause() {
        let base = job_plan_predicates(&FilterConfig::default());
        let ignored = job_plan_predicates(&FilterConfig {
            ignore_quantity_exhausted: true,
            ..Default::default()
        });

        let expected: Vec<_> = base
            .clauses()
            .iter()
            .filter(|c| c.key != ClauseKey::QuantityRemaining)
            .cloned()
            .collect();
        assert_eq!(ignored.clauses(), expected.as_slice());
    }

    #[test]
    fn station_group_scope_wins_over_work_center() {
        let both = job_plan_predicates(&FilterConfig {
            scope_by_same_station_group: true,
            scope_by_same_work_center: true,
            ..Default::default()
        });
        let group_only = job_plan_predicates(&FilterConfig {
            scope_by_same_station_group: true,
            ..Default::default()
        });

        assert_eq!(both, group_only);
        assert!(both.get(ClauseKey::WorkstationScope).unwrap().sql.contains("GROUPCODE"));
    }

    #[test]
    fn work_center_scope() {
        let p = job_plan_predicates(&FilterConfig {
            scope_by_same_work_center: true,
            ..Default::default()
        });
        let scope = &p.get(ClauseKey::WorkstationScope).unwrap().sql;
        assert!(scope.contains("PWORKCENTERID"));
        assert!(!scope.contains("GROUPCODE"));
    }

    #[test]
    fn date_predicates_can_combine() {
        let p = job_plan_predicates(&FilterConfig {
            show_only_upcoming: true,
            show_only_past: true,
            ..Default::default()
        });
        assert!(p.get(ClauseKey::StartsInFuture).is_some());
        assert!(p.get(ClauseKey::StartedInPast).is_some());
    }

    #[test]
    fn predecessor_gates() {
        let gate = |working, production| {
            job_plan_predicates(&FilterConfig {
                gate_previous_operation_working: working,
                gate_previous_operation_production: production,
                ..Default::default()
            })
            .get(ClauseKey::PredecessorGate)
            .map(|c| c.sql.clone())
        };

        let working = gate(true, false).unwrap();
        assert!(working.starts_with("EXISTS"));
        assert!(!working.contains("PRECEIPTOT"));

        let production = gate(false, true).unwrap();
        assert!(production.contains("PRECEIPTOT"));
        assert!(!production.contains("PWSSTATUS"));

        let either = gate(true, true).unwrap();
        assert!(either.contains(" OR EXISTS"));
        assert!(gate(false, false).is_none());
    }

    #[test]
    fn line_production_checks_station_receipts() {
        let p = job_plan_predicates(&FilterConfig {
            line_production_finish_on_complete: true,
            ..Default::default()
        });
        let clause = &p.get(ClauseKey::LineQuantityRemaining).unwrap().sql;
        assert!(clause.contains("R.PWORKSTATIONID = @workstationId"));
    }

    fn config_from_bits(bits: u8) -> FilterConfig {
        FilterConfig {
            show_only_upcoming: bits & 1 != 0,
            show_only_past: bits & 2 != 0,
            scope_by_same_station_group: bits & 4 != 0,
            scope_by_same_work_center: bits & 8 != 0,
            ignore_quantity_exhausted: bits & 16 != 0,
            line_production_finish_on_complete: bits & 32 != 0,
            gate_previous_operation_working: bits & 64 != 0,
            gate_previous_operation_production: bits & 128 != 0,
        }
    }

    /// Clause each switch is allowed to affect.
    fn owned_clause(bit: u8) -> ClauseKey {
        match bit {
            0 => ClauseKey::StartsInFuture,
            1 => ClauseKey::StartedInPast,
            2 | 3 => ClauseKey::WorkstationScope,
            4 => ClauseKey::QuantityRemaining,
            5 => ClauseKey::LineQuantityRemaining,
            _ => ClauseKey::PredecessorGate,
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: flipping one switch changes no clause except the one it owns.
        #[test]
        fn switches_are_independent(bits in any::<u8>(), bit in 0u8..8) {
            let before = job_plan_predicates(&config_from_bits(bits));
            let after = job_plan_predicates(&config_from_bits(bits ^ (1 << bit)));

            let all: BTreeSet<ClauseKey> = before
                .clauses()
                .iter()
                .chain(after.clauses())
                .map(|c| c.key)
                .collect();

            for key in all {
                if key == owned_clause(bit) {
                    continue;
                }
                prop_assert_eq!(before.get(key), after.get(key), "clause {:?} changed", key);
            }
        }
    }
}
