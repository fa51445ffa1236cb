//! Ordered predicate builder.
//!
//! A WHERE clause is a list of independently named fragments joined with
//! `AND`. Each fragment is keyed so composers (and their tests) can check
//! exactly which clause a configuration switch contributes.

use serde::Serialize;

/// Identity of a predicate fragment.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClauseKey {
    Company,
    WorkstationScope,
    ReleasedPlanItem,
    NotCancelled,
    NotMaintenance,
    HasParentJob,
    StartsInFuture,
    StartedInPast,
    QuantityRemaining,
    LineQuantityRemaining,
    PredecessorGate,
}

/// One `AND`-joined fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Clause {
    pub key: ClauseKey,
    pub sql: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PredicateBuilder {
    clauses: Vec<Clause>,
}

impl PredicateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, key: ClauseKey, sql: impl Into<String>) -> Self {
        self.clauses.push(Clause {
            key,
            sql: sql.into(),
        });
        self
    }

    pub fn push_if(self, enabled: bool, key: ClauseKey, sql: impl FnOnce() -> String) -> Self {
        if enabled { self.push(key, sql()) } else { self }
    }

    pub fn push_opt(self, key: ClauseKey, sql: Option<String>) -> Self {
        match sql {
            Some(sql) => self.push(key, sql),
            None => self,
        }
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn get(&self, key: ClauseKey) -> Option<&Clause> {
        self.clauses.iter().find(|c| c.key == key)
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// `WHERE a\n  AND b ...`, or an empty string when no clause was added.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (idx, clause) in self.clauses.iter().enumerate() {
            out.push_str(if idx == 0 { "WHERE " } else { "\n  AND " });
            out.push_str(&clause.sql);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_clauses_in_insertion_order() {
        let p = PredicateBuilder::new()
            .push(ClauseKey::Company, "A.COMPANYID = @companyId")
            .push_if(false, ClauseKey::StartsInFuture, || "A.STARTDATE >= GETDATE()".into())
            .push_if(true, ClauseKey::NotCancelled, || "A.PIDSTATUS <> 3".into())
            .push_opt(ClauseKey::PredecessorGate, None);

        assert_eq!(
            p.render(),
            "WHERE A.COMPANYID = @companyId\n  AND A.PIDSTATUS <> 3"
        );
        assert!(p.get(ClauseKey::StartsInFuture).is_none());
    }

    #[test]
    fn empty_builder_renders_nothing() {
        assert!(PredicateBuilder::new().is_empty());
        assert_eq!(PredicateBuilder::new().render(), "");
    }
}
