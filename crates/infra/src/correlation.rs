//! Correlation id allocation.
//!
//! The read-and-bump of `NGPCOMMANDQUEUE.COMMANDID` runs inside the
//! `GETTABLEMAXVALUE` procedure in one batch, so the database serialises
//! concurrent producers. Nothing here reads the current maximum and writes it
//! back in separate round trips.

use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::instrument;

use shopfloor_core::{CompanyId, CorrelationId};
use shopfloor_queries::{Query, StatementKind, params};

use crate::backend::{Backend, DataError};

pub const ALLOCATE_SQL: &str = "DECLARE @maxID INT;
EXEC DBO.GETTABLEMAXVALUE 'NGPCOMMANDQUEUE', 'COMMANDID', @maxID OUTPUT;
SELECT @maxID AS maxID";

/// Result column holding the allocated id.
pub const MAX_ID_COLUMN: &str = "maxID";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AllocationError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error("counter procedure returned no usable id: {0}")]
    NoId(String),
}

pub fn allocate_statement(company_id: CompanyId) -> Query {
    Query::new(StatementKind::AllocateCorrelationId, ALLOCATE_SQL)
        .bind(params::COMPANY_ID, company_id)
}

fn id_from(value: &JsonValue) -> Option<i64> {
    match value {
        JsonValue::Number(n) => n.as_i64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub struct CorrelationAllocator<B> {
    backend: B,
}

impl<B: Backend> CorrelationAllocator<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    #[instrument(skip(self), fields(company_id = %company_id), err)]
    pub async fn allocate(&self, company_id: CompanyId) -> Result<CorrelationId, AllocationError> {
        let rows = self.backend.execute(&allocate_statement(company_id)).await?;

        let value = rows
            .first()
            .and_then(|r| r.get(MAX_ID_COLUMN))
            .ok_or_else(|| AllocationError::NoId("missing maxID column".to_string()))?;

        match id_from(value) {
            Some(id) if id > 0 => Ok(CorrelationId::new(id)),
            _ => Err(AllocationError::NoId(value.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_backend::InMemoryBackend;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn allocates_the_next_counter_value() {
        let backend = Arc::new(InMemoryBackend::new().with_counter(41));
        let allocator = CorrelationAllocator::new(backend.clone());

        assert_eq!(
            allocator.allocate(CompanyId::new(1)).await.unwrap(),
            CorrelationId::new(42)
        );
        assert_eq!(
            allocator.allocate(CompanyId::new(1)).await.unwrap(),
            CorrelationId::new(43)
        );
        assert_eq!(
            backend.executed_kinds(),
            vec![StatementKind::AllocateCorrelationId; 2]
        );
    }

    struct NullCounter;

    #[async_trait::async_trait]
    impl Backend for NullCounter {
        async fn execute(&self, _query: &Query) -> Result<crate::backend::Rows, DataError> {
            let mut row = shopfloor_events::Row::new();
            row.insert(MAX_ID_COLUMN.into(), JsonValue::Null);
            Ok(vec![row])
        }
    }

    #[tokio::test]
    async fn null_max_id_is_an_error() {
        let err = CorrelationAllocator::new(NullCounter)
            .allocate(CompanyId::new(1))
            .await
            .unwrap_err();
        assert_eq!(err, AllocationError::NoId("null".to_string()));
    }

    #[test]
    fn ids_parse_from_numbers_or_text() {
        assert_eq!(id_from(&json!(17)), Some(17));
        assert_eq!(id_from(&json!(" 17 ")), Some(17));
        assert_eq!(id_from(&json!(true)), None);
    }

    #[tokio::test]
    async fn backend_errors_propagate() {
        let backend = InMemoryBackend::new();
        backend.disconnect("ETIMEOUT");
        let err = CorrelationAllocator::new(backend)
            .allocate(CompanyId::new(1))
            .await
            .unwrap_err();
        assert!(matches!(err, AllocationError::Data(e) if e.is_connectivity()));
    }
}
