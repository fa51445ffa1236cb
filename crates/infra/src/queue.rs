//! Queue writer: one `NGPCOMMANDQUEUE` row per write command.
//!
//! Rows are handed over to the backend consumer as soon as they are written;
//! this side never updates them. No retries here.

use serde::Serialize;
use thiserror::Error;
use tracing::instrument;

use shopfloor_core::{CompanyId, CorrelationId, UserId, WorkstationId};
use shopfloor_queries::{Query, SqlValue, StatementKind, params};

use crate::backend::{Backend, DataError};

pub const INSERT_SQL: &str = "INSERT INTO NGPCOMMANDQUEUE
  (COMPANYID, COMMANDID, COMMANDTYPE, PWORKSTATIONID, COMMAND, ISPROCESSED, INSERTUSERID, INSERTDATE)
VALUES (@companyId, @commandId, @commandType, @workstationId, @command, 0, @userId, GETDATE())";

/// Values of one queue row. `ISPROCESSED` (always 0) and `INSERTDATE` (backend clock) are set by the statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueRecord {
    pub company_id: CompanyId,
    pub correlation_id: CorrelationId,
    pub command_type: i32,
    pub workstation_id: Option<WorkstationId>,
    pub command_json: String,
    pub inserted_by: UserId,
}

impl QueueRecord {
    pub fn statement(&self) -> Query {
        let workstation = self
            .workstation_id
            .as_ref()
            .map(SqlValue::from)
            .unwrap_or(SqlValue::Null);

        Query::new(StatementKind::InsertQueueRecord, INSERT_SQL)
            .bind(params::COMPANY_ID, self.company_id)
            .bind(params::COMMAND_ID, self.correlation_id)
            .bind(params::COMMAND_TYPE, self.command_type)
            .bind(params::WORKSTATION_ID, workstation)
            .bind(params::COMMAND, self.command_json.as_str())
            .bind(params::USER_ID, self.inserted_by)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("queue insert for command {correlation_id} failed: {source}")]
    Persistence {
        correlation_id: CorrelationId,
        #[source]
        source: DataError,
    },
}

impl QueueError {
    pub fn data(&self) -> &DataError {
        match self {
            QueueError::Persistence { source, .. } => source,
        }
    }

    pub fn into_data(self) -> DataError {
        match self {
            QueueError::Persistence { source, .. } => source,
        }
    }
}

#[derive(Debug, Clone)]
pub struct QueueWriter<B> {
    backend: B,
}

impl<B: Backend> QueueWriter<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    #[instrument(
        skip(self, record),
        fields(
            company_id = %record.company_id,
            correlation_id = %record.correlation_id,
            command_type = record.command_type,
        ),
        err
    )]
    pub async fn enqueue(&self, record: &QueueRecord) -> Result<(), QueueError> {
        self.backend
            .execute(&record.statement())
            .await
            .map(|_| ())
            .map_err(|source| QueueError::Persistence {
                correlation_id: record.correlation_id,
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_backend::InMemoryBackend;
    use std::sync::Arc;

    fn record(id: i64) -> QueueRecord {
        QueueRecord {
            company_id: CompanyId::new(1),
            correlation_id: CorrelationId::new(id),
            command_type: 1,
            workstation_id: Some(WorkstationId::new("5")),
            command_json: r#"{"WorkstationId":"5","PlanId":"9"}"#.to_string(),
            inserted_by: UserId::new(3),
        }
    }

    #[test]
    fn command_json_is_bound_not_spliced() {
        let mut r = record(1);
        r.command_json = r#"{"WorkstationId":"5'; DROP TABLE X;--"}"#.to_string();
        let q = r.statement();

        assert!(!q.sql.contains("DROP"));
        assert_eq!(
            q.param(params::COMMAND).and_then(SqlValue::as_str),
            Some(r.command_json.as_str())
        );
        assert_eq!(q.param(params::WORKSTATION_ID), Some(&SqlValue::Int(5)));
    }

    #[tokio::test]
    async fn enqueue_writes_an_unprocessed_row() {
        let backend = Arc::new(InMemoryBackend::new());
        QueueWriter::new(backend.clone())
            .enqueue(&record(9))
            .await
            .unwrap();

        let queued = backend.queued();
        assert_eq!(queued.len(), 1);
        let (id, row) = &queued[0];
        assert_eq!(*id, CorrelationId::new(9));
        assert!(!row.is_processed);
        assert_eq!(row.command_type, 1);
        assert_eq!(row.insert_user_id, 3);
    }

    #[tokio::test]
    async fn duplicate_ids_surface_as_persistence_errors() {
        let backend = Arc::new(InMemoryBackend::new());
        let writer = QueueWriter::new(backend.clone());
        writer.enqueue(&record(9)).await.unwrap();

        let err = writer.enqueue(&record(9)).await.unwrap_err();
        assert_eq!(err.data().report("PersistenceError").number, Some(2627));
        assert_eq!(backend.queued().len(), 1);
    }
}
