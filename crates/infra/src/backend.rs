//! Narrow interface to the production database.
//!
//! The connection pool (connect, reconnect-on-error, locking) lives behind
//! [`Backend`]; this crate only hands it parameterised statements and reads
//! back rows.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use shopfloor_events::{ErrorReport, Row};
use shopfloor_queries::Query;

pub type Rows = Vec<Row>;

/// Diagnostics the database attached to a failed statement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionFailure {
    pub message: String,
    pub code: Option<String>,
    pub number: Option<i64>,
    pub state: Option<i64>,
    pub class: Option<i64>,
    pub line_number: Option<i64>,
    pub server_name: Option<String>,
    pub proc_name: Option<String>,
    /// Message of the error raised before this one in the same batch.
    pub preceding: Option<String>,
}

impl ExecutionFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn with_number(mut self, number: i64) -> Self {
        self.number = Some(number);
        self
    }

    pub fn with_preceding(mut self, preceding: impl Into<String>) -> Self {
        self.preceding = Some(preceding.into());
        self
    }
}

/// Error raised by a [`Backend`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DataError {
    /// The backend cannot be reached at all.
    #[error("backend unreachable: {message}")]
    Connectivity {
        message: String,
        code: Option<String>,
    },

    /// The statement reached the backend and failed there.
    #[error("{}", .0.message)]
    Execution(ExecutionFailure),
}

impl DataError {
    pub fn connectivity(message: impl Into<String>) -> Self {
        DataError::Connectivity {
            message: message.into(),
            code: None,
        }
    }

    pub fn execution(message: impl Into<String>) -> Self {
        DataError::Execution(ExecutionFailure::new(message))
    }

    pub fn is_connectivity(&self) -> bool {
        matches!(self, DataError::Connectivity { .. })
    }

    /// Render for delivery on the result channel under error family `name`.
    pub fn report(&self, name: &str) -> ErrorReport {
        match self {
            DataError::Connectivity { message, code } => ErrorReport {
                code: code.clone(),
                ..ErrorReport::new(name, message.clone())
            },
            DataError::Execution(f) => ErrorReport {
                code: f.code.clone(),
                number: f.number,
                state: f.state,
                class: f.class,
                line_number: f.line_number,
                server_name: f.server_name.clone(),
                proc_name: f.proc_name.clone(),
                ..ErrorReport::new(name, f.message.clone())
            }
            .with_preceding(f.preceding.as_deref()),
        }
    }
}

/// Executes one statement and returns its first result set.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn execute(&self, query: &Query) -> Result<Rows, DataError>;
}

#[async_trait]
impl<B> Backend for Arc<B>
where
    B: Backend + ?Sized,
{
    async fn execute(&self, query: &Query) -> Result<Rows, DataError> {
        (**self).execute(query).await
    }
}
