//! Confirmation of queued commands.
//!
//! ```text
//! Submitted -> Waiting -> Resolved(Success | Failure | Timeout)
//!                     \-> Abandoned   (shutdown before the timer fired)
//! ```
//!
//! Exactly one check runs per armed confirmation, after the configured window.
//! A missing response row, or one not yet marked processed, resolves as
//! `Timeout`; that is a normal outcome, not an error.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value as JsonValue;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use shopfloor_core::CorrelationId;
use shopfloor_events::{Resolution, Row};
use shopfloor_queries::{Query, StatementKind, params};

use crate::backend::{Backend, DataError, Rows};

pub const SELECT_RESPONSE_SQL: &str = "SELECT Q.COMMANDID, Q.ISPROCESSED, P.ISSUCCESS, P.MESSAGE
FROM NGPCOMMANDQUEUE Q
JOIN NGPCOMMANDRESPONSE P ON Q.COMMANDID = P.COMMANDID
WHERE P.COMMANDID = @commandId";

pub const DEFAULT_WINDOW: Duration = Duration::from_millis(2000);

pub fn response_statement(id: CorrelationId) -> Query {
    Query::new(StatementKind::SelectResponse, SELECT_RESPONSE_SQL).bind(params::COMMAND_ID, id)
}

/// The joined queue/response row for a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseRecord {
    pub correlation_id: CorrelationId,
    pub is_processed: bool,
    pub is_success: bool,
    pub message: String,
}

/// Bit columns arrive as booleans or as 0/1 depending on the driver.
fn flag(value: Option<&JsonValue>) -> bool {
    match value {
        Some(JsonValue::Bool(b)) => *b,
        Some(JsonValue::Number(n)) => n.as_i64() == Some(1),
        Some(JsonValue::String(s)) => matches!(s.trim(), "1") || s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    }
}

impl ResponseRecord {
    pub fn from_row(row: &Row) -> Option<Self> {
        let id = match row.get("COMMANDID")? {
            JsonValue::Number(n) => n.as_i64()?,
            JsonValue::String(s) => s.trim().parse().ok()?,
            _ => return None,
        };
        Some(Self {
            correlation_id: CorrelationId::new(id),
            is_processed: flag(row.get("ISPROCESSED")),
            is_success: flag(row.get("ISSUCCESS")),
            message: row
                .get("MESSAGE")
                .and_then(JsonValue::as_str)
                .unwrap_or_default()
                .to_string(),
        })
    }
}

/// Classify the single check. `window` is only echoed into `Timeout`.
pub fn classify(record: Option<&ResponseRecord>, window: Duration) -> Resolution {
    match record {
        Some(r) if r.is_processed && r.is_success => Resolution::Success,
        Some(r) if r.is_processed => Resolution::Failure {
            message: r.message.clone(),
        },
        _ => Resolution::Timeout {
            window_ms: u64::try_from(window.as_millis()).unwrap_or(u64::MAX),
        },
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ConfirmationState {
    Submitted,
    Waiting,
    Resolved { resolution: Resolution },
    Abandoned,
}

impl ConfirmationState {
    pub fn resolution(&self) -> Option<&Resolution> {
        match self {
            ConfirmationState::Resolved { resolution } => Some(resolution),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ConfirmationState::Resolved { .. } | ConfirmationState::Abandoned
        )
    }
}

/// Outcome of one confirmation: final state plus the rows the check returned.
#[derive(Debug, Clone, PartialEq)]
pub struct Confirmation {
    pub correlation_id: CorrelationId,
    pub state: ConfirmationState,
    pub rows: Rows,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfirmationError {
    #[error(transparent)]
    Data(#[from] DataError),
}

impl ConfirmationError {
    pub fn into_data(self) -> DataError {
        match self {
            ConfirmationError::Data(e) => e,
        }
    }
}

/// Completes once shutdown is signalled or the sender is gone.
async fn stopped(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}

#[derive(Debug, Clone)]
pub struct ConfirmationPoller<B> {
    backend: B,
    window: Duration,
}

impl<B: Backend> ConfirmationPoller<B> {
    pub fn new(backend: B, window: Duration) -> Self {
        Self { backend, window }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// One immediate check, no waiting.
    #[instrument(skip(self), fields(correlation_id = %correlation_id), err)]
    pub async fn check(&self, correlation_id: CorrelationId) -> Result<Confirmation, ConfirmationError> {
        let rows = self.backend.execute(&response_statement(correlation_id)).await?;
        let record = rows.first().and_then(ResponseRecord::from_row);
        let resolution = classify(record.as_ref(), self.window);

        match &resolution {
            Resolution::Success => info!("command processed"),
            Resolution::Failure { message } => warn!(%message, "command processed with error"),
            Resolution::Timeout { window_ms } => warn!(window_ms, "command not processed within window"),
        }

        Ok(Confirmation {
            correlation_id,
            state: ConfirmationState::Resolved { resolution },
            rows,
        })
    }

    /// Wait out the window, then check once. Resolves as `Abandoned` if
    /// `shutdown` flips to true (or its sender goes away) first.
    pub async fn await_resolution(
        &self,
        correlation_id: CorrelationId,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<Confirmation, ConfirmationError> {
        let abandoned = || Confirmation {
            correlation_id,
            state: ConfirmationState::Abandoned,
            rows: Vec::new(),
        };

        if *shutdown.borrow() {
            debug!(%correlation_id, "shutdown before arming; confirmation abandoned");
            return Ok(abandoned());
        }

        debug!(%correlation_id, window_ms = self.window.as_millis() as u64, "confirmation armed");

        tokio::select! {
            _ = tokio::time::sleep(self.window) => self.check(correlation_id).await,
            _ = stopped(&mut shutdown) => {
                debug!(%correlation_id, "confirmation abandoned");
                Ok(abandoned())
            }
        }
    }
}
