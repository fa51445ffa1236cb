//! Simulated backend for tests and local runs.
//!
//! One mutex guards the counter, the queue table and the response table; it
//! plays the part of the database's own serialisation of the counter
//! procedure. Statements are recognised by [`StatementKind`], not by parsing SQL.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Value as JsonValue, json};

use shopfloor_core::{CompanyId, CorrelationId};
use shopfloor_events::Row;
use shopfloor_queries::{Query, SqlValue, StatementKind, params};

use crate::backend::{Backend, DataError, Rows};

/// A row of the simulated queue table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCommand {
    pub company_id: CompanyId,
    pub command_type: i64,
    pub workstation_id: SqlValue,
    pub command: String,
    pub is_processed: bool,
    pub insert_user_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct StoredResponse {
    is_success: bool,
    message: String,
}

#[derive(Debug, Default)]
struct State {
    max_command_id: i64,
    queue: BTreeMap<i64, StoredCommand>,
    responses: HashMap<i64, StoredResponse>,
    canned: HashMap<StatementKind, Rows>,
    faults: VecDeque<(Option<StatementKind>, DataError)>,
    disconnected: Option<String>,
    executed: Vec<Query>,
}

#[derive(Debug, Default)]
pub struct InMemoryBackend {
    state: Mutex<State>,
}

fn lock_err() -> DataError {
    DataError::connectivity("simulated backend lock poisoned")
}

fn required_int(query: &Query, name: &str) -> Result<i64, DataError> {
    query
        .param(name)
        .and_then(SqlValue::as_i64)
        .ok_or_else(|| DataError::execution(format!("Must declare the scalar variable \"@{name}\".")))
}

fn required_text(query: &Query, name: &str) -> Result<String, DataError> {
    query
        .param(name)
        .and_then(SqlValue::as_str)
        .map(str::to_string)
        .ok_or_else(|| DataError::execution(format!("Must declare the scalar variable \"@{name}\".")))
}

fn row(pairs: impl IntoIterator<Item = (&'static str, JsonValue)>) -> Row {
    pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the counter at `max` so the next allocation yields `max + 1`.
    pub fn with_counter(self, max: i64) -> Self {
        if let Ok(mut s) = self.state.lock() {
            s.max_command_id = max;
        }
        self
    }

    /// Rows returned for every statement of `kind`.
    pub fn with_rows(self, kind: StatementKind, rows: Rows) -> Self {
        if let Ok(mut s) = self.state.lock() {
            s.canned.insert(kind, rows);
        }
        self
    }

    /// Act as the queue consumer: mark the command processed and write its response.
    pub fn complete(&self, id: CorrelationId, success: bool, message: impl Into<String>) {
        if let Ok(mut s) = self.state.lock() {
            if let Some(cmd) = s.queue.get_mut(&id.get()) {
                cmd.is_processed = true;
            }
            s.responses.insert(
                id.get(),
                StoredResponse {
                    is_success: success,
                    message: message.into(),
                },
            );
        }
    }

    /// Write a response row while leaving the queue row unprocessed.
    pub fn respond_unprocessed(&self, id: CorrelationId) {
        if let Ok(mut s) = self.state.lock() {
            s.responses.insert(
                id.get(),
                StoredResponse {
                    is_success: false,
                    message: String::new(),
                },
            );
        }
    }

    /// The next statement fails with `error`. Faults queue up in order.
    pub fn fail_next(&self, error: DataError) {
        if let Ok(mut s) = self.state.lock() {
            s.faults.push_back((None, error));
        }
    }

    /// The next statement of `kind` fails with `error`; other statements pass.
    pub fn fail_next_of(&self, kind: StatementKind, error: DataError) {
        if let Ok(mut s) = self.state.lock() {
            s.faults.push_back((Some(kind), error));
        }
    }

    /// Every statement fails with a connectivity error until [`reconnect`](Self::reconnect).
    pub fn disconnect(&self, message: impl Into<String>) {
        if let Ok(mut s) = self.state.lock() {
            s.disconnected = Some(message.into());
        }
    }

    pub fn reconnect(&self) {
        if let Ok(mut s) = self.state.lock() {
            s.disconnected = None;
        }
    }

    pub fn queued(&self) -> Vec<(CorrelationId, StoredCommand)> {
        self.state
            .lock()
            .map(|s| {
                s.queue
                    .iter()
                    .map(|(id, cmd)| (CorrelationId::new(*id), cmd.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn executed(&self) -> Vec<Query> {
        self.state
            .lock()
            .map(|s| s.executed.clone())
            .unwrap_or_default()
    }

    pub fn executed_kinds(&self) -> Vec<StatementKind> {
        self.executed().iter().map(|q| q.kind).collect()
    }
}

impl State {
    fn run(&mut self, query: &Query) -> Result<Rows, DataError> {
        match query.kind {
            StatementKind::AllocateCorrelationId => {
                self.max_command_id += 1;
                Ok(vec![row([("maxID", json!(self.max_command_id))])])
            }
            StatementKind::InsertQueueRecord => {
                let id = required_int(query, params::COMMAND_ID)?;
                if self.queue.contains_key(&id) {
                    return Err(DataError::Execution(
                        crate::backend::ExecutionFailure::new(
                            "Cannot insert duplicate key in object 'dbo.NGPCOMMANDQUEUE'.",
                        )
                        .with_number(2627),
                    ));
                }
                let cmd = StoredCommand {
                    company_id: CompanyId::new(required_int(query, params::COMPANY_ID)?),
                    command_type: required_int(query, params::COMMAND_TYPE)?,
                    workstation_id: query
                        .param(params::WORKSTATION_ID)
                        .cloned()
                        .unwrap_or(SqlValue::Null),
                    command: required_text(query, params::COMMAND)?,
                    is_processed: false,
                    insert_user_id: required_int(query, params::USER_ID)?,
                };
                self.queue.insert(id, cmd);
                Ok(Vec::new())
            }
            StatementKind::SelectResponse => {
                let id = required_int(query, params::COMMAND_ID)?;
                let joined = self
                    .queue
                    .get(&id)
                    .zip(self.responses.get(&id))
                    .map(|(cmd, resp)| {
                        row([
                            ("COMMANDID", json!(id)),
                            ("ISPROCESSED", json!(cmd.is_processed)),
                            ("ISSUCCESS", json!(resp.is_success)),
                            ("MESSAGE", json!(resp.message)),
                        ])
                    });
                Ok(joined.into_iter().collect())
            }
            kind => Ok(self.canned.get(&kind).cloned().unwrap_or_default()),
        }
    }
}

#[async_trait]
impl Backend for InMemoryBackend {
    async fn execute(&self, query: &Query) -> Result<Rows, DataError> {
        let mut state = self.state.lock().map_err(|_| lock_err())?;
        state.executed.push(query.clone());

        if let Some(message) = &state.disconnected {
            return Err(DataError::connectivity(message.clone()));
        }
        let fault = state
            .faults
            .iter()
            .position(|(kind, _)| kind.is_none_or(|k| k == query.kind));
        if let Some((_, error)) = fault.and_then(|idx| state.faults.remove(idx)) {
            return Err(error);
        }

        state.run(query)
    }
}
