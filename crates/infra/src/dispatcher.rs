//! Request dispatch: validate, then either answer a read mode or queue a write
//! mode and arm its confirmation.
//!
//! ```text
//! request
//!   -> mode override (configured "<code>|<label>")
//!   -> validate                     -> InsufficientPayload      (1 event)
//!   -> read mode:  compose, execute -> Rows                     (1 event)
//!   -> write mode: allocate id, insert queue row -> Submitted   (event 1)
//!                  spawn: wait window, check once -> Resolved   (event 2)
//! ```
//!
//! Persistence and connectivity errors follow [`ErrorPolicy`]: returned to the
//! caller, or published as a `Failed` event and returned as a normal receipt.
//! Validation failures are never errors.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{Span, debug, error, info, instrument};
use uuid::Uuid;

use shopfloor_core::CorrelationId;
use shopfloor_events::{
    DispatchEvent, DispatchOutcome, ErrorReport, EventBus, ResultMessage, StatusIndication,
};
use shopfloor_operations::{
    CommandEnvelope, OperationMode, OperationRequest, ValidationFailure, mode_override, validate,
};
use shopfloor_queries::{ReadContext, compose_read_query};

use crate::backend::{Backend, DataError, Rows};
use crate::config::Settings;
use crate::confirmation::{
    Confirmation, ConfirmationError, ConfirmationPoller, ConfirmationState,
};
use crate::correlation::{AllocationError, CorrelationAllocator};
use crate::queue::{QueueError, QueueRecord, QueueWriter};

/// What happens to persistence and connectivity errors.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Return the error to the caller.
    Raise,
    /// Publish it as data on the result channel and carry on.
    #[default]
    Deliver,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DispatchError {
    /// A statement failed at the backend (constraint violation, bad data, ...).
    #[error("persistence error: {0}")]
    Persistence(DataError),

    /// The backend could not be reached.
    #[error("connectivity error: {0}")]
    Connectivity(DataError),

    /// The result channel rejected an event.
    #[error("result channel rejected an event: {0}")]
    Publish(String),
}

impl From<DataError> for DispatchError {
    fn from(value: DataError) -> Self {
        if value.is_connectivity() {
            DispatchError::Connectivity(value)
        } else {
            DispatchError::Persistence(value)
        }
    }
}

impl From<AllocationError> for DispatchError {
    fn from(value: AllocationError) -> Self {
        match value {
            AllocationError::Data(e) => e.into(),
            AllocationError::NoId(detail) => DispatchError::Persistence(DataError::execution(
                format!("correlation id allocation returned no id: {detail}"),
            )),
        }
    }
}

impl From<QueueError> for DispatchError {
    fn from(value: QueueError) -> Self {
        value.into_data().into()
    }
}

impl From<ConfirmationError> for DispatchError {
    fn from(value: ConfirmationError) -> Self {
        value.into_data().into()
    }
}

impl DispatchError {
    pub fn name(&self) -> &'static str {
        match self {
            DispatchError::Persistence(_) => "PersistenceError",
            DispatchError::Connectivity(_) => "ConnectivityError",
            DispatchError::Publish(_) => "PublishError",
        }
    }

    pub fn report(&self) -> ErrorReport {
        match self {
            DispatchError::Persistence(e) | DispatchError::Connectivity(e) => e.report(self.name()),
            DispatchError::Publish(msg) => ErrorReport::new(self.name(), msg.clone()),
        }
    }
}

/// Handle to an armed confirmation task.
#[derive(Debug)]
pub struct PendingConfirmation {
    correlation_id: CorrelationId,
    handle: JoinHandle<Result<ConfirmationState, DispatchError>>,
}

impl PendingConfirmation {
    pub fn correlation_id(&self) -> CorrelationId {
        self.correlation_id
    }

    /// Wait for the task. A task that did not run to completion counts as abandoned.
    pub async fn finished(self) -> Result<ConfirmationState, DispatchError> {
        match self.handle.await {
            Ok(result) => result,
            Err(join_err) => {
                debug!(correlation_id = %self.correlation_id, error = %join_err, "confirmation task did not complete");
                Ok(ConfirmationState::Abandoned)
            }
        }
    }
}

/// What [`Dispatcher::dispatch`] did with a request.
#[derive(Debug)]
pub enum DispatchReceipt {
    InsufficientPayload {
        request_id: Uuid,
        failure: ValidationFailure,
    },
    Rows {
        request_id: Uuid,
        mode: OperationMode,
        rows: Rows,
    },
    Submitted {
        request_id: Uuid,
        correlation_id: CorrelationId,
        confirmation: PendingConfirmation,
    },
    /// An error delivered as data (`ErrorPolicy::Deliver`).
    Failed {
        request_id: Uuid,
        report: ErrorReport,
    },
}

impl DispatchReceipt {
    pub fn request_id(&self) -> Uuid {
        match self {
            DispatchReceipt::InsufficientPayload { request_id, .. }
            | DispatchReceipt::Rows { request_id, .. }
            | DispatchReceipt::Submitted { request_id, .. }
            | DispatchReceipt::Failed { request_id, .. } => *request_id,
        }
    }
}

struct Shared<B, P> {
    settings: Settings,
    backend: B,
    allocator: CorrelationAllocator<B>,
    writer: QueueWriter<B>,
    poller: ConfirmationPoller<B>,
    bus: P,
    shutdown: watch::Sender<bool>,
    pending: Mutex<HashMap<CorrelationId, ConfirmationState>>,
}

impl<B, P> Shared<B, P>
where
    P: EventBus<DispatchEvent>,
{
    fn publish(&self, request_id: Uuid, outcome: DispatchOutcome) -> Result<(), DispatchError> {
        let event = DispatchEvent::new(request_id, self.settings.company_id, outcome);
        debug!(event_type = event.event_type(), status = %event.status(), "publishing");
        self.bus
            .publish(event)
            .map_err(|e| DispatchError::Publish(e.to_string()))
    }

    fn track(&self, id: CorrelationId, state: ConfirmationState) {
        if let Ok(mut pending) = self.pending.lock() {
            if state.is_terminal() {
                pending.remove(&id);
            } else {
                pending.insert(id, state);
            }
        }
    }
}

/// Orchestrates validation, read composition, queueing and confirmation.
///
/// Cheap to clone; clones share the backend, bus and pending confirmations.
pub struct Dispatcher<B, P> {
    shared: Arc<Shared<B, P>>,
}

impl<B, P> Clone for Dispatcher<B, P> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<B, P> Dispatcher<B, P>
where
    B: Backend + Clone + 'static,
    P: EventBus<DispatchEvent> + 'static,
{
    pub fn new(settings: Settings, backend: B, bus: P) -> Self {
        let (shutdown, _) = watch::channel(false);
        let shared = Shared {
            allocator: CorrelationAllocator::new(backend.clone()),
            writer: QueueWriter::new(backend.clone()),
            poller: ConfirmationPoller::new(backend.clone(), settings.confirm_window),
            backend,
            bus,
            shutdown,
            pending: Mutex::new(HashMap::new()),
            settings,
        };
        Self {
            shared: Arc::new(shared),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.shared.settings
    }

    pub fn bus(&self) -> &P {
        &self.shared.bus
    }

    /// Handle one terminal request.
    #[instrument(
        skip(self, request),
        fields(
            company_id = %self.shared.settings.company_id,
            request_id = tracing::field::Empty,
            mode = tracing::field::Empty,
        ),
        err
    )]
    pub async fn dispatch(&self, request: OperationRequest) -> Result<DispatchReceipt, DispatchError> {
        let request_id = Uuid::now_v7();
        let span = Span::current();
        span.record("request_id", tracing::field::display(request_id));
        debug!(status = %StatusIndication::requesting(), "request received");

        let request = match self
            .shared
            .settings
            .mode_option
            .as_deref()
            .and_then(mode_override)
        {
            Some(code) => request.with_mode(code),
            None => request,
        };

        let envelope = match validate(&request) {
            Ok(envelope) => envelope,
            Err(failure) => {
                info!(reason = %failure, "insufficient payload");
                self.shared.publish(
                    request_id,
                    DispatchOutcome::InsufficientPayload {
                        mode: request.operation_mode(),
                        reason: failure.to_string(),
                    },
                )?;
                return Ok(DispatchReceipt::InsufficientPayload {
                    request_id,
                    failure,
                });
            }
        };
        span.record("mode", envelope.mode().code());

        let result = if envelope.is_read() {
            self.read(request_id, &envelope).await
        } else {
            self.submit(request_id, &envelope).await
        };

        match result {
            Ok(receipt) => Ok(receipt),
            Err((correlation_id, err)) => self.surface(request_id, correlation_id, err),
        }
    }

    async fn read(
        &self,
        request_id: Uuid,
        envelope: &CommandEnvelope,
    ) -> Result<DispatchReceipt, (Option<CorrelationId>, DispatchError)> {
        let settings = &self.shared.settings;
        let mode = envelope.mode();
        let ctx = ReadContext {
            company_id: settings.company_id,
            period_id: settings.period_id,
            workstation_id: envelope.workstation_id().cloned(),
        };

        // Validation already guarantees a workstation for station-scoped modes.
        let query = compose_read_query(mode, &settings.filter, &ctx).map_err(|e| {
            (
                None,
                DispatchError::Persistence(DataError::execution(e.to_string())),
            )
        })?;

        let rows = self
            .shared
            .backend
            .execute(&query)
            .await
            .map_err(|e| (None, e.into()))?;
        info!(statement = %query.kind, rows = rows.len(), "read answered");

        self.shared
            .publish(
                request_id,
                DispatchOutcome::Rows {
                    mode: mode.code().to_string(),
                    result: ResultMessage::rows(rows.clone()),
                },
            )
            .map_err(|e| (None, e))?;

        Ok(DispatchReceipt::Rows {
            request_id,
            mode,
            rows,
        })
    }

    async fn submit(
        &self,
        request_id: Uuid,
        envelope: &CommandEnvelope,
    ) -> Result<DispatchReceipt, (Option<CorrelationId>, DispatchError)> {
        let settings = &self.shared.settings;

        let correlation_id = self
            .shared
            .allocator
            .allocate(settings.company_id)
            .await
            .map_err(|e| (None, e.into()))?;

        let record = QueueRecord {
            company_id: settings.company_id,
            correlation_id,
            command_type: envelope.mode().command_type(),
            workstation_id: envelope.workstation_id().cloned(),
            command_json: envelope.command_json().to_string(),
            inserted_by: settings.user_id,
        };
        self.shared
            .writer
            .enqueue(&record)
            .await
            .map_err(|e| (Some(correlation_id), e.into()))?;

        info!(%correlation_id, "command queued, awaiting approval");
        self.shared
            .publish(
                request_id,
                DispatchOutcome::Submitted {
                    correlation_id,
                    mode: envelope.mode().code().to_string(),
                    workstation_id: envelope.workstation_id().map(|w| w.as_str().to_string()),
                },
            )
            .map_err(|e| (Some(correlation_id), e))?;
        // Tracked only once a confirmation will actually be armed.
        self.shared.track(correlation_id, ConfirmationState::Submitted);

        let confirmation = self.arm(request_id, correlation_id);
        Ok(DispatchReceipt::Submitted {
            request_id,
            correlation_id,
            confirmation,
        })
    }

    /// Spawn the single delayed check. Never blocks the caller.
    fn arm(&self, request_id: Uuid, correlation_id: CorrelationId) -> PendingConfirmation {
        let shared = Arc::clone(&self.shared);
        let shutdown = shared.shutdown.subscribe();

        let handle = tokio::spawn(async move {
            shared.track(correlation_id, ConfirmationState::Waiting);
            let outcome = shared.poller.await_resolution(correlation_id, shutdown).await;

            match outcome {
                Ok(Confirmation { state, rows, .. }) => {
                    shared.track(correlation_id, state.clone());
                    if let Some(resolution) = state.resolution() {
                        let published = shared.publish(
                            request_id,
                            DispatchOutcome::Resolved {
                                correlation_id,
                                resolution: resolution.clone(),
                                result: ResultMessage::rows(rows),
                            },
                        );
                        if let Err(err) = published {
                            error!(%correlation_id, error = %err, "final status not published");
                            return Err(err);
                        }
                    }
                    Ok(state)
                }
                Err(err) => {
                    shared.track(correlation_id, ConfirmationState::Abandoned);
                    let err = DispatchError::from(err);
                    error!(%correlation_id, error = %err, "confirmation check failed");
                    if shared.settings.error_policy == ErrorPolicy::Deliver {
                        let report = err.report();
                        if let Err(publish_err) = shared.publish(
                            request_id,
                            DispatchOutcome::Failed {
                                correlation_id: Some(correlation_id),
                                result: ResultMessage::error(report),
                            },
                        ) {
                            error!(%correlation_id, error = %publish_err, "error report not published");
                        }
                    }
                    Err(err)
                }
            }
        });

        PendingConfirmation {
            correlation_id,
            handle,
        }
    }

    fn surface(
        &self,
        request_id: Uuid,
        correlation_id: Option<CorrelationId>,
        err: DispatchError,
    ) -> Result<DispatchReceipt, DispatchError> {
        error!(error = %err, kind = err.name(), "dispatch failed");

        match self.shared.settings.error_policy {
            ErrorPolicy::Raise => Err(err),
            ErrorPolicy::Deliver => {
                let report = err.report();
                self.shared.publish(
                    request_id,
                    DispatchOutcome::Failed {
                        correlation_id,
                        result: ResultMessage::error(report.clone()),
                    },
                )?;
                Ok(DispatchReceipt::Failed { request_id, report })
            }
        }
    }

    /// One immediate out-of-band check. Errors are always returned, whatever the policy.
    pub async fn check_status(
        &self,
        correlation_id: CorrelationId,
    ) -> Result<Confirmation, DispatchError> {
        Ok(self.shared.poller.check(correlation_id).await?)
    }

    /// Last known state of a confirmation that has not finished yet.
    pub fn confirmation_state(&self, correlation_id: CorrelationId) -> Option<ConfirmationState> {
        self.shared
            .pending
            .lock()
            .ok()
            .and_then(|p| p.get(&correlation_id).cloned())
    }

    pub fn pending_confirmations(&self) -> usize {
        self.shared.pending.lock().map(|p| p.len()).unwrap_or(0)
    }

    /// Abandon every armed confirmation. Abandoned checks publish nothing.
    pub fn shutdown(&self) {
        let pending = self.pending_confirmations();
        self.shared.shutdown.send_replace(true);
        info!(pending, "dispatcher shut down");
    }
}
