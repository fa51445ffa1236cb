//! Backend-facing side of the shop-floor dispatcher: correlation ids, the
//! command queue, confirmation checks, and the orchestration that ties them to
//! validation and read composition.

pub mod backend;
pub mod config;
pub mod confirmation;
pub mod correlation;
pub mod dispatcher;
pub mod memory_backend;
pub mod queue;


pub use backend::{Backend, DataError, ExecutionFailure, Rows};
pub use config::Settings;
pub use confirmation::{
    Confirmation, ConfirmationError, ConfirmationPoller, ConfirmationState, ResponseRecord,
};
pub use correlation::{AllocationError, CorrelationAllocator};
pub use dispatcher::{DispatchError, DispatchReceipt, Dispatcher, ErrorPolicy, PendingConfirmation};
pub use memory_backend::InMemoryBackend;
pub use queue::{QueueError, QueueRecord, QueueWriter};
