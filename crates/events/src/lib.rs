//! Result channel: what a dispatcher publishes and how terminals subscribe to it.

pub mod bus;
pub mod dispatch;
pub mod envelope;
pub mod in_memory_bus;
pub mod result;
pub mod status;

pub use bus::{EventBus, Subscription};
pub use dispatch::{DispatchEvent, DispatchOutcome, Resolution};
pub use envelope::EventEnvelope;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
pub use result::{ErrorReport, ResultMessage, Row};
pub use status::{StatusFill, StatusIndication, StatusShape};
