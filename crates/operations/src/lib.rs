//! Operation modes for shop-floor terminals.
//!
//! This crate turns a raw terminal payload into a typed, validated command
//! envelope. It is deterministic and free of IO: nothing here knows about the
//! queue table or the backend connection.

pub mod command;
pub mod mode;
pub mod request;
pub mod validator;

pub use command::{Command, CommandEnvelope};
pub use mode::{FieldName, ModeKind, OperationMode, mode_override};
pub use request::{OperationRequest, is_truthy};
pub use validator::{ValidationFailure, validate, validate_as};
