//! `shopfloor-core`: shared building blocks for the shop-floor command stack.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod error;
pub mod id;

pub use error::DomainError;
pub use id::{CompanyId, CorrelationId, PeriodId, UserId, WorkstationId};
