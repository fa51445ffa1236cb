use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shopfloor_core::CompanyId;

/// Envelope for a published result.
///
/// - `request_id` ties together every event produced for one terminal request
///   (a write mode yields two: submission and final status).
/// - `event_id` is unique per event; both ids are UUIDv7 so they sort by time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    event_id: Uuid,
    request_id: Uuid,
    company_id: CompanyId,
    occurred_at: DateTime<Utc>,
    payload: E,
}

impl<E> EventEnvelope<E> {
    pub fn new(request_id: Uuid, company_id: CompanyId, payload: E) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            request_id,
            company_id,
            occurred_at: Utc::now(),
            payload,
        }
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn company_id(&self) -> CompanyId {
        self.company_id
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    pub fn into_payload(self) -> E {
        self.payload
    }
}
