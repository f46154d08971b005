//! Request / response types for administrative events.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::EventRecord;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateEventRequest {
    /// Unique event title; duplicates are rejected with 409.
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EventResponse {
    pub id: i64,
    pub title: String,
    pub body: String,
    pub created_by: i64,
    pub created_at: String,
}

impl EventRecord {
    pub fn to_response(&self) -> EventResponse {
        EventResponse {
            id: self.id,
            title: self.title.clone(),
            body: self.body.clone(),
            created_by: self.created_by,
            created_at: self.created_at.to_rfc3339(),
        }
    }
}
