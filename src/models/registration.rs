//! Registration, purchase and response models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::event::Event;
use super::participant::{Participant, ParticipantProfile};
use super::ticket::Ticket;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "registration_status", rename_all = "UPPERCASE")]
pub enum RegistrationStatus {
    Pending,
    Confirmed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Registration {
    pub id: i64,
    pub event_id: i64,
    pub participant_id: i64,
    pub user_id: Option<i64>,
    pub status: RegistrationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Purchase {
    pub id: i64,
    pub registration_id: i64,
    pub ticket_id: i64,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub created_at: DateTime<Utc>,
}

/// A stored answer joined with its question, in display order
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResponseDetail {
    pub id: i64,
    pub event_question_id: i64,
    pub question_text: String,
    pub is_required: bool,
    pub display_order: i32,
    pub response_text: String,
}

/// One answer supplied with a registration request, keyed by question id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerInput {
    pub question_id: i64,
    pub response_text: String,
}

/// Inbound registration request
#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationRequest {
    pub event_id: i64,
    pub participant: ParticipantProfile,
    pub ticket_id: Option<i64>,
    pub quantity: Option<i32>,
    #[serde(default)]
    pub responses: Vec<AnswerInput>,
    pub user_id: Option<i64>,
}

/// Fully hydrated registration returned after a successful commit
#[derive(Debug, Clone, Serialize)]
pub struct RegistrationDetails {
    pub registration: Registration,
    pub participant: Participant,
    pub event: Event,
    pub purchase: Option<Purchase>,
    pub ticket: Option<Ticket>,
    pub responses: Vec<ResponseDetail>,
}

/// Filters for the registrations listing; visibility is additionally
/// scoped by the caller's role.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct RegistrationFilters {
    pub event_id: Option<i64>,
    pub user_id: Option<i64>,
}
