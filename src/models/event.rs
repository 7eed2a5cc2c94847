//! Event model and catalog DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::pagination::Pagination;
use super::question::{EventQuestionDetail, NewQuestion};
use super::ticket::{NewTicket, Ticket};
use super::user::OrganizerSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "event_status", rename_all = "UPPERCASE")]
pub enum EventStatus {
    Draft,
    Published,
    Cancelled,
    Completed,
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            EventStatus::Draft => "DRAFT",
            EventStatus::Published => "PUBLISHED",
            EventStatus::Cancelled => "CANCELLED",
            EventStatus::Completed => "COMPLETED",
        };
        write!(f, "{label}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "event_type", rename_all = "UPPERCASE")]
pub enum EventType {
    Sports,
    Musical,
    Social,
    Volunteering,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: i64,
    pub organiser_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub location: String,
    pub capacity: i32,
    pub event_type: EventType,
    pub is_free: bool,
    pub start_date_time: DateTime<Utc>,
    pub end_date_time: DateTime<Utc>,
    pub status: EventStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Listing row: event fields plus organiser names and registration count
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EventSummary {
    pub id: i64,
    pub organiser_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub location: String,
    pub capacity: i32,
    pub event_type: EventType,
    pub is_free: bool,
    pub start_date_time: DateTime<Utc>,
    pub end_date_time: DateTime<Utc>,
    pub status: EventStatus,
    pub organizer_first_name: String,
    pub organizer_last_name: String,
    pub registration_count: i64,
}

/// Fully hydrated event: organiser, ACTIVE tickets, questions in display
/// order, and the current registration count
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventWithDetails {
    #[serde(flatten)]
    pub event: Event,
    pub organizer: OrganizerSummary,
    pub tickets: Vec<Ticket>,
    pub questions: Vec<EventQuestionDetail>,
    pub registration_count: i64,
}

/// Free-vs-paid is a tagged variant so a paid event structurally carries
/// its ticket list; `is_free` is derived, never supplied on its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum EventPricing {
    Free,
    Paid { tickets: Vec<NewTicket> },
}

impl EventPricing {
    pub fn is_free(&self) -> bool {
        matches!(self, EventPricing::Free)
    }

    pub fn tickets(&self) -> &[NewTicket] {
        match self {
            EventPricing::Free => &[],
            EventPricing::Paid { tickets } => tickets,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEventRequest {
    pub name: String,
    pub description: Option<String>,
    pub location: String,
    pub capacity: i32,
    pub event_type: EventType,
    pub start_date_time: DateTime<Utc>,
    pub end_date_time: DateTime<Utc>,
    pub pricing: EventPricing,
    pub questions: Vec<NewQuestion>,
}

/// Partial update. Tickets, when supplied for a paid event, replace the
/// unsold rows; questions replace the unanswered links.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateEventRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub capacity: Option<i32>,
    pub event_type: Option<EventType>,
    pub is_free: Option<bool>,
    pub start_date_time: Option<DateTime<Utc>>,
    pub end_date_time: Option<DateTime<Utc>>,
    pub tickets: Option<Vec<NewTicket>>,
    pub questions: Option<Vec<NewQuestion>>,
}

/// Listing filters. `status` defaults to PUBLISHED for anonymous browsing;
/// organisers asking for their own events and admin overrides widen it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventFilters {
    pub status: Option<EventStatus>,
    pub search: Option<String>,
    pub event_type: Option<EventType>,
    pub location: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub organiser_id: Option<i64>,
    pub is_free: Option<bool>,
    pub include_all_statuses: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventPage {
    pub events: Vec<EventSummary>,
    pub pagination: Pagination,
}
