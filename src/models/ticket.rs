//! Ticket type model and availability classification
//!
//! The availability check lives here as a pure function so the read path
//! (`TicketService::check_availability`) and the registration engine apply
//! the same rules.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::event::EventStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "ticket_status", rename_all = "UPPERCASE")]
pub enum TicketStatus {
    Active,
    Inactive,
    #[sqlx(rename = "SOLD_OUT")]
    SoldOut,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Ticket {
    pub id: i64,
    pub event_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub quantity_total: i32,
    pub quantity_sold: i32,
    pub sales_start: DateTime<Utc>,
    pub sales_end: DateTime<Utc>,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Result of an availability probe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketAvailability {
    pub available: bool,
    pub available_quantity: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl TicketAvailability {
    fn unavailable(reason: &str) -> Self {
        Self {
            available: false,
            available_quantity: 0,
            reason: Some(reason.to_string()),
        }
    }
}

impl Ticket {
    pub fn remaining(&self) -> i32 {
        self.quantity_total - self.quantity_sold
    }

    /// Classify availability. Rejection reasons are evaluated in fixed
    /// priority so callers get deterministic messages: ticket status,
    /// event status, sales window, inventory.
    pub fn availability(&self, event_status: EventStatus, now: DateTime<Utc>) -> TicketAvailability {
        if self.status != TicketStatus::Active {
            return TicketAvailability::unavailable("Ticket is no longer available");
        }

        if event_status != EventStatus::Published {
            return TicketAvailability::unavailable("Event is not open for registration");
        }

        if now < self.sales_start {
            return TicketAvailability::unavailable("Ticket sales have not started yet");
        }

        if now > self.sales_end {
            return TicketAvailability::unavailable("Ticket sales have ended");
        }

        if self.remaining() <= 0 {
            return TicketAvailability::unavailable("Sold out");
        }

        TicketAvailability {
            available: true,
            available_quantity: self.remaining(),
            reason: None,
        }
    }
}

/// Ticket definition supplied when creating or re-pricing an event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTicket {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub quantity_total: i32,
    pub sales_start: DateTime<Utc>,
    pub sales_end: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTicketRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub quantity_total: Option<i32>,
    pub sales_start: Option<DateTime<Utc>>,
    pub sales_end: Option<DateTime<Utc>>,
    pub status: Option<TicketStatus>,
}
