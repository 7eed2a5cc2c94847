//! Ticket service
//!
//! Inventory management for paid events plus the availability read path.
//! The availability answer and the registration engine share the same
//! classification on the ticket model so the two can never disagree.

use chrono::Utc;
use tracing::{debug, info};

use crate::database::repositories::{EventRepository, TicketRepository};
use crate::models::event::Event;
use crate::models::ticket::{NewTicket, Ticket, TicketAvailability, UpdateTicketRequest};
use crate::models::user::AuthContext;
use crate::services::event::authorize_event_access;
use crate::utils::errors::{EventlyError, Result};

#[derive(Clone)]
pub struct TicketService {
    tickets: TicketRepository,
    events: EventRepository,
}

impl TicketService {
    pub fn new(tickets: TicketRepository, events: EventRepository) -> Self {
        Self { tickets, events }
    }

    /// Add a ticket type to an existing event
    pub async fn create_ticket(
        &self,
        event_id: i64,
        ticket: NewTicket,
        ctx: &AuthContext,
    ) -> Result<Ticket> {
        let event = self.require_event(event_id).await?;
        authorize_event_access(&event, ctx)?;

        if event.is_free {
            return Err(EventlyError::Validation(
                "Cannot add tickets to a free event".to_string(),
            ));
        }

        validate_ticket_fields(
            ticket.price,
            ticket.quantity_total,
            ticket.sales_start,
            ticket.sales_end,
            &event,
        )?;

        let created = self.tickets.create(event_id, &ticket).await?;
        info!(
            ticket_id = created.id,
            event_id = event_id,
            "Ticket created"
        );

        Ok(created)
    }

    /// Update a ticket type. The quantity can never drop below what has
    /// already been sold.
    pub async fn update_ticket(
        &self,
        ticket_id: i64,
        request: UpdateTicketRequest,
        ctx: &AuthContext,
    ) -> Result<Ticket> {
        let existing = self.require_ticket(ticket_id).await?;
        let event = self.require_event(existing.event_id).await?;
        authorize_event_access(&event, ctx)?;

        let price = request.price.unwrap_or(existing.price);
        let quantity_total = request.quantity_total.unwrap_or(existing.quantity_total);
        let sales_start = request.sales_start.unwrap_or(existing.sales_start);
        let sales_end = request.sales_end.unwrap_or(existing.sales_end);

        validate_ticket_fields(price, quantity_total, sales_start, sales_end, &event)?;

        if quantity_total < existing.quantity_sold {
            return Err(EventlyError::Validation(
                "Cannot reduce ticket quantity below the number already sold".to_string(),
            ));
        }

        let updated = self.tickets.update(ticket_id, &request).await?;
        info!(ticket_id = ticket_id, "Ticket updated");

        Ok(updated)
    }

    /// Delete a ticket type. Tickets with recorded sales are kept for the
    /// purchase history and can only be deactivated.
    pub async fn delete_ticket(&self, ticket_id: i64, ctx: &AuthContext) -> Result<()> {
        let existing = self.require_ticket(ticket_id).await?;
        let event = self.require_event(existing.event_id).await?;
        authorize_event_access(&event, ctx)?;

        if existing.quantity_sold > 0 {
            return Err(EventlyError::Validation(
                "Cannot delete a ticket that has been purchased".to_string(),
            ));
        }

        self.tickets.delete(ticket_id).await?;
        info!(ticket_id = ticket_id, "Ticket deleted");

        Ok(())
    }

    /// Active ticket types for an event, cheapest first
    pub async fn get_tickets_by_event(&self, event_id: i64) -> Result<Vec<Ticket>> {
        self.require_event(event_id).await?;
        self.tickets.find_active_by_event(event_id).await
    }

    /// Get ticket by ID
    pub async fn get_ticket_by_id(&self, ticket_id: i64) -> Result<Ticket> {
        self.require_ticket(ticket_id).await
    }

    /// Classify a ticket's purchasability right now
    pub async fn check_availability(&self, ticket_id: i64) -> Result<TicketAvailability> {
        let ticket = self.require_ticket(ticket_id).await?;
        let event = self.require_event(ticket.event_id).await?;

        let availability = ticket.availability(event.status, Utc::now());
        debug!(
            ticket_id = ticket_id,
            available = availability.available,
            "Checked ticket availability"
        );

        Ok(availability)
    }

    async fn require_event(&self, event_id: i64) -> Result<Event> {
        self.events
            .find_by_id(event_id)
            .await?
            .ok_or(EventlyError::NotFound {
                entity: "Event",
                id: event_id,
            })
    }

    async fn require_ticket(&self, ticket_id: i64) -> Result<Ticket> {
        self.tickets
            .find_by_id(ticket_id)
            .await?
            .ok_or(EventlyError::NotFound {
                entity: "Ticket",
                id: ticket_id,
            })
    }
}

fn validate_ticket_fields(
    price: rust_decimal::Decimal,
    quantity_total: i32,
    sales_start: chrono::DateTime<Utc>,
    sales_end: chrono::DateTime<Utc>,
    event: &Event,
) -> Result<()> {
    if price.is_sign_negative() {
        return Err(EventlyError::Validation(
            "Ticket price cannot be negative".to_string(),
        ));
    }

    if quantity_total < 1 {
        return Err(EventlyError::Validation(
            "Ticket quantity must be positive".to_string(),
        ));
    }

    if sales_end <= sales_start {
        return Err(EventlyError::Validation(
            "Ticket sales end date must be after sales start date".to_string(),
        ));
    }

    if sales_end > event.end_date_time {
        return Err(EventlyError::Validation(
            "Ticket sales cannot end after the event ends".to_string(),
        ));
    }

    Ok(())
}
