//! Event catalog service
//!
//! Owns the catalog business rules: creation and update validation, the
//! lifecycle state machine with its publish guards and cancellation
//! cascade, and the deletion guard.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::utils::logging::log_event_action;

use crate::config::Settings;
use crate::database::repositories::EventRepository;
use crate::models::event::{
    CreateEventRequest, Event, EventFilters, EventPage, EventStatus, EventWithDetails,
    UpdateEventRequest,
};
use crate::models::pagination::{Page, Pagination};
use crate::models::ticket::NewTicket;
use crate::models::user::AuthContext;
use crate::utils::errors::{EventlyError, Result};

/// Event service for catalog operations
#[derive(Clone)]
pub struct EventService {
    events: EventRepository,
    settings: Settings,
}

impl EventService {
    pub fn new(events: EventRepository, settings: Settings) -> Self {
        Self { events, settings }
    }

    /// Create a new DRAFT event with its tickets and questions
    pub async fn create_event(
        &self,
        organiser_id: i64,
        request: CreateEventRequest,
    ) -> Result<EventWithDetails> {
        debug!(organiser_id = organiser_id, name = %request.name, "Creating event");

        if request.end_date_time <= request.start_date_time {
            return Err(EventlyError::Validation(
                "Event end date must be after the start date".to_string(),
            ));
        }

        if request.start_date_time < Utc::now() {
            return Err(EventlyError::Validation(
                "Event start date must be in the future".to_string(),
            ));
        }

        if request.capacity < 1 {
            return Err(EventlyError::Validation(
                "Event capacity must be positive".to_string(),
            ));
        }

        if !request.pricing.is_free() && request.pricing.tickets().is_empty() {
            return Err(EventlyError::Validation(
                "At least one ticket type is required".to_string(),
            ));
        }

        for ticket in request.pricing.tickets() {
            validate_new_ticket(ticket, request.end_date_time)?;
        }

        let details = self.events.create(organiser_id, &request).await?;
        log_event_action(details.event.id, "create", organiser_id, None);

        Ok(details)
    }

    /// List events with filters and pagination. Non-admin callers cannot
    /// widen the status filter beyond their own events.
    pub async fn get_all_events(
        &self,
        mut filters: EventFilters,
        page: Page,
        ctx: Option<&AuthContext>,
    ) -> Result<EventPage> {
        if page.limit < 1 || page.limit > self.settings.registration.max_page_size {
            return Err(EventlyError::Validation(format!(
                "Limit must be between 1 and {}",
                self.settings.registration.max_page_size
            )));
        }

        if filters.include_all_statuses && !ctx.is_some_and(AuthContext::is_admin) {
            filters.include_all_statuses = false;
        }

        let (events, total) = self.events.list(&filters, page).await?;

        Ok(EventPage {
            events,
            pagination: Pagination::new(total, page),
        })
    }

    /// Get event by ID
    pub async fn get_event_by_id(&self, event_id: i64) -> Result<Event> {
        self.events
            .find_by_id(event_id)
            .await?
            .ok_or(EventlyError::NotFound {
                entity: "Event",
                id: event_id,
            })
    }

    /// Get the fully hydrated event
    pub async fn get_event_with_details(&self, event_id: i64) -> Result<EventWithDetails> {
        self.events
            .find_with_details(event_id)
            .await?
            .ok_or(EventlyError::NotFound {
                entity: "Event",
                id: event_id,
            })
    }

    /// Update an event. COMPLETED events are immutable; free/paid toggles
    /// carry their own rules (see below).
    pub async fn update_event(
        &self,
        event_id: i64,
        request: UpdateEventRequest,
        ctx: &AuthContext,
    ) -> Result<EventWithDetails> {
        let existing = self.get_event_by_id(event_id).await?;
        authorize_event_access(&existing, ctx)?;

        if existing.status == EventStatus::Completed {
            return Err(EventlyError::Validation(
                "Cannot update a completed event".to_string(),
            ));
        }

        let start = request.start_date_time.unwrap_or(existing.start_date_time);
        let end = request.end_date_time.unwrap_or(existing.end_date_time);
        if end <= start {
            return Err(EventlyError::Validation(
                "Event end date must be after the start date".to_string(),
            ));
        }

        // Turning an event paid needs tickets in the same update; the
        // paid-to-free guard runs inside the repository transaction where
        // the registration count is stable
        if request.is_free == Some(false)
            && existing.is_free
            && request
                .tickets
                .as_ref()
                .map_or(true, |tickets| tickets.is_empty())
        {
            return Err(EventlyError::Validation(
                "At least one ticket type is required for paid events".to_string(),
            ));
        }

        if let Some(tickets) = &request.tickets {
            for ticket in tickets {
                validate_new_ticket(ticket, end)?;
            }
        }

        self.events.update(event_id, &request).await?;
        log_event_action(event_id, "update", ctx.user_id, None);

        self.get_event_with_details(event_id).await
    }

    /// Transition an event's lifecycle status. Publishing checks the
    /// question/ticket guards; cancelling a published event bulk-cancels
    /// its live registrations in the same transaction.
    pub async fn update_event_status(
        &self,
        event_id: i64,
        status: EventStatus,
        ctx: &AuthContext,
    ) -> Result<Event> {
        let existing = self.get_event_by_id(event_id).await?;
        authorize_event_access(&existing, ctx)?;

        validate_status_transition(existing.status, status)?;

        if status == EventStatus::Published {
            let question_count = self.events.count_questions(event_id).await?;
            if question_count == 0 {
                return Err(EventlyError::Validation(
                    "Events must have at least one question before publishing".to_string(),
                ));
            }

            if !existing.is_free {
                let ticket_count = self.events.count_tickets(event_id).await?;
                if ticket_count == 0 {
                    return Err(EventlyError::Validation(
                        "Paid events must have at least one ticket type before publishing"
                            .to_string(),
                    ));
                }
            }
        }

        let event = if status == EventStatus::Cancelled && existing.status == EventStatus::Published
        {
            // TODO: refunds and cancellation notifications for paid registrations
            let (event, cancelled) = self.events.cancel_with_registrations(event_id).await?;
            info!(
                event_id = event_id,
                cancelled_registrations = cancelled,
                "Event cancelled with registrations"
            );
            event
        } else {
            self.events.update_status(event_id, status).await?
        };

        log_event_action(event_id, "status", ctx.user_id, Some(&status.to_string()));

        Ok(event)
    }

    /// Delete an event outright. Only possible while nothing references it;
    /// events with registrations must be cancelled instead.
    pub async fn delete_event(&self, event_id: i64, ctx: &AuthContext) -> Result<()> {
        let existing = self.get_event_by_id(event_id).await?;
        authorize_event_access(&existing, ctx)?;

        let registration_count = self.events.count_registrations(event_id).await?;
        if registration_count > 0 {
            return Err(EventlyError::Validation(
                "Cannot delete an event with registrations. Please cancel the event instead."
                    .to_string(),
            ));
        }

        self.events.delete(event_id).await?;
        log_event_action(event_id, "delete", ctx.user_id, None);

        Ok(())
    }
}

/// Lifecycle guard: DRAFT -> PUBLISHED -> CANCELLED, CANCELLED -> DRAFT,
/// COMPLETED terminal, COMPLETED never a manual target
pub fn validate_status_transition(from: EventStatus, to: EventStatus) -> Result<()> {
    let rejected = match (from, to) {
        (EventStatus::Completed, _) => true,
        (_, EventStatus::Completed) => true,
        (EventStatus::Cancelled, to) => to != EventStatus::Draft,
        _ => false,
    };

    if rejected {
        return Err(EventlyError::InvalidStateTransition {
            from: from.to_string(),
            to: to.to_string(),
        });
    }

    Ok(())
}

/// Organiser-owns-event check with admin override
pub fn authorize_event_access(event: &Event, ctx: &AuthContext) -> Result<()> {
    if ctx.is_admin() || event.organiser_id == ctx.user_id {
        return Ok(());
    }

    Err(EventlyError::Authorization(
        "You do not have access to this event".to_string(),
    ))
}

fn validate_new_ticket(ticket: &NewTicket, event_end: DateTime<Utc>) -> Result<()> {
    if ticket.sales_end <= ticket.sales_start {
        return Err(EventlyError::Validation(
            "Ticket sales end date must be after sales start date".to_string(),
        ));
    }

    if ticket.sales_end > event_end {
        return Err(EventlyError::Validation(
            "Ticket sales cannot end after the event ends".to_string(),
        ));
    }

    if ticket.price.is_sign_negative() {
        return Err(EventlyError::Validation(
            "Ticket price cannot be negative".to_string(),
        ));
    }

    if ticket.quantity_total < 1 {
        return Err(EventlyError::Validation(
            "Ticket quantity must be positive".to_string(),
        ));
    }

    Ok(())
}
