//! Registration service
//!
//! The front door of the registration engine. Validation runs here against
//! a snapshot of the event; the repository re-checks capacity and inventory
//! under locks when it commits, so a stale snapshot can reject early but
//! can never oversell.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::config::Settings;
use crate::database::repositories::{
    EventRepository, ParticipantRepository, PurchaseCommand, RegistrationCommand,
    RegistrationRepository, ResolvedResponse, TicketRepository,
};
use crate::models::event::EventWithDetails;
use crate::models::pagination::{Page, Pagination};
use crate::models::registration::{
    Registration, RegistrationDetails, RegistrationFilters, RegistrationRequest,
    RegistrationStatus,
};
use crate::models::ticket::Ticket;
use crate::models::user::AuthContext;
use crate::utils::errors::{EventlyError, Result};
use crate::utils::logging::{log_registration, log_registration_rejected};

#[derive(Clone)]
pub struct RegistrationService {
    registrations: RegistrationRepository,
    events: EventRepository,
    tickets: TicketRepository,
    participants: ParticipantRepository,
    settings: Settings,
}

impl RegistrationService {
    pub fn new(
        registrations: RegistrationRepository,
        events: EventRepository,
        tickets: TicketRepository,
        participants: ParticipantRepository,
        settings: Settings,
    ) -> Self {
        Self {
            registrations,
            events,
            tickets,
            participants,
            settings,
        }
    }

    /// Register a participant for an event.
    ///
    /// Runs the full validation sequence, then hands a pre-validated command
    /// to the repository for the atomic commit and returns the hydrated
    /// registration.
    pub async fn register_for_event(
        &self,
        request: RegistrationRequest,
    ) -> Result<RegistrationDetails> {
        let result = self.try_register(&request).await;

        if let Err(err) = &result {
            if err.is_client_error() {
                log_registration_rejected(request.event_id, err.kind(), &err.to_string());
            }
        }

        result
    }

    async fn try_register(&self, request: &RegistrationRequest) -> Result<RegistrationDetails> {
        let details = self
            .events
            .find_with_details(request.event_id)
            .await?
            .ok_or(EventlyError::NotFound {
                entity: "Event",
                id: request.event_id,
            })?;

        // Fetched separately from the hydrated event so inactive tickets
        // still classify as unavailable rather than unknown
        let ticket = match (details.event.is_free, request.ticket_id) {
            (false, Some(ticket_id)) => self.tickets.find_by_id(ticket_id).await?,
            _ => None,
        };

        let validated = validate_registration(
            &details,
            ticket.as_ref(),
            request,
            Utc::now(),
            self.settings.registration.max_quantity_per_purchase,
        )?;

        let command = RegistrationCommand {
            event_id: request.event_id,
            profile: request.participant.clone(),
            user_id: request.user_id,
            purchase: validated.purchase,
            responses: validated.responses,
        };

        let registration_id = self.registrations.register(&self.participants, &command).await?;

        let registration = self
            .registrations
            .find_details(registration_id)
            .await?
            .ok_or(EventlyError::NotFound {
                entity: "Registration",
                id: registration_id,
            })?;

        log_registration(
            registration.registration.id,
            registration.registration.event_id,
            registration.participant.id,
            registration.purchase.is_some(),
        );

        Ok(registration)
    }

    /// List registrations, scoped to what the caller may see
    pub async fn get_registrations(
        &self,
        filters: RegistrationFilters,
        ctx: &AuthContext,
        page: Page,
    ) -> Result<(Vec<Registration>, Pagination)> {
        if page.limit < 1 || page.limit > self.settings.registration.max_page_size {
            return Err(EventlyError::Validation(format!(
                "Limit must be between 1 and {}",
                self.settings.registration.max_page_size
            )));
        }

        let (registrations, total) = self.registrations.list(&filters, ctx, page).await?;
        Ok((registrations, Pagination::new(total, page)))
    }

    /// Fetch one registration with its purchase and responses
    pub async fn get_registration_by_id(
        &self,
        registration_id: i64,
        ctx: &AuthContext,
    ) -> Result<RegistrationDetails> {
        let details = self.require_details(registration_id).await?;
        self.authorize_registration_access(&details, ctx)?;
        Ok(details)
    }

    /// Cancel a registration. The row is kept with CANCELLED status and the
    /// participant record is never touched.
    // TODO: release ticket inventory once the refund flow exists
    pub async fn cancel_registration(
        &self,
        registration_id: i64,
        ctx: &AuthContext,
    ) -> Result<Registration> {
        let details = self.require_details(registration_id).await?;
        self.authorize_registration_access(&details, ctx)?;

        if details.registration.status == RegistrationStatus::Cancelled {
            return Err(EventlyError::Validation(
                "Registration is already cancelled".to_string(),
            ));
        }

        let registration = self
            .registrations
            .update_status(registration_id, RegistrationStatus::Cancelled)
            .await?;

        debug!(
            registration_id = registration_id,
            user_id = ctx.user_id,
            "Registration cancelled"
        );

        Ok(registration)
    }

    async fn require_details(&self, registration_id: i64) -> Result<RegistrationDetails> {
        self.registrations
            .find_details(registration_id)
            .await?
            .ok_or(EventlyError::NotFound {
                entity: "Registration",
                id: registration_id,
            })
    }

    fn authorize_registration_access(
        &self,
        details: &RegistrationDetails,
        ctx: &AuthContext,
    ) -> Result<()> {
        let own = details.registration.user_id == Some(ctx.user_id);
        let organiser = details.event.organiser_id == ctx.user_id;

        if ctx.is_admin() || own || organiser {
            return Ok(());
        }

        Err(EventlyError::Authorization(
            "You do not have access to this registration".to_string(),
        ))
    }
}

/// Outcome of request validation, ready to hand to the repository
#[derive(Debug, Clone)]
pub struct ValidatedRegistration {
    pub purchase: Option<PurchaseCommand>,
    pub responses: Vec<ResolvedResponse>,
}

/// Validate a registration request against the event snapshot.
///
/// Checks run in a fixed order: capacity, event status, ticket selection
/// and availability for paid events, then the question responses. The
/// `ticket` argument is the pre-fetched row for `request.ticket_id`, or
/// None when it does not exist.
pub fn validate_registration(
    event: &EventWithDetails,
    ticket: Option<&Ticket>,
    request: &RegistrationRequest,
    now: DateTime<Utc>,
    max_quantity_per_purchase: i32,
) -> Result<ValidatedRegistration> {
    use crate::models::event::EventStatus;

    if event.registration_count >= event.event.capacity as i64 {
        return Err(EventlyError::CapacityExceeded {
            event_id: event.event.id,
            capacity: event.event.capacity,
        });
    }

    if event.event.status != EventStatus::Published {
        return Err(EventlyError::Validation(
            "Event is not open for registration".to_string(),
        ));
    }

    let purchase = if event.event.is_free {
        None
    } else {
        let (Some(ticket_id), Some(quantity)) = (request.ticket_id, request.quantity) else {
            return Err(EventlyError::MissingTicketSelection);
        };

        if quantity < 1 {
            return Err(EventlyError::Validation(
                "Quantity must be at least 1".to_string(),
            ));
        }

        if quantity > max_quantity_per_purchase {
            return Err(EventlyError::Validation(format!(
                "Quantity cannot exceed {max_quantity_per_purchase} tickets per registration"
            )));
        }

        let ticket = ticket
            .filter(|t| t.event_id == event.event.id)
            .ok_or(EventlyError::NotFound {
                entity: "Ticket",
                id: ticket_id,
            })?;

        let availability = ticket.availability(event.event.status, now);
        if !availability.available {
            return Err(EventlyError::TicketUnavailable {
                ticket_id,
                reason: availability
                    .reason
                    .unwrap_or_else(|| "Ticket is not available".to_string()),
            });
        }

        if quantity > availability.available_quantity {
            return Err(EventlyError::TicketUnavailable {
                ticket_id,
                reason: "Selected ticket quantity not available".to_string(),
            });
        }

        Some(PurchaseCommand {
            ticket_id,
            quantity,
        })
    };

    for question in &event.questions {
        if !question.is_required {
            continue;
        }

        let answered = request.responses.iter().any(|answer| {
            answer.question_id == question.question_id && !answer.response_text.trim().is_empty()
        });

        if !answered {
            return Err(EventlyError::MissingRequiredResponse {
                question_id: question.question_id,
                question_text: question.question_text.clone(),
            });
        }
    }

    let mut responses = Vec::with_capacity(request.responses.len());
    for answer in &request.responses {
        let question = event
            .questions
            .iter()
            .find(|q| q.question_id == answer.question_id)
            .ok_or(EventlyError::InvalidQuestionReference {
                question_id: answer.question_id,
            })?;

        let text = answer.response_text.trim();
        if text.is_empty() {
            continue;
        }

        responses.push(ResolvedResponse {
            event_question_id: question.id,
            response_text: text.to_string(),
        });
    }

    Ok(ValidatedRegistration {
        purchase,
        responses,
    })
}
