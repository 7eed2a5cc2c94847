//! Registration repository implementation
//!
//! Owns the one write path with real invariants: the registration commit.
//! Capacity is enforced with a locking read on the event row and an
//! in-transaction recount; inventory with a conditional increment whose
//! rows-affected count decides the outcome. Either everything lands
//! (participant, registration, purchase, inventory, responses) or nothing
//! does.

use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::models::event::Event;
use crate::models::participant::ParticipantProfile;
use crate::models::registration::{
    Purchase, Registration, RegistrationDetails, RegistrationFilters, RegistrationStatus,
    ResponseDetail,
};
use crate::models::ticket::Ticket;
use crate::models::user::{AuthContext, UserRole};
use crate::models::pagination::Page;
use crate::utils::errors::{EventlyError, Result};

use super::participant::ParticipantRepository;

/// Ticket selection of a paid registration
#[derive(Debug, Clone, Copy)]
pub struct PurchaseCommand {
    pub ticket_id: i64,
    pub quantity: i32,
}

/// Answer resolved to its event-question link
#[derive(Debug, Clone)]
pub struct ResolvedResponse {
    pub event_question_id: i64,
    pub response_text: String,
}

/// Pre-validated registration write, produced by the registration service
#[derive(Debug, Clone)]
pub struct RegistrationCommand {
    pub event_id: i64,
    pub profile: ParticipantProfile,
    pub user_id: Option<i64>,
    pub purchase: Option<PurchaseCommand>,
    pub responses: Vec<ResolvedResponse>,
}

#[derive(Debug, Clone)]
pub struct RegistrationRepository {
    pool: PgPool,
}

impl RegistrationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Commit a registration atomically and return its id.
    ///
    /// The event row lock serializes registrations per event, which makes
    /// the capacity recount race-safe; the ticket increment only applies
    /// while inventory remains, so two concurrent purchases can never
    /// jointly oversell.
    pub async fn register(
        &self,
        participants: &ParticipantRepository,
        command: &RegistrationCommand,
    ) -> Result<i64> {
        let mut tx = self.pool.begin().await?;

        let locked: Option<(i32,)> =
            sqlx::query_as("SELECT capacity FROM events WHERE id = $1 FOR UPDATE")
                .bind(command.event_id)
                .fetch_optional(&mut *tx)
                .await?;

        let Some((capacity,)) = locked else {
            return Err(EventlyError::NotFound {
                entity: "Event",
                id: command.event_id,
            });
        };

        let (registration_count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM registrations WHERE event_id = $1")
                .bind(command.event_id)
                .fetch_one(&mut *tx)
                .await?;

        if registration_count >= capacity as i64 {
            return Err(EventlyError::CapacityExceeded {
                event_id: command.event_id,
                capacity,
            });
        }

        let participant = participants
            .find_or_create_tx(&mut tx, &command.profile, command.user_id)
            .await?;

        let registration = sqlx::query_as::<_, Registration>(
            r#"
            INSERT INTO registrations (event_id, participant_id, user_id, status)
            VALUES ($1, $2, $3, 'CONFIRMED')
            RETURNING id, event_id, participant_id, user_id, status, created_at, updated_at
            "#,
        )
        .bind(command.event_id)
        .bind(participant.id)
        .bind(command.user_id)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(purchase) = command.purchase {
            let sold: Option<(Decimal,)> = sqlx::query_as(
                r#"
                UPDATE tickets
                SET quantity_sold = quantity_sold + $3,
                    status = CASE
                        WHEN quantity_sold + $3 >= quantity_total THEN 'SOLD_OUT'::ticket_status
                        ELSE status
                    END,
                    updated_at = NOW()
                WHERE id = $1
                  AND event_id = $2
                  AND status = 'ACTIVE'
                  AND quantity_sold + $3 <= quantity_total
                RETURNING price
                "#,
            )
            .bind(purchase.ticket_id)
            .bind(command.event_id)
            .bind(purchase.quantity)
            .fetch_optional(&mut *tx)
            .await?;

            let Some((unit_price,)) = sold else {
                // Lost the inventory race since the pre-check; abort cleanly
                return Err(EventlyError::TicketUnavailable {
                    ticket_id: purchase.ticket_id,
                    reason: "Selected ticket quantity not available".to_string(),
                });
            };

            let total_price = unit_price * Decimal::from(purchase.quantity);
            sqlx::query(
                r#"
                INSERT INTO purchases (registration_id, ticket_id, quantity, unit_price, total_price)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(registration.id)
            .bind(purchase.ticket_id)
            .bind(purchase.quantity)
            .bind(unit_price)
            .bind(total_price)
            .execute(&mut *tx)
            .await?;
        }

        for response in &command.responses {
            sqlx::query(
                r#"
                INSERT INTO responses (registration_id, event_question_id, response_text)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(registration.id)
            .bind(response.event_question_id)
            .bind(&response.response_text)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(registration.id)
    }

    /// Find registration by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Registration>> {
        let registration = sqlx::query_as::<_, Registration>(
            r#"
            SELECT id, event_id, participant_id, user_id, status, created_at, updated_at
            FROM registrations WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(registration)
    }

    /// Hydrate a registration: participant, event, purchase + ticket,
    /// responses with their questions in display order
    pub async fn find_details(&self, id: i64) -> Result<Option<RegistrationDetails>> {
        let Some(registration) = self.find_by_id(id).await? else {
            return Ok(None);
        };

        let participant = sqlx::query_as::<_, crate::models::participant::Participant>(
            r#"
            SELECT id, email, first_name, last_name, phone_number, date_of_birth,
                   address, city, state, zip_code, country, user_id, created_at, updated_at
            FROM participants WHERE id = $1
            "#,
        )
        .bind(registration.participant_id)
        .fetch_one(&self.pool)
        .await?;

        let event = sqlx::query_as::<_, Event>(
            r#"
            SELECT id, organiser_id, name, description, location, capacity, event_type,
                   is_free, start_date_time, end_date_time, status, created_at, updated_at
            FROM events WHERE id = $1
            "#,
        )
        .bind(registration.event_id)
        .fetch_one(&self.pool)
        .await?;

        let purchase = sqlx::query_as::<_, Purchase>(
            r#"
            SELECT id, registration_id, ticket_id, quantity, unit_price, total_price, created_at
            FROM purchases WHERE registration_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let ticket = match &purchase {
            Some(purchase) => {
                sqlx::query_as::<_, Ticket>(
                    r#"
                    SELECT id, event_id, name, description, price, quantity_total, quantity_sold,
                           sales_start, sales_end, status, created_at, updated_at
                    FROM tickets WHERE id = $1
                    "#,
                )
                .bind(purchase.ticket_id)
                .fetch_optional(&self.pool)
                .await?
            }
            None => None,
        };

        let responses = sqlx::query_as::<_, ResponseDetail>(
            r#"
            SELECT r.id, r.event_question_id, q.question_text, eq.is_required,
                   eq.display_order, r.response_text
            FROM responses r
            INNER JOIN event_questions eq ON eq.id = r.event_question_id
            INNER JOIN questions q ON q.id = eq.question_id
            WHERE r.registration_id = $1
            ORDER BY eq.display_order ASC
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(RegistrationDetails {
            registration,
            participant,
            event,
            purchase,
            ticket,
            responses,
        }))
    }

    /// List registrations visible to the caller: admins see everything,
    /// organisers their events' registrations plus their own, participants
    /// only their own
    pub async fn list(
        &self,
        filters: &RegistrationFilters,
        ctx: &AuthContext,
        page: Page,
    ) -> Result<(Vec<Registration>, i64)> {
        let mut query = QueryBuilder::<Postgres>::new(
            r#"
            SELECT r.id, r.event_id, r.participant_id, r.user_id, r.status,
                   r.created_at, r.updated_at
            FROM registrations r
            INNER JOIN events e ON e.id = r.event_id
            WHERE TRUE
            "#,
        );
        Self::push_filters(&mut query, filters, ctx);
        query.push(" ORDER BY r.created_at DESC LIMIT ");
        query.push_bind(page.limit);
        query.push(" OFFSET ");
        query.push_bind(page.offset());

        let registrations = query
            .build_query_as::<Registration>()
            .fetch_all(&self.pool)
            .await?;

        let mut count_query = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM registrations r INNER JOIN events e ON e.id = r.event_id WHERE TRUE",
        );
        Self::push_filters(&mut count_query, filters, ctx);
        let (total,): (i64,) = count_query.build_query_as().fetch_one(&self.pool).await?;

        Ok((registrations, total))
    }

    fn push_filters(
        query: &mut QueryBuilder<'_, Postgres>,
        filters: &RegistrationFilters,
        ctx: &AuthContext,
    ) {
        if let Some(event_id) = filters.event_id {
            query.push(" AND r.event_id = ").push_bind(event_id);
        }

        if let Some(user_id) = filters.user_id {
            query.push(" AND r.user_id = ").push_bind(user_id);
        }

        match ctx.role {
            UserRole::Admin => {}
            UserRole::Organizer => {
                query
                    .push(" AND (e.organiser_id = ")
                    .push_bind(ctx.user_id)
                    .push(" OR r.user_id = ")
                    .push_bind(ctx.user_id)
                    .push(")");
            }
            UserRole::Participant => {
                query.push(" AND r.user_id = ").push_bind(ctx.user_id);
            }
        }
    }

    /// Set a single registration's status
    pub async fn update_status(&self, id: i64, status: RegistrationStatus) -> Result<Registration> {
        let registration = sqlx::query_as::<_, Registration>(
            r#"
            UPDATE registrations SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, event_id, participant_id, user_id, status, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        Ok(registration)
    }
}
