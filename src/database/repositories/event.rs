//! Event repository implementation
//!
//! Catalog storage: event rows, their tickets and question links, the
//! filtered listing, and the transactional writes behind create, update,
//! cancellation and delete.

use chrono::Utc;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::models::event::{
    CreateEventRequest, Event, EventFilters, EventStatus, EventSummary, EventWithDetails,
    UpdateEventRequest,
};
use crate::models::pagination::Page;
use crate::models::question::{EventQuestionDetail, NewQuestion, Question};
use crate::models::ticket::{NewTicket, Ticket};
use crate::models::user::OrganizerSummary;
use crate::utils::errors::{EventlyError, Result};

const EVENT_COLUMNS: &str = "id, organiser_id, name, description, location, capacity, event_type, \
     is_free, start_date_time, end_date_time, status, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create an event with its tickets and questions in one transaction
    pub async fn create(
        &self,
        organiser_id: i64,
        request: &CreateEventRequest,
    ) -> Result<EventWithDetails> {
        let mut tx = self.pool.begin().await?;

        let event = sqlx::query_as::<_, Event>(&format!(
            r#"
            INSERT INTO events (organiser_id, name, description, location, capacity, event_type,
                                is_free, start_date_time, end_date_time, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'DRAFT')
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(organiser_id)
        .bind(&request.name)
        .bind(&request.description)
        .bind(&request.location)
        .bind(request.capacity)
        .bind(request.event_type)
        .bind(request.pricing.is_free())
        .bind(request.start_date_time)
        .bind(request.end_date_time)
        .fetch_one(&mut *tx)
        .await?;

        let mut tickets = Vec::new();
        for ticket in request.pricing.tickets() {
            tickets.push(Self::insert_ticket(&mut tx, event.id, ticket).await?);
        }

        let mut questions = Vec::new();
        for question in &request.questions {
            questions.push(Self::insert_question(&mut tx, event.id, question).await?);
        }

        tx.commit().await?;

        let organizer = self.find_organizer(organiser_id).await?;

        Ok(EventWithDetails {
            event,
            organizer,
            tickets,
            questions,
            registration_count: 0,
        })
    }

    async fn insert_ticket(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        event_id: i64,
        ticket: &NewTicket,
    ) -> Result<Ticket> {
        let ticket = sqlx::query_as::<_, Ticket>(
            r#"
            INSERT INTO tickets (event_id, name, description, price, quantity_total, quantity_sold,
                                 sales_start, sales_end, status)
            VALUES ($1, $2, $3, $4, $5, 0, $6, $7, 'ACTIVE')
            RETURNING id, event_id, name, description, price, quantity_total, quantity_sold,
                      sales_start, sales_end, status, created_at, updated_at
            "#,
        )
        .bind(event_id)
        .bind(&ticket.name)
        .bind(&ticket.description)
        .bind(ticket.price)
        .bind(ticket.quantity_total)
        .bind(ticket.sales_start)
        .bind(ticket.sales_end)
        .fetch_one(&mut **tx)
        .await?;

        Ok(ticket)
    }

    async fn insert_question(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        event_id: i64,
        question: &NewQuestion,
    ) -> Result<EventQuestionDetail> {
        let created = sqlx::query_as::<_, Question>(
            r#"
            INSERT INTO questions (question_text, question_type)
            VALUES ($1, 'TEXT')
            RETURNING id, question_text, question_type, created_at
            "#,
        )
        .bind(&question.question_text)
        .fetch_one(&mut **tx)
        .await?;

        let (link_id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO event_questions (event_id, question_id, is_required, display_order)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(event_id)
        .bind(created.id)
        .bind(question.is_required)
        .bind(question.display_order)
        .fetch_one(&mut **tx)
        .await?;

        Ok(EventQuestionDetail {
            id: link_id,
            question_id: created.id,
            question_text: created.question_text,
            question_type: created.question_type,
            is_required: question.is_required,
            display_order: question.display_order,
        })
    }

    /// Find event by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Event>> {
        let event = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(event)
    }

    /// Load the fully hydrated event: organiser, ACTIVE tickets, questions
    /// in display order, registration count
    pub async fn find_with_details(&self, id: i64) -> Result<Option<EventWithDetails>> {
        let Some(event) = self.find_by_id(id).await? else {
            return Ok(None);
        };

        let organizer = self.find_organizer(event.organiser_id).await?;

        let tickets = sqlx::query_as::<_, Ticket>(
            r#"
            SELECT id, event_id, name, description, price, quantity_total, quantity_sold,
                   sales_start, sales_end, status, created_at, updated_at
            FROM tickets
            WHERE event_id = $1 AND status = 'ACTIVE'
            ORDER BY price ASC
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let questions = self.find_questions(id).await?;
        let registration_count = self.count_registrations(id).await?;

        Ok(Some(EventWithDetails {
            event,
            organizer,
            tickets,
            questions,
            registration_count,
        }))
    }

    /// Event questions joined with their text, in display order
    pub async fn find_questions(&self, event_id: i64) -> Result<Vec<EventQuestionDetail>> {
        let questions = sqlx::query_as::<_, EventQuestionDetail>(
            r#"
            SELECT eq.id, eq.question_id, q.question_text, q.question_type,
                   eq.is_required, eq.display_order
            FROM event_questions eq
            INNER JOIN questions q ON q.id = eq.question_id
            WHERE eq.event_id = $1
            ORDER BY eq.display_order ASC
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(questions)
    }

    async fn find_organizer(&self, organiser_id: i64) -> Result<OrganizerSummary> {
        let organizer = sqlx::query_as::<_, OrganizerSummary>(
            "SELECT id, first_name, last_name FROM users WHERE id = $1",
        )
        .bind(organiser_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(EventlyError::NotFound {
            entity: "User",
            id: organiser_id,
        })?;

        Ok(organizer)
    }

    /// List events with filters and pagination; returns the page of rows
    /// and the total matching count
    pub async fn list(
        &self,
        filters: &EventFilters,
        page: Page,
    ) -> Result<(Vec<EventSummary>, i64)> {
        let mut query = QueryBuilder::<Postgres>::new(
            r#"
            SELECT e.id, e.organiser_id, e.name, e.description, e.location, e.capacity,
                   e.event_type, e.is_free, e.start_date_time, e.end_date_time, e.status,
                   u.first_name AS organizer_first_name, u.last_name AS organizer_last_name,
                   (SELECT COUNT(*) FROM registrations r WHERE r.event_id = e.id) AS registration_count
            FROM events e
            INNER JOIN users u ON u.id = e.organiser_id
            WHERE TRUE
            "#,
        );
        Self::push_filters(&mut query, filters);
        query.push(" ORDER BY e.start_date_time ASC LIMIT ");
        query.push_bind(page.limit);
        query.push(" OFFSET ");
        query.push_bind(page.offset());

        let events = query
            .build_query_as::<EventSummary>()
            .fetch_all(&self.pool)
            .await?;

        let mut count_query =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM events e WHERE TRUE");
        Self::push_filters(&mut count_query, filters);
        let (total,): (i64,) = count_query.build_query_as().fetch_one(&self.pool).await?;

        Ok((events, total))
    }

    fn push_filters(query: &mut QueryBuilder<'_, Postgres>, filters: &EventFilters) {
        if let Some(status) = filters.status {
            query.push(" AND e.status = ").push_bind(status);
        } else if !filters.include_all_statuses && filters.organiser_id.is_none() {
            // Anonymous browsing only sees published events
            query
                .push(" AND e.status = ")
                .push_bind(EventStatus::Published);
        }

        if let Some(search) = &filters.search {
            let pattern = format!("%{search}%");
            query
                .push(" AND (e.name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR e.description ILIKE ")
                .push_bind(pattern)
                .push(")");
        }

        if let Some(event_type) = filters.event_type {
            query.push(" AND e.event_type = ").push_bind(event_type);
        }

        if let Some(location) = &filters.location {
            query
                .push(" AND e.location ILIKE ")
                .push_bind(format!("%{location}%"));
        }

        if let Some(start) = filters.start_date {
            query.push(" AND e.start_date_time >= ").push_bind(start);
        }

        if let Some(end) = filters.end_date {
            query.push(" AND e.end_date_time <= ").push_bind(end);
        }

        if let Some(organiser_id) = filters.organiser_id {
            query.push(" AND e.organiser_id = ").push_bind(organiser_id);
        }

        if let Some(is_free) = filters.is_free {
            query.push(" AND e.is_free = ").push_bind(is_free);
        }
    }

    /// Count registrations for an event. Deliberately counts every status,
    /// including CANCELLED, matching the capacity semantics of the original
    /// system.
    pub async fn count_registrations(&self, event_id: i64) -> Result<i64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM registrations WHERE event_id = $1")
                .bind(event_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    pub async fn count_questions(&self, event_id: i64) -> Result<i64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM event_questions WHERE event_id = $1")
                .bind(event_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    pub async fn count_tickets(&self, event_id: i64) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tickets WHERE event_id = $1")
            .bind(event_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Apply a partial update. When tickets are supplied the unsold rows are
    /// replaced; when questions are supplied the unanswered links are
    /// replaced. All in one transaction.
    ///
    /// The paid-to-free toggle is guarded here, under the same event row
    /// lock the registration commit takes: the registration count cannot
    /// change between the guard and the write.
    pub async fn update(&self, event_id: i64, request: &UpdateEventRequest) -> Result<Event> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1 FOR UPDATE"
        ))
        .bind(event_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(EventlyError::NotFound {
            entity: "Event",
            id: event_id,
        })?;

        if request.is_free == Some(true) && !existing.is_free {
            let (registration_count,): (i64,) =
                sqlx::query_as("SELECT COUNT(*) FROM registrations WHERE event_id = $1")
                    .bind(event_id)
                    .fetch_one(&mut *tx)
                    .await?;
            if registration_count > 0 {
                return Err(EventlyError::Validation(
                    "Cannot change a paid event to free when registrations exist".to_string(),
                ));
            }

            // Ticket rows are deactivated rather than deleted so historic
            // pricing stays queryable
            sqlx::query(
                "UPDATE tickets SET status = 'INACTIVE', updated_at = NOW() WHERE event_id = $1",
            )
            .bind(event_id)
            .execute(&mut *tx)
            .await?;
        }

        let event = sqlx::query_as::<_, Event>(&format!(
            r#"
            UPDATE events
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                location = COALESCE($4, location),
                capacity = COALESCE($5, capacity),
                event_type = COALESCE($6, event_type),
                is_free = COALESCE($7, is_free),
                start_date_time = COALESCE($8, start_date_time),
                end_date_time = COALESCE($9, end_date_time),
                updated_at = $10
            WHERE id = $1
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(event_id)
        .bind(&request.name)
        .bind(&request.description)
        .bind(&request.location)
        .bind(request.capacity)
        .bind(request.event_type)
        .bind(request.is_free)
        .bind(request.start_date_time)
        .bind(request.end_date_time)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        if !event.is_free {
            if let Some(tickets) = &request.tickets {
                if !tickets.is_empty() {
                    // Sold tickets are referenced by purchases and stay put
                    sqlx::query("DELETE FROM tickets WHERE event_id = $1 AND quantity_sold = 0")
                        .bind(event_id)
                        .execute(&mut *tx)
                        .await?;

                    for ticket in tickets {
                        Self::insert_ticket(&mut tx, event_id, ticket).await?;
                    }
                }
            }
        }

        if let Some(questions) = &request.questions {
            if !questions.is_empty() {
                // Links that already have responses must survive the swap
                sqlx::query(
                    r#"
                    DELETE FROM event_questions eq
                    WHERE eq.event_id = $1
                      AND NOT EXISTS (
                          SELECT 1 FROM responses r WHERE r.event_question_id = eq.id
                      )
                    "#,
                )
                .bind(event_id)
                .execute(&mut *tx)
                .await?;

                for question in questions {
                    Self::insert_question(&mut tx, event_id, question).await?;
                }
            }
        }

        tx.commit().await?;

        Ok(event)
    }

    /// Plain status write; lifecycle guards live in the service
    pub async fn update_status(&self, event_id: i64, status: EventStatus) -> Result<Event> {
        let event = sqlx::query_as::<_, Event>(&format!(
            r#"
            UPDATE events SET status = $2, updated_at = $3
            WHERE id = $1
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(event_id)
        .bind(status)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(event)
    }

    /// Cancel an event and bulk-cancel its live registrations atomically.
    /// Returns the updated event and the number of registrations cancelled.
    pub async fn cancel_with_registrations(&self, event_id: i64) -> Result<(Event, u64)> {
        let mut tx = self.pool.begin().await?;

        let cancelled = sqlx::query(
            r#"
            UPDATE registrations
            SET status = 'CANCELLED', updated_at = NOW()
            WHERE event_id = $1 AND status IN ('PENDING', 'CONFIRMED')
            "#,
        )
        .bind(event_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let event = sqlx::query_as::<_, Event>(&format!(
            r#"
            UPDATE events SET status = 'CANCELLED', updated_at = NOW()
            WHERE id = $1
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(event_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((event, cancelled))
    }

    /// Delete an event and its dependent rows. The service rejects this
    /// while registrations exist.
    pub async fn delete(&self, event_id: i64) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM event_questions WHERE event_id = $1")
            .bind(event_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM tickets WHERE event_id = $1")
            .bind(event_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(event_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }
}
