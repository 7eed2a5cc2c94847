//! Ticket repository implementation
//!
//! Plain row access for ticket types. `quantity_sold` is only ever written
//! by the registration transaction (see the registration repository); this
//! repository handles catalog-side CRUD.

use chrono::Utc;
use sqlx::PgPool;

use crate::models::ticket::{NewTicket, Ticket, UpdateTicketRequest};
use crate::utils::errors::Result;

const TICKET_COLUMNS: &str = "id, event_id, name, description, price, quantity_total, \
     quantity_sold, sales_start, sales_end, status, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct TicketRepository {
    pool: PgPool,
}

impl TicketRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a ticket type for an event
    pub async fn create(&self, event_id: i64, request: &NewTicket) -> Result<Ticket> {
        let ticket = sqlx::query_as::<_, Ticket>(&format!(
            r#"
            INSERT INTO tickets (event_id, name, description, price, quantity_total, quantity_sold,
                                 sales_start, sales_end, status)
            VALUES ($1, $2, $3, $4, $5, 0, $6, $7, 'ACTIVE')
            RETURNING {TICKET_COLUMNS}
            "#
        ))
        .bind(event_id)
        .bind(&request.name)
        .bind(&request.description)
        .bind(request.price)
        .bind(request.quantity_total)
        .bind(request.sales_start)
        .bind(request.sales_end)
        .fetch_one(&self.pool)
        .await?;

        Ok(ticket)
    }

    /// Find ticket by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Ticket>> {
        let ticket = sqlx::query_as::<_, Ticket>(&format!(
            "SELECT {TICKET_COLUMNS} FROM tickets WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(ticket)
    }

    /// ACTIVE tickets for an event, cheapest first
    pub async fn find_active_by_event(&self, event_id: i64) -> Result<Vec<Ticket>> {
        let tickets = sqlx::query_as::<_, Ticket>(&format!(
            "SELECT {TICKET_COLUMNS} FROM tickets WHERE event_id = $1 AND status = 'ACTIVE' ORDER BY price ASC"
        ))
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tickets)
    }

    /// Update ticket fields
    pub async fn update(&self, id: i64, request: &UpdateTicketRequest) -> Result<Ticket> {
        let ticket = sqlx::query_as::<_, Ticket>(&format!(
            r#"
            UPDATE tickets
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                price = COALESCE($4, price),
                quantity_total = COALESCE($5, quantity_total),
                sales_start = COALESCE($6, sales_start),
                sales_end = COALESCE($7, sales_end),
                status = COALESCE($8, status),
                updated_at = $9
            WHERE id = $1
            RETURNING {TICKET_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&request.name)
        .bind(&request.description)
        .bind(request.price)
        .bind(request.quantity_total)
        .bind(request.sales_start)
        .bind(request.sales_end)
        .bind(request.status)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(ticket)
    }

    /// Delete a ticket type. The service rejects this once purchases exist.
    pub async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM tickets WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
