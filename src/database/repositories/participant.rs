//! Participant repository implementation
//!
//! Participants are keyed by email. The find-or-create used by the
//! registration engine runs on the registration transaction so two
//! concurrent registrations with the same new email cannot create
//! duplicates: the insert is conflict-free and the unique constraint
//! arbitrates.

use sqlx::{PgPool, Postgres, Transaction};

use crate::models::participant::{Participant, ParticipantProfile};
use crate::utils::errors::{EventlyError, Result};

const PARTICIPANT_COLUMNS: &str = "id, email, first_name, last_name, phone_number, date_of_birth, \
     address, city, state, zip_code, country, user_id, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct ParticipantRepository {
    pool: PgPool,
}

impl ParticipantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find participant by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Participant>> {
        let participant = sqlx::query_as::<_, Participant>(&format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM participants WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(participant)
    }

    /// Find participant by email
    pub async fn find_by_email(&self, email: &str) -> Result<Option<Participant>> {
        let participant = sqlx::query_as::<_, Participant>(&format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM participants WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(participant)
    }

    /// Find-or-create by email inside an open transaction. An existing
    /// participant's stored profile is never overwritten by a new
    /// registration.
    pub async fn find_or_create_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        profile: &ParticipantProfile,
        user_id: Option<i64>,
    ) -> Result<Participant> {
        let inserted = sqlx::query_as::<_, Participant>(&format!(
            r#"
            INSERT INTO participants (email, first_name, last_name, phone_number, date_of_birth,
                                      address, city, state, zip_code, country, user_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (email) DO NOTHING
            RETURNING {PARTICIPANT_COLUMNS}
            "#
        ))
        .bind(&profile.email)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.phone_number)
        .bind(profile.date_of_birth)
        .bind(&profile.address)
        .bind(&profile.city)
        .bind(&profile.state)
        .bind(&profile.zip_code)
        .bind(&profile.country)
        .bind(user_id)
        .fetch_optional(&mut **tx)
        .await?;

        if let Some(participant) = inserted {
            return Ok(participant);
        }

        // Conflict: someone holds this email already, reuse them
        let existing = sqlx::query_as::<_, Participant>(&format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM participants WHERE email = $1"
        ))
        .bind(&profile.email)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| {
            EventlyError::Conflict(format!(
                "Participant with email {} vanished during registration",
                profile.email
            ))
        })?;

        Ok(existing)
    }
}
