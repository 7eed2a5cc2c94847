//! Test data helpers for catalog and registration fixtures

use chrono::{DateTime, Duration, Utc};
use fake::faker::name::en::{FirstName, LastName};
use fake::Fake;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use evently::models::event::{CreateEventRequest, EventPricing, EventType};
use evently::models::participant::ParticipantProfile;
use evently::models::question::NewQuestion;
use evently::models::registration::RegistrationRequest;
use evently::models::ticket::NewTicket;
use evently::models::user::{AuthContext, UserRole};

/// Insert an account row and return its id
pub async fn seed_user(pool: &PgPool, email: &str, role: UserRole) -> Result<i64, sqlx::Error> {
    let first_name: String = FirstName().fake();
    let last_name: String = LastName().fake();
    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO users (email, first_name, last_name, password_hash, role)
        VALUES ($1, $2, $3, 'not-a-real-hash', $4)
        RETURNING id
        "#,
    )
    .bind(email)
    .bind(first_name)
    .bind(last_name)
    .bind(role)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

/// Email that cannot collide across fixtures
pub fn unique_email(prefix: &str) -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("{prefix}-{}@example.com", &id[..8])
}

/// Event window a week out, so creation-time validation passes
pub fn event_window() -> (DateTime<Utc>, DateTime<Utc>) {
    let start = Utc::now() + Duration::days(7);
    (start, start + Duration::days(1))
}

pub fn question(text: &str, is_required: bool, display_order: i32) -> NewQuestion {
    NewQuestion {
        question_text: text.to_string(),
        is_required,
        display_order,
    }
}

pub fn ticket(name: &str, price_cents: i64, quantity_total: i32) -> NewTicket {
    // An hour inside the event window, so a ticket built moments after
    // its event still ends before the stored end date
    let (_, end) = event_window();
    NewTicket {
        name: name.to_string(),
        description: None,
        price: Decimal::new(price_cents, 2),
        quantity_total,
        sales_start: Utc::now() - Duration::hours(1),
        sales_end: end - Duration::hours(1),
    }
}

pub fn free_event_request(
    name: &str,
    capacity: i32,
    questions: Vec<NewQuestion>,
) -> CreateEventRequest {
    let (start, end) = event_window();
    CreateEventRequest {
        name: name.to_string(),
        description: Some("Integration test event".to_string()),
        location: "Test Hall".to_string(),
        capacity,
        event_type: EventType::Social,
        start_date_time: start,
        end_date_time: end,
        pricing: EventPricing::Free,
        questions,
    }
}

pub fn paid_event_request(
    name: &str,
    capacity: i32,
    tickets: Vec<NewTicket>,
    questions: Vec<NewQuestion>,
) -> CreateEventRequest {
    let mut request = free_event_request(name, capacity, questions);
    request.pricing = EventPricing::Paid { tickets };
    request
}

pub fn profile(email: &str) -> ParticipantProfile {
    ParticipantProfile {
        email: email.to_string(),
        first_name: "Pat".to_string(),
        last_name: "Participant".to_string(),
        phone_number: Some("+15550100".to_string()),
        date_of_birth: None,
        address: None,
        city: None,
        state: None,
        zip_code: None,
        country: None,
    }
}

pub fn registration_request(event_id: i64, email: &str) -> RegistrationRequest {
    RegistrationRequest {
        event_id,
        participant: profile(email),
        ticket_id: None,
        quantity: None,
        responses: vec![],
        user_id: None,
    }
}

pub fn admin_ctx(user_id: i64) -> AuthContext {
    AuthContext {
        user_id,
        role: UserRole::Admin,
    }
}

pub fn organizer_ctx(user_id: i64) -> AuthContext {
    AuthContext {
        user_id,
        role: UserRole::Organizer,
    }
}

pub fn participant_ctx(user_id: i64) -> AuthContext {
    AuthContext {
        user_id,
        role: UserRole::Participant,
    }
}
