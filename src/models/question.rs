//! Question and event-question models
//!
//! A `Question` holds reusable text; the `EventQuestion` join row binds it
//! to one event with per-event requiredness and display order, and is what
//! responses reference.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "question_type", rename_all = "UPPERCASE")]
pub enum QuestionType {
    Text,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Question {
    pub id: i64,
    pub question_text: String,
    pub question_type: QuestionType,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EventQuestion {
    pub id: i64,
    pub event_id: i64,
    pub question_id: i64,
    pub is_required: bool,
    pub display_order: i32,
}

/// Event-question joined with its question text, as presented to callers
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EventQuestionDetail {
    pub id: i64,
    pub question_id: i64,
    pub question_text: String,
    pub question_type: QuestionType,
    pub is_required: bool,
    pub display_order: i32,
}

/// Question supplied when creating or updating an event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewQuestion {
    pub question_text: String,
    pub is_required: bool,
    pub display_order: i32,
}
