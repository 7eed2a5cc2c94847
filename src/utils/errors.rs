//! Error handling for evently
//!
//! This module defines the main error type used throughout the application
//! and provides a unified error handling strategy. Every business-rule
//! violation is raised before the owning transaction commits, so callers
//! never observe partial writes.

use thiserror::Error;

/// Main error type for the evently application
#[derive(Error, Debug)]
pub enum EventlyError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Event is full: capacity {capacity} reached for event {event_id}")]
    CapacityExceeded { event_id: i64, capacity: i32 },

    #[error("Ticket and quantity are required for paid events")]
    MissingTicketSelection,

    #[error("Ticket {ticket_id} unavailable: {reason}")]
    TicketUnavailable { ticket_id: i64, reason: String },

    #[error("Missing required response to question: {question_text}")]
    MissingRequiredResponse {
        question_id: i64,
        question_text: String,
    },

    #[error("Question {question_id} does not belong to this event")]
    InvalidQuestionReference { question_id: i64 },

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Permission denied: {0}")]
    Authorization(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for evently operations
pub type Result<T> = std::result::Result<T, EventlyError>;

impl EventlyError {
    /// Stable kind string surfaced to callers alongside the message.
    pub fn kind(&self) -> &'static str {
        match self {
            EventlyError::Database(_) => "InternalError",
            EventlyError::Migration(_) => "InternalError",
            EventlyError::Config(_) => "ConfigError",
            EventlyError::NotFound { .. } => "NotFound",
            EventlyError::Validation(_) => "ValidationError",
            EventlyError::CapacityExceeded { .. } => "CapacityExceeded",
            EventlyError::MissingTicketSelection => "MissingTicketSelection",
            EventlyError::TicketUnavailable { .. } => "TicketUnavailable",
            EventlyError::MissingRequiredResponse { .. } => "MissingRequiredResponse",
            EventlyError::InvalidQuestionReference { .. } => "InvalidQuestionReference",
            EventlyError::InvalidStateTransition { .. } => "ValidationError",
            EventlyError::Authentication(_) => "AuthenticationError",
            EventlyError::Authorization(_) => "AuthorizationError",
            EventlyError::Conflict(_) => "ConflictError",
            EventlyError::Serialization(_) => "InternalError",
            EventlyError::Io(_) => "InternalError",
        }
    }

    /// Whether the error is the caller's fault. HTTP adapters map client
    /// errors to 4xx and everything else to 500.
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            EventlyError::Database(_)
                | EventlyError::Migration(_)
                | EventlyError::Config(_)
                | EventlyError::Serialization(_)
                | EventlyError::Io(_)
        )
    }
}
