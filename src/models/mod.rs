//! Data models module
//!
//! This module contains all data structures used throughout the application

pub mod event;
pub mod pagination;
pub mod participant;
pub mod question;
pub mod registration;
pub mod ticket;
pub mod user;

// Re-export commonly used models
pub use event::{
    CreateEventRequest, Event, EventFilters, EventPage, EventPricing, EventStatus, EventSummary,
    EventType, EventWithDetails, UpdateEventRequest,
};
pub use pagination::{Page, Pagination};
pub use participant::{Participant, ParticipantProfile};
pub use question::{EventQuestion, EventQuestionDetail, NewQuestion, Question, QuestionType};
pub use registration::{
    AnswerInput, Purchase, Registration, RegistrationDetails, RegistrationFilters,
    RegistrationRequest, RegistrationStatus, ResponseDetail,
};
pub use ticket::{NewTicket, Ticket, TicketAvailability, TicketStatus, UpdateTicketRequest};
pub use user::{AuthContext, OrganizerSummary, User, UserRole};
