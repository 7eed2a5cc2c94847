//! Database repositories module
//!
//! This module contains all repository implementations for data access

pub mod event;
pub mod participant;
pub mod registration;
pub mod ticket;

// Re-export repositories
pub use event::EventRepository;
pub use participant::ParticipantRepository;
pub use registration::{
    PurchaseCommand, RegistrationCommand, RegistrationRepository, ResolvedResponse,
};
pub use ticket::TicketRepository;
