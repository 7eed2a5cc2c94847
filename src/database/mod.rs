//! Database module
//!
//! Connection management, repositories and the bundling service.

pub mod connection;
pub mod repositories;
pub mod service;

pub use connection::{create_pool, health_check, run_migrations, DatabaseConfig, DatabasePool};
pub use repositories::{
    EventRepository, ParticipantRepository, RegistrationRepository, TicketRepository,
};
pub use service::DatabaseService;
