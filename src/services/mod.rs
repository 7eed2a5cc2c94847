//! Business logic services
//!
//! Services own validation and orchestration on top of the repositories.

pub mod event;
pub mod registration;
pub mod ticket;

pub use event::EventService;
pub use registration::RegistrationService;
pub use ticket::TicketService;

use crate::config::Settings;
use crate::database::DatabaseService;

/// Bundles the services over one database handle
#[derive(Clone)]
pub struct ServiceFactory {
    pub events: EventService,
    pub tickets: TicketService,
    pub registrations: RegistrationService,
}

impl ServiceFactory {
    pub fn new(database: &DatabaseService, settings: Settings) -> Self {
        Self {
            events: EventService::new(database.events.clone(), settings.clone()),
            tickets: TicketService::new(database.tickets.clone(), database.events.clone()),
            registrations: RegistrationService::new(
                database.registrations.clone(),
                database.events.clone(),
                database.tickets.clone(),
                database.participants.clone(),
                settings,
            ),
        }
    }
}
