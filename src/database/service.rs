//! Database service layer
//!
//! Bundles the repositories over one connection pool so services and tests
//! can be wired from a single handle.

use crate::database::{
    DatabasePool, EventRepository, ParticipantRepository, RegistrationRepository, TicketRepository,
};

#[derive(Debug, Clone)]
pub struct DatabaseService {
    pub events: EventRepository,
    pub tickets: TicketRepository,
    pub participants: ParticipantRepository,
    pub registrations: RegistrationRepository,
}

impl DatabaseService {
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            events: EventRepository::new(pool.clone()),
            tickets: TicketRepository::new(pool.clone()),
            participants: ParticipantRepository::new(pool.clone()),
            registrations: RegistrationRepository::new(pool),
        }
    }
}
