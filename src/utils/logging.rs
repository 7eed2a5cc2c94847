//! Logging configuration and setup
//!
//! This module provides logging initialization and structured logging
//! utilities for the evently application.

use crate::config::LoggingConfig;
use crate::utils::errors::Result;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging based on configuration.
///
/// The returned guard owns the file writer's flush thread; hold it for the
/// lifetime of the process or buffered log lines are lost.
pub fn init_logging(config: &LoggingConfig) -> Result<WorkerGuard> {
    let file_appender = tracing_appender::rolling::daily(&config.file_path, "evently.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.level))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
        .with(tracing_subscriber::fmt::layer().with_writer(non_blocking))
        .init();

    info!("Logging initialized with level: {}", config.level);
    Ok(guard)
}

/// Log catalog actions (create/update/status/delete) with structured data
pub fn log_event_action(event_id: i64, action: &str, user_id: i64, details: Option<&str>) {
    info!(
        event_id = event_id,
        action = action,
        user_id = user_id,
        details = details,
        "Event action performed"
    );
}

/// Log a completed registration
pub fn log_registration(registration_id: i64, event_id: i64, participant_id: i64, paid: bool) {
    info!(
        registration_id = registration_id,
        event_id = event_id,
        participant_id = participant_id,
        paid = paid,
        "Registration committed"
    );
}

/// Log a rejected registration attempt
pub fn log_registration_rejected(event_id: i64, kind: &str, message: &str) {
    warn!(
        event_id = event_id,
        kind = kind,
        message = message,
        "Registration rejected"
    );
}

