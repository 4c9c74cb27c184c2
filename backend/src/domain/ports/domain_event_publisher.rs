//! Port for publishing domain events.
//!
//! Delivery is fire-and-forget from the sync engine's point of view:
//! callers log publication failures and carry on.

use async_trait::async_trait;
use tracing::debug;

use crate::domain::DomainEvent;

use super::define_port_error;

define_port_error! {
    /// Errors raised by event publisher adapters.
    pub enum DomainEventPublisherError {
        /// The transport refused or dropped the event.
        Unavailable { message: String } =>
            "domain event transport unavailable: {message}",
    }
}

/// Port for emitting domain events.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DomainEventPublisher: Send + Sync {
    /// Publish one event.
    async fn publish(&self, event: DomainEvent) -> Result<(), DomainEventPublisherError>;
}

/// Publisher that only logs events.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureDomainEventPublisher;

#[async_trait]
impl DomainEventPublisher for FixtureDomainEventPublisher {
    async fn publish(&self, event: DomainEvent) -> Result<(), DomainEventPublisherError> {
        debug!(event_type = event.event_type(), "discarding domain event");
        Ok(())
    }
}
