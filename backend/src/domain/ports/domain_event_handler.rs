//! Driving port for consuming domain events.

use async_trait::async_trait;

use crate::domain::{DomainEvent, Error};

/// Reacts to events delivered by an event transport.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DomainEventHandler: Send + Sync {
    /// Handle one event. Events the handler does not care about are ignored.
    async fn handle(&self, event: &DomainEvent) -> Result<(), Error>;
}
