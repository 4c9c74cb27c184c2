//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (repositories, the auth service, the event publisher) expose
//! typed errors generated by [`define_port_error!`]. Driving ports return the
//! domain [`crate::domain::Error`] so inbound adapters can map it straight to
//! a response.

mod macros;
pub(crate) use macros::define_port_error;

mod auth_service;
mod domain_event_handler;
mod domain_event_publisher;
mod item_repository;
mod revision_repository;
mod revisions_query;
mod sync_items_command;

#[cfg(test)]
pub use auth_service::{MockAuthService, MockAuthenticationMethodResolver};
pub use auth_service::{
    AuthService, AuthServiceError, AuthenticatedSession, AuthenticationMethodResolver,
    FixtureAuthService, MfaTransition,
};
#[cfg(test)]
pub use domain_event_handler::MockDomainEventHandler;
pub use domain_event_handler::DomainEventHandler;
#[cfg(test)]
pub use domain_event_publisher::MockDomainEventPublisher;
pub use domain_event_publisher::{
    DomainEventPublisher, DomainEventPublisherError, FixtureDomainEventPublisher,
};
#[cfg(test)]
pub use item_repository::MockItemRepository;
pub use item_repository::{
    FixtureItemRepository, ItemContentSize, ItemQuery, ItemRepository, ItemRepositoryError,
    ItemSortField, SortOrder, SyncTimeComparison,
};
#[cfg(test)]
pub use revision_repository::MockRevisionRepository;
pub use revision_repository::{
    FixtureRevisionRepository, RevisionRepository, RevisionRepositoryError,
};
#[cfg(test)]
pub use revisions_query::{MockRevisionsCommand, MockRevisionsQuery};
pub use revisions_query::{FixtureRevisions, RevisionsCommand, RevisionsQuery};
#[cfg(test)]
pub use sync_items_command::MockSyncItemsCommand;
pub use sync_items_command::{FixtureSyncItemsCommand, SyncItemsCommand, SyncItemsRequest};
