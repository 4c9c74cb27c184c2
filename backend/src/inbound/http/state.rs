//! Shared HTTP adapter state.
//!
//! Handlers accept this state via `actix_web::web::Data` so they only depend
//! on domain ports and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    AuthenticationMethodResolver, FixtureAuthService, FixtureRevisions, FixtureSyncItemsCommand,
    RevisionsCommand, RevisionsQuery, SyncItemsCommand,
};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub sync_items: Arc<dyn SyncItemsCommand>,
    pub revisions: Arc<dyn RevisionsQuery>,
    pub revisions_command: Arc<dyn RevisionsCommand>,
    pub authentication: Arc<dyn AuthenticationMethodResolver>,
}

impl HttpState {
    /// Bundle the ports used by the handlers.
    pub fn new(
        sync_items: Arc<dyn SyncItemsCommand>,
        revisions: Arc<dyn RevisionsQuery>,
        revisions_command: Arc<dyn RevisionsCommand>,
        authentication: Arc<dyn AuthenticationMethodResolver>,
    ) -> Self {
        Self {
            sync_items,
            revisions,
            revisions_command,
            authentication,
        }
    }

    /// State backed entirely by fixture ports.
    pub fn fixtures() -> Self {
        Self::new(
            Arc::new(FixtureSyncItemsCommand),
            Arc::new(FixtureRevisions),
            Arc::new(FixtureRevisions),
            Arc::new(FixtureAuthService),
        )
    }

    /// Replace the sync use case.
    #[must_use]
    pub fn with_sync_items(mut self, sync_items: Arc<dyn SyncItemsCommand>) -> Self {
        self.sync_items = sync_items;
        self
    }

    /// Replace the revision read and delete ports.
    #[must_use]
    pub fn with_revisions(
        mut self,
        revisions: Arc<dyn RevisionsQuery>,
        revisions_command: Arc<dyn RevisionsCommand>,
    ) -> Self {
        self.revisions = revisions;
        self.revisions_command = revisions_command;
        self
    }

    /// Replace the bearer token resolver.
    #[must_use]
    pub fn with_authentication(
        mut self,
        authentication: Arc<dyn AuthenticationMethodResolver>,
    ) -> Self {
        self.authentication = authentication;
        self
    }
}
