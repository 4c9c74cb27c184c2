//! Builders wiring repositories, the auth service and the event channel into
//! the HTTP state.

use std::sync::Arc;

use mockable::{Clock, DefaultClock};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use syncing_server::domain::ports::{
    AuthService, AuthenticationMethodResolver, DomainEventHandler, FixtureAuthService,
    ItemRepository, RevisionRepository,
};
use syncing_server::domain::save_rules::{ItemSaveValidator, MfaRule};
use syncing_server::domain::{
    DuplicateItemSyncedHandler, ItemFactory, ItemService, ItemServiceConfig, RevisionService,
    SyncItemsService,
};
use syncing_server::inbound::http::state::HttpState;
use syncing_server::outbound::auth::HttpAuthService;
use syncing_server::outbound::events::{
    ChannelDomainEventPublisher, DEFAULT_EVENT_CHANNEL_CAPACITY,
};
use syncing_server::outbound::persistence::{
    DbPool, DieselItemRepository, DieselRevisionRepository,
};

use super::ServerConfig;

/// HTTP state plus the background worker draining domain events.
pub(crate) struct BuiltState {
    pub(crate) http_state: HttpState,
    pub(crate) event_worker: Option<JoinHandle<()>>,
}

/// Build the sync and revision ports on top of the given driven adapters.
///
/// Must run inside a Tokio runtime because the event worker is spawned here.
pub(crate) fn build_sync_state<I, R, A>(
    items: Arc<I>,
    revisions: Arc<R>,
    auth: Arc<A>,
    item_config: ItemServiceConfig,
    clock: Arc<dyn Clock>,
) -> BuiltState
where
    I: ItemRepository + 'static,
    R: RevisionRepository + 'static,
    A: AuthService + AuthenticationMethodResolver + 'static,
{
    let revision_service = || {
        RevisionService::new(
            Arc::clone(&revisions),
            Arc::clone(&items),
            Arc::clone(&auth),
            Arc::clone(&clock),
        )
    };

    let duplicate_handler: Arc<dyn DomainEventHandler> = Arc::new(
        DuplicateItemSyncedHandler::new(Arc::clone(&items), revision_service()),
    );
    let (publisher, event_worker) =
        ChannelDomainEventPublisher::spawn(vec![duplicate_handler], DEFAULT_EVENT_CHANNEL_CAPACITY);

    let factory = ItemFactory::new(Arc::clone(&clock));
    let mfa_rule = MfaRule::new(
        Arc::clone(&auth),
        Arc::clone(&items),
        factory.clone(),
        Arc::clone(&clock),
    );
    let item_service = ItemService::new(
        Arc::clone(&items),
        revision_service(),
        Arc::new(publisher),
        ItemSaveValidator::standard(Arc::new(mfa_rule)),
        factory,
        Arc::clone(&clock),
        item_config,
    );

    let revisions_port = Arc::new(revision_service());
    let http_state = HttpState::fixtures()
        .with_sync_items(Arc::new(SyncItemsService::new(item_service)))
        .with_revisions(revisions_port.clone(), revisions_port)
        .with_authentication(auth);

    BuiltState {
        http_state,
        event_worker: Some(event_worker),
    }
}

fn build_with_auth<A>(config: &ServerConfig, pool: Option<&DbPool>, auth: Arc<A>) -> BuiltState
where
    A: AuthService + AuthenticationMethodResolver + 'static,
{
    match pool {
        Some(pool) => {
            info!("wiring Diesel repositories");
            build_sync_state(
                Arc::new(DieselItemRepository::new(pool.clone())),
                Arc::new(DieselRevisionRepository::new(pool.clone())),
                auth,
                config.item_config,
                Arc::new(DefaultClock),
            )
        }
        None => {
            warn!("no database configured; sync endpoints serve fixture data");
            BuiltState {
                http_state: HttpState::fixtures().with_authentication(auth),
                event_worker: None,
            }
        }
    }
}

/// Build the HTTP state from configuration.
///
/// Uses Diesel-backed services when a pool is available and the HTTP auth
/// adapter when an auth server is configured. Fixtures stand in otherwise.
///
/// # Errors
///
/// Returns [`std::io::Error`] when the auth HTTP client cannot be built.
pub(crate) fn build_http_state(config: &ServerConfig) -> std::io::Result<BuiltState> {
    let pool = config.db_pool.as_ref();
    match &config.auth_server {
        Some(auth) => {
            let service = HttpAuthService::new(auth.base_url.clone(), auth.timeout)
                .map_err(|e| std::io::Error::other(format!("auth client build failed: {e}")))?;
            Ok(build_with_auth(config, pool, Arc::new(service)))
        }
        None => {
            warn!("no auth server configured; bearer tokens naming a user UUID are accepted");
            Ok(build_with_auth(config, pool, Arc::new(FixtureAuthService)))
        }
    }
}
