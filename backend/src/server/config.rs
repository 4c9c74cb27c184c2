//! HTTP server configuration object and helpers.

use std::net::SocketAddr;
use std::time::Duration;

use syncing_server::domain::ItemServiceConfig;
use syncing_server::outbound::persistence::DbPool;
use url::Url;

/// Location and timeout of the auth service.
#[derive(Debug, Clone)]
pub struct AuthServerConfig {
    pub(crate) base_url: Url,
    pub(crate) timeout: Duration,
}

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: Option<DbPool>,
    pub(crate) auth_server: Option<AuthServerConfig>,
    pub(crate) item_config: ItemServiceConfig,
}

impl ServerConfig {
    /// Construct a configuration that binds to `bind_addr` and uses fixture
    /// ports until adapters are attached.
    #[must_use]
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            db_pool: None,
            auth_server: None,
            item_config: ItemServiceConfig::default(),
        }
    }

    /// Attach a database connection pool for persistence adapters.
    ///
    /// When provided, the sync and revision endpoints are backed by the
    /// Diesel repositories instead of fixtures.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// Resolve bearer tokens and MFA settings through the auth service.
    #[must_use]
    pub fn with_auth_server(mut self, base_url: Url, timeout: Duration) -> Self {
        self.auth_server = Some(AuthServerConfig { base_url, timeout });
        self
    }

    /// Override the item service tunables.
    #[must_use]
    pub fn with_item_config(mut self, item_config: ItemServiceConfig) -> Self {
        self.item_config = item_config;
        self
    }

    /// Return the socket address the server will bind to.
    #[cfg_attr(
        not(any(test, doctest)),
        expect(dead_code, reason = "Exercised by server tests")
    )]
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}
