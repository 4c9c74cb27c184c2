//! Process settings loaded via OrthoConfig.
//!
//! Values come from `SYNCING_SERVER_*` environment variables, CLI flags or a
//! config file. Unset tunables fall back to the sync engine's defaults.

use std::net::{AddrParseError, SocketAddr};
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use syncing_server::domain::ItemServiceConfig;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

/// Configuration for the syncing server process.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "SYNCING_SERVER")]
pub struct SyncServerSettings {
    /// Socket address the HTTP listener binds to.
    pub bind_addr: Option<String>,
    /// PostgreSQL connection string. Fixture ports are used when absent.
    pub database_url: Option<String>,
    /// Base URL of the auth service.
    pub auth_server_url: Option<String>,
    /// Minimum seconds between two revisions of one item.
    pub revisions_frequency_seconds: Option<i64>,
    /// Byte budget for the content of one retrieved page.
    pub content_size_transfer_limit: Option<i64>,
    /// Upper bound on the page size a client may request.
    pub max_items_limit: Option<i64>,
    /// Timeout in seconds for calls to the auth service.
    #[ortho_config(default = 10)]
    pub auth_timeout_seconds: u64,
    /// Size of the database connection pool.
    #[ortho_config(default = 10)]
    pub database_max_connections: u32,
}

impl SyncServerSettings {
    /// Resolve the listener address.
    ///
    /// # Errors
    ///
    /// Returns [`AddrParseError`] when the configured value is not a socket
    /// address.
    pub fn bind_addr(&self) -> Result<SocketAddr, AddrParseError> {
        self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR).parse()
    }

    /// Timeout applied to auth service requests.
    pub fn auth_timeout(&self) -> Duration {
        Duration::from_secs(self.auth_timeout_seconds)
    }

    /// Domain tunables for the item service.
    pub fn item_service_config(&self) -> ItemServiceConfig {
        let defaults = ItemServiceConfig::default();
        ItemServiceConfig {
            revisions_frequency_seconds: self
                .revisions_frequency_seconds
                .unwrap_or(defaults.revisions_frequency_seconds),
            content_size_transfer_limit: self
                .content_size_transfer_limit
                .unwrap_or(defaults.content_size_transfer_limit),
            max_items_limit: self.max_items_limit.unwrap_or(defaults.max_items_limit),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for settings parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const KEYS: [&str; 8] = [
        "SYNCING_SERVER_BIND_ADDR",
        "SYNCING_SERVER_DATABASE_URL",
        "SYNCING_SERVER_AUTH_SERVER_URL",
        "SYNCING_SERVER_REVISIONS_FREQUENCY_SECONDS",
        "SYNCING_SERVER_CONTENT_SIZE_TRANSFER_LIMIT",
        "SYNCING_SERVER_MAX_ITEMS_LIMIT",
        "SYNCING_SERVER_AUTH_TIMEOUT_SECONDS",
        "SYNCING_SERVER_DATABASE_MAX_CONNECTIONS",
    ];

    fn load_from_empty_args() -> SyncServerSettings {
        SyncServerSettings::load_from_iter([OsString::from("syncing-server")])
            .expect("config should load")
    }

    #[rstest]
    fn default_values_are_used_when_missing() {
        let _guard = lock_env(KEYS.map(|key| (key, None::<String>)));

        let settings = load_from_empty_args();
        assert_eq!(
            settings.bind_addr().expect("default address parses"),
            "0.0.0.0:3000".parse::<SocketAddr>().expect("literal parses")
        );
        assert!(settings.database_url.is_none());
        assert!(settings.auth_server_url.is_none());
        assert_eq!(settings.auth_timeout(), Duration::from_secs(10));
        assert_eq!(settings.auth_timeout_seconds, 10);
        assert_eq!(settings.database_max_connections, 10);
        assert_eq!(settings.item_service_config(), ItemServiceConfig::default());
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            ("SYNCING_SERVER_BIND_ADDR", Some("127.0.0.1:8081".to_owned())),
            (
                "SYNCING_SERVER_DATABASE_URL",
                Some("postgres://sync@localhost/sync".to_owned()),
            ),
            (
                "SYNCING_SERVER_AUTH_SERVER_URL",
                Some("http://auth.internal:3000/".to_owned()),
            ),
            (
                "SYNCING_SERVER_REVISIONS_FREQUENCY_SECONDS",
                Some("60".to_owned()),
            ),
            (
                "SYNCING_SERVER_CONTENT_SIZE_TRANSFER_LIMIT",
                Some("2048".to_owned()),
            ),
            ("SYNCING_SERVER_MAX_ITEMS_LIMIT", Some("50".to_owned())),
            ("SYNCING_SERVER_AUTH_TIMEOUT_SECONDS", Some("3".to_owned())),
            ("SYNCING_SERVER_DATABASE_MAX_CONNECTIONS", Some("4".to_owned())),
        ]);

        let settings = load_from_empty_args();
        assert_eq!(
            settings.bind_addr().expect("address parses"),
            "127.0.0.1:8081".parse::<SocketAddr>().expect("literal parses")
        );
        assert_eq!(
            settings.database_url.as_deref(),
            Some("postgres://sync@localhost/sync")
        );
        assert_eq!(
            settings.auth_server_url.as_deref(),
            Some("http://auth.internal:3000/")
        );
        assert_eq!(settings.auth_timeout(), Duration::from_secs(3));
        assert_eq!(settings.database_max_connections, 4);
        assert_eq!(
            settings.item_service_config(),
            ItemServiceConfig {
                revisions_frequency_seconds: 60,
                content_size_transfer_limit: 2048,
                max_items_limit: 50,
            }
        );
    }

    #[rstest]
    fn malformed_bind_address_is_reported() {
        let _guard = lock_env([("SYNCING_SERVER_BIND_ADDR", Some("not-an-address".to_owned()))]);

        let settings = load_from_empty_args();
        assert!(settings.bind_addr().is_err());
    }
}
