//! Ports for the external auth subsystem.
//!
//! The sync engine never validates credentials itself. It resolves bearer
//! tokens to sessions, pushes migrated two-factor secrets into user settings
//! and asks how much revision history a user may read.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::UserId;

use super::define_port_error;

define_port_error! {
    /// Errors raised by auth service adapters.
    pub enum AuthServiceError {
        /// The auth service could not be reached.
        Transport { message: String } =>
            "auth service unreachable: {message}",
        /// The auth service answered with an error status.
        Rejected { status: u16, message: String } =>
            "auth service rejected request with status {status}: {message}",
        /// The auth service answered with an unreadable body.
        Decode { message: String } =>
            "auth service response could not be decoded: {message}",
    }
}

/// Where a user's legacy two-factor item is in its migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MfaTransition {
    /// The secret now lives in user settings.
    Migrated,
    /// The user removed two-factor authentication.
    Deleted,
}

impl MfaTransition {
    /// Wire value sent to the auth service.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Migrated => "migrated",
            Self::Deleted => "deleted",
        }
    }
}

/// Session a bearer token resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedSession {
    pub user_uuid: UserId,
    pub session_uuid: Option<Uuid>,
    pub read_only_access: bool,
}

/// Port resolving bearer tokens to sessions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthenticationMethodResolver: Send + Sync {
    /// Session for `token`, or `None` when the token is not valid.
    async fn resolve(&self, token: &str) -> Result<Option<AuthenticatedSession>, AuthServiceError>;
}

/// Port for user settings held by the auth subsystem.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Store the two-factor secret carried by legacy item `item_uuid`.
    async fn save_user_mfa(
        &self,
        user_uuid: &UserId,
        item_uuid: &Uuid,
        secret: &str,
    ) -> Result<(), AuthServiceError>;

    /// Remove the user's two-factor secret.
    async fn remove_user_mfa(&self, user_uuid: &UserId) -> Result<(), AuthServiceError>;

    /// Record the migration state of the user's legacy two-factor item.
    async fn set_mfa_transition(
        &self,
        user_uuid: &UserId,
        transition: MfaTransition,
    ) -> Result<(), AuthServiceError>;

    /// Days of revision history the user may read; `None` means unlimited.
    async fn revision_history_days(
        &self,
        user_uuid: &UserId,
    ) -> Result<Option<u32>, AuthServiceError>;
}

/// Auth fixture for running without an auth server.
///
/// Tokens that are plain UUIDs resolve to a read-write session for that
/// user. Settings calls succeed and are discarded.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureAuthService;

#[async_trait]
impl AuthenticationMethodResolver for FixtureAuthService {
    async fn resolve(&self, token: &str) -> Result<Option<AuthenticatedSession>, AuthServiceError> {
        Ok(UserId::new(token).ok().map(|user_uuid| AuthenticatedSession {
            user_uuid,
            session_uuid: None,
            read_only_access: false,
        }))
    }
}

#[async_trait]
impl AuthService for FixtureAuthService {
    async fn save_user_mfa(
        &self,
        _user_uuid: &UserId,
        _item_uuid: &Uuid,
        _secret: &str,
    ) -> Result<(), AuthServiceError> {
        Ok(())
    }

    async fn remove_user_mfa(&self, _user_uuid: &UserId) -> Result<(), AuthServiceError> {
        Ok(())
    }

    async fn set_mfa_transition(
        &self,
        _user_uuid: &UserId,
        _transition: MfaTransition,
    ) -> Result<(), AuthServiceError> {
        Ok(())
    }

    async fn revision_history_days(
        &self,
        _user_uuid: &UserId,
    ) -> Result<Option<u32>, AuthServiceError> {
        Ok(None)
    }
}
