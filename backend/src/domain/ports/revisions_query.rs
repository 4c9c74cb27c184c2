//! Driving ports for reading and pruning item revision history.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Error, Revision, UserId};

/// Domain use-case port for browsing revisions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RevisionsQuery: Send + Sync {
    /// Revisions of an item owned by `user_uuid`, newest first, limited to
    /// the user's history window.
    async fn get_revisions(
        &self,
        user_uuid: &UserId,
        item_uuid: &Uuid,
    ) -> Result<Vec<Revision>, Error>;

    /// One revision of an item owned by `user_uuid`.
    async fn get_revision(
        &self,
        user_uuid: &UserId,
        item_uuid: &Uuid,
        revision_uuid: &Uuid,
    ) -> Result<Revision, Error>;
}

/// Domain use-case port for removing revisions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RevisionsCommand: Send + Sync {
    /// Remove one revision of an item owned by `user_uuid`.
    async fn remove_revision(
        &self,
        user_uuid: &UserId,
        item_uuid: &Uuid,
        revision_uuid: &Uuid,
    ) -> Result<(), Error>;
}

/// Fixture with no revision history.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureRevisions;

#[async_trait]
impl RevisionsQuery for FixtureRevisions {
    async fn get_revisions(
        &self,
        _user_uuid: &UserId,
        _item_uuid: &Uuid,
    ) -> Result<Vec<Revision>, Error> {
        Ok(Vec::new())
    }

    async fn get_revision(
        &self,
        _user_uuid: &UserId,
        _item_uuid: &Uuid,
        revision_uuid: &Uuid,
    ) -> Result<Revision, Error> {
        Err(Error::not_found(format!("revision {revision_uuid} not found")))
    }
}

#[async_trait]
impl RevisionsCommand for FixtureRevisions {
    async fn remove_revision(
        &self,
        _user_uuid: &UserId,
        _item_uuid: &Uuid,
        revision_uuid: &Uuid,
    ) -> Result<(), Error> {
        Err(Error::not_found(format!("revision {revision_uuid} not found")))
    }
}
