//! Revision history for notes.
//!
//! Revisions are written by the sync engine and copied when an item is
//! marked as a duplicate. The read side implements the revision driving
//! ports and honours the user's revision history window.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use mockable::Clock;
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{
    AuthService, AuthServiceError, ItemRepository, ItemRepositoryError, RevisionRepository,
    RevisionRepositoryError, RevisionsCommand, RevisionsQuery,
};
use crate::domain::{ContentType, Error, Item, Revision, UserId};

/// Creates, copies and serves revisions.
#[derive(Clone)]
pub struct RevisionService<R, I, A> {
    revision_repo: Arc<R>,
    item_repo: Arc<I>,
    auth_service: Arc<A>,
    clock: Arc<dyn Clock>,
}

impl<R, I, A> RevisionService<R, I, A> {
    /// Create a new service with the given collaborators.
    pub fn new(
        revision_repo: Arc<R>,
        item_repo: Arc<I>,
        auth_service: Arc<A>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            revision_repo,
            item_repo,
            auth_service,
            clock,
        }
    }
}

pub(crate) fn map_revision_error(error: RevisionRepositoryError) -> Error {
    match error {
        RevisionRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("revision repository unavailable: {message}"))
        }
        RevisionRepositoryError::Query { message } => {
            Error::internal(format!("revision repository error: {message}"))
        }
    }
}

pub(crate) fn map_item_error(error: ItemRepositoryError) -> Error {
    match error {
        ItemRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("item repository unavailable: {message}"))
        }
        ItemRepositoryError::Query { message } => {
            Error::internal(format!("item repository error: {message}"))
        }
    }
}

fn map_auth_error(error: AuthServiceError) -> Error {
    match error {
        AuthServiceError::Transport { message } => {
            Error::service_unavailable(format!("auth service unavailable: {message}"))
        }
        other => Error::internal(other.to_string()),
    }
}

fn item_not_found(item_uuid: &Uuid) -> Error {
    Error::not_found(format!("item {item_uuid} not found"))
}

fn revision_not_found(revision_uuid: &Uuid) -> Error {
    Error::not_found(format!("revision {revision_uuid} not found"))
}

impl<R, I, A> RevisionService<R, I, A>
where
    R: RevisionRepository,
    I: ItemRepository,
    A: AuthService,
{
    /// Snapshot `item` when it is a note. Other content types have no
    /// history.
    pub async fn create_revision(&self, item: &Item) -> Result<(), Error> {
        if item.content_type != ContentType::Note {
            return Ok(());
        }
        let revision = Revision::snapshot_of(item, self.clock.utc());
        self.revision_repo
            .save(&revision)
            .await
            .map_err(map_revision_error)
    }

    /// Give `to_item_uuid` its own copy of every revision of
    /// `from_item_uuid`.
    pub async fn copy_revisions(
        &self,
        from_item_uuid: &Uuid,
        to_item_uuid: &Uuid,
    ) -> Result<(), Error> {
        for uuid in [from_item_uuid, to_item_uuid] {
            self.item_repo
                .find_by_uuid(uuid)
                .await
                .map_err(map_item_error)?
                .ok_or_else(|| item_not_found(uuid))?;
        }

        let revisions = self
            .revision_repo
            .find_by_item_uuid(from_item_uuid, None)
            .await
            .map_err(map_revision_error)?;
        debug!(
            from = %from_item_uuid,
            to = %to_item_uuid,
            count = revisions.len(),
            "copying revisions"
        );
        for revision in &revisions {
            self.revision_repo
                .save(&revision.copied_to(*to_item_uuid))
                .await
                .map_err(map_revision_error)?;
        }
        Ok(())
    }

    async fn ensure_owned(&self, user_uuid: &UserId, item_uuid: &Uuid) -> Result<Item, Error> {
        self.item_repo
            .find_by_uuid_and_user_uuid(item_uuid, user_uuid)
            .await
            .map_err(map_item_error)?
            .ok_or_else(|| item_not_found(item_uuid))
    }

    async fn history_start(&self, user_uuid: &UserId) -> Result<Option<NaiveDate>, Error> {
        let days = self
            .auth_service
            .revision_history_days(user_uuid)
            .await
            .map_err(map_auth_error)?;
        let today = self.clock.utc().date_naive();
        Ok(days.map(|days| {
            today
                .checked_sub_days(Days::new(u64::from(days)))
                .unwrap_or(NaiveDate::MIN)
        }))
    }
}

#[async_trait]
impl<R, I, A> RevisionsQuery for RevisionService<R, I, A>
where
    R: RevisionRepository,
    I: ItemRepository,
    A: AuthService,
{
    async fn get_revisions(
        &self,
        user_uuid: &UserId,
        item_uuid: &Uuid,
    ) -> Result<Vec<Revision>, Error> {
        self.ensure_owned(user_uuid, item_uuid).await?;
        let created_after = self.history_start(user_uuid).await?;
        self.revision_repo
            .find_by_item_uuid(item_uuid, created_after)
            .await
            .map_err(map_revision_error)
    }

    async fn get_revision(
        &self,
        user_uuid: &UserId,
        item_uuid: &Uuid,
        revision_uuid: &Uuid,
    ) -> Result<Revision, Error> {
        self.ensure_owned(user_uuid, item_uuid).await?;
        self.revision_repo
            .find_one_by_uuid(revision_uuid, item_uuid)
            .await
            .map_err(map_revision_error)?
            .ok_or_else(|| revision_not_found(revision_uuid))
    }
}

#[async_trait]
impl<R, I, A> RevisionsCommand for RevisionService<R, I, A>
where
    R: RevisionRepository,
    I: ItemRepository,
    A: AuthService,
{
    async fn remove_revision(
        &self,
        user_uuid: &UserId,
        item_uuid: &Uuid,
        revision_uuid: &Uuid,
    ) -> Result<(), Error> {
        self.ensure_owned(user_uuid, item_uuid).await?;
        let removed = self
            .revision_repo
            .remove_by_uuid(revision_uuid, item_uuid)
            .await
            .map_err(map_revision_error)?;
        if removed {
            Ok(())
        } else {
            Err(revision_not_found(revision_uuid))
        }
    }
}

#[cfg(test)]
#[path = "revision_service_tests.rs"]
mod tests;
