//! Port for revision persistence.

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::domain::Revision;

use super::define_port_error;

define_port_error! {
    /// Errors raised by revision repository adapters.
    pub enum RevisionRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "revision repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "revision repository query failed: {message}",
    }
}

/// Port for revision storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RevisionRepository: Send + Sync {
    /// Store `revision` and link it to `revision.item_uuid`.
    async fn save(&self, revision: &Revision) -> Result<(), RevisionRepositoryError>;

    /// Revisions linked to `item_uuid`, newest first.
    ///
    /// When `created_after` is set, only revisions whose `creation_date` is
    /// on or after that day are returned.
    async fn find_by_item_uuid(
        &self,
        item_uuid: &Uuid,
        created_after: Option<NaiveDate>,
    ) -> Result<Vec<Revision>, RevisionRepositoryError>;

    /// Revision `revision_uuid` when it is linked to `item_uuid`.
    async fn find_one_by_uuid(
        &self,
        revision_uuid: &Uuid,
        item_uuid: &Uuid,
    ) -> Result<Option<Revision>, RevisionRepositoryError>;

    /// Remove revision `revision_uuid` from `item_uuid`. Returns whether a
    /// row was removed.
    async fn remove_by_uuid(
        &self,
        revision_uuid: &Uuid,
        item_uuid: &Uuid,
    ) -> Result<bool, RevisionRepositoryError>;
}

/// Fixture implementation that stores nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureRevisionRepository;

#[async_trait]
impl RevisionRepository for FixtureRevisionRepository {
    async fn save(&self, _revision: &Revision) -> Result<(), RevisionRepositoryError> {
        Ok(())
    }

    async fn find_by_item_uuid(
        &self,
        _item_uuid: &Uuid,
        _created_after: Option<NaiveDate>,
    ) -> Result<Vec<Revision>, RevisionRepositoryError> {
        Ok(Vec::new())
    }

    async fn find_one_by_uuid(
        &self,
        _revision_uuid: &Uuid,
        _item_uuid: &Uuid,
    ) -> Result<Option<Revision>, RevisionRepositoryError> {
        Ok(None)
    }

    async fn remove_by_uuid(
        &self,
        _revision_uuid: &Uuid,
        _item_uuid: &Uuid,
    ) -> Result<bool, RevisionRepositoryError> {
        Ok(false)
    }
}
