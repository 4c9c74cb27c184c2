//! Port for item persistence.
//!
//! Lookups by uuid are global on purpose: the save pipeline detects items
//! owned by another account and reports them as conflicts instead of
//! treating them as new.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{ContentType, Item, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by item repository adapters.
    pub enum ItemRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "item repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "item repository query failed: {message}",
    }
}

/// Comparison applied to `updated_at_timestamp` against the last sync time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncTimeComparison {
    /// Strictly newer: used with sync tokens.
    #[default]
    GreaterThan,
    /// Newer or equal: used with cursor tokens.
    GreaterThanOrEqual,
}

/// Column used to order query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ItemSortField {
    #[default]
    UpdatedAtTimestamp,
    CreatedAtTimestamp,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// Filters accepted by item queries. Unset fields do not filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemQuery {
    pub user_uuid: Option<UserId>,
    pub uuids: Option<Vec<Uuid>>,
    pub deleted: Option<bool>,
    pub content_type: Option<ContentType>,
    pub last_sync_time: Option<i64>,
    pub sync_time_comparison: SyncTimeComparison,
    pub sort_by: Option<ItemSortField>,
    pub sort_order: SortOrder,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ItemQuery {
    /// Query scoped to a single user.
    pub fn for_user(user_uuid: &UserId) -> Self {
        Self {
            user_uuid: Some(user_uuid.clone()),
            ..Self::default()
        }
    }
}

/// Uuid and stored size of a candidate item, used for transfer budgeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemContentSize {
    pub uuid: Uuid,
    pub content_size: i64,
}

/// Port for item storage and retrieval.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ItemRepository: Send + Sync {
    /// Items matching `query`, in the requested order.
    async fn find_all(&self, query: &ItemQuery) -> Result<Vec<Item>, ItemRepositoryError>;

    /// Item with `uuid`, whoever owns it.
    async fn find_by_uuid(&self, uuid: &Uuid) -> Result<Option<Item>, ItemRepositoryError>;

    /// Item with `uuid` owned by `user_uuid`.
    async fn find_by_uuid_and_user_uuid(
        &self,
        uuid: &Uuid,
        user_uuid: &UserId,
    ) -> Result<Option<Item>, ItemRepositoryError>;

    /// Store a new item.
    ///
    /// Fails when the uuid is already taken, whoever owns it.
    async fn insert(&self, item: &Item) -> Result<(), ItemRepositoryError>;

    /// Replace the stored copy of an item owned by `item.user_uuid`.
    ///
    /// Fails when no such item exists for that user.
    async fn update(&self, item: &Item) -> Result<(), ItemRepositoryError>;

    /// Number of items matching `query`, ignoring limit and offset.
    async fn count_all(&self, query: &ItemQuery) -> Result<i64, ItemRepositoryError>;

    /// Uuid and size of each item matching `query`, in query order.
    async fn find_content_size_for_computing_transfer_limit(
        &self,
        query: &ItemQuery,
    ) -> Result<Vec<ItemContentSize>, ItemRepositoryError>;

    /// `updated_at_timestamp` of every non-deleted item of the user.
    async fn find_dates_for_computing_integrity_hash(
        &self,
        user_uuid: &UserId,
    ) -> Result<Vec<i64>, ItemRepositoryError>;

    /// Soft-delete the given items, clearing their encrypted fields.
    async fn mark_items_as_deleted(
        &self,
        uuids: &[Uuid],
        updated_at_timestamp: i64,
    ) -> Result<(), ItemRepositoryError>;
}

/// Fixture implementation that stores nothing and finds nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureItemRepository;

#[async_trait]
impl ItemRepository for FixtureItemRepository {
    async fn find_all(&self, _query: &ItemQuery) -> Result<Vec<Item>, ItemRepositoryError> {
        Ok(Vec::new())
    }

    async fn find_by_uuid(&self, _uuid: &Uuid) -> Result<Option<Item>, ItemRepositoryError> {
        Ok(None)
    }

    async fn find_by_uuid_and_user_uuid(
        &self,
        _uuid: &Uuid,
        _user_uuid: &UserId,
    ) -> Result<Option<Item>, ItemRepositoryError> {
        Ok(None)
    }

    async fn insert(&self, _item: &Item) -> Result<(), ItemRepositoryError> {
        Ok(())
    }

    async fn update(&self, _item: &Item) -> Result<(), ItemRepositoryError> {
        Ok(())
    }

    async fn count_all(&self, _query: &ItemQuery) -> Result<i64, ItemRepositoryError> {
        Ok(0)
    }

    async fn find_content_size_for_computing_transfer_limit(
        &self,
        _query: &ItemQuery,
    ) -> Result<Vec<ItemContentSize>, ItemRepositoryError> {
        Ok(Vec::new())
    }

    async fn find_dates_for_computing_integrity_hash(
        &self,
        _user_uuid: &UserId,
    ) -> Result<Vec<i64>, ItemRepositoryError> {
        Ok(Vec::new())
    }

    async fn mark_items_as_deleted(
        &self,
        _uuids: &[Uuid],
        _updated_at_timestamp: i64,
    ) -> Result<(), ItemRepositoryError> {
        Ok(())
    }
}
