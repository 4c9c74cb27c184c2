//! PostgreSQL-backed `ItemRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{
    ItemContentSize, ItemQuery, ItemRepository, ItemRepositoryError, ItemSortField, SortOrder,
    SyncTimeComparison,
};
use crate::domain::timer::date_from_micros;
use crate::domain::{ContentType, Item, UserId};

use super::diesel_error_mapping;
use super::models::{ItemContentSizeRow, ItemRow};
use super::pool::{DbPool, PoolError};
use super::schema::items;

/// Diesel-backed implementation of the item repository port.
#[derive(Clone)]
pub struct DieselItemRepository {
    pool: DbPool,
}

impl DieselItemRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> ItemRepositoryError {
    diesel_error_mapping::map_pool_error(error, ItemRepositoryError::connection)
}

fn map_diesel_error(
    operation: &'static str,
) -> impl FnOnce(diesel::result::Error) -> ItemRepositoryError {
    move |error| {
        diesel_error_mapping::map_diesel_error(
            error,
            operation,
            ItemRepositoryError::query,
            ItemRepositoryError::connection,
        )
    }
}

fn row_to_item(row: ItemRow) -> Result<Item, ItemRepositoryError> {
    let content_type: ContentType = row
        .content_type
        .parse()
        .map_err(|err| ItemRepositoryError::query(format!("item {}: {err}", row.uuid)))?;
    Ok(Item {
        uuid: row.uuid,
        user_uuid: UserId::from_uuid(row.user_uuid),
        content: row.content,
        content_type,
        enc_item_key: row.enc_item_key,
        items_key_id: row.items_key_id,
        auth_hash: row.auth_hash,
        duplicate_of: row.duplicate_of,
        deleted: row.deleted,
        content_size: row.content_size,
        created_at: row.created_at,
        created_at_timestamp: row.created_at_timestamp,
        updated_at: row.updated_at,
        updated_at_timestamp: row.updated_at_timestamp,
        last_user_agent: row.last_user_agent,
    })
}

fn item_to_row(item: &Item) -> ItemRow {
    ItemRow {
        uuid: item.uuid,
        user_uuid: *item.user_uuid.as_uuid(),
        content: item.content.clone(),
        content_type: item.content_type.as_str().to_owned(),
        content_size: item.content_size,
        enc_item_key: item.enc_item_key.clone(),
        items_key_id: item.items_key_id.clone(),
        auth_hash: item.auth_hash.clone(),
        duplicate_of: item.duplicate_of,
        deleted: item.deleted,
        last_user_agent: item.last_user_agent.clone(),
        created_at: item.created_at,
        created_at_timestamp: item.created_at_timestamp,
        updated_at: item.updated_at,
        updated_at_timestamp: item.updated_at_timestamp,
    }
}

/// An update that touched no row means the item is gone or owned by
/// someone else.
fn ensure_updated(affected: usize, item: &Item) -> Result<(), ItemRepositoryError> {
    if affected == 0 {
        return Err(ItemRepositoryError::query(format!(
            "update item {}: no row owned by {}",
            item.uuid, item.user_uuid
        )));
    }
    Ok(())
}

/// Apply the filter half of an [`ItemQuery`]; ordering and paging are left
/// to the caller so counts can share it.
fn filtered(query: &ItemQuery) -> items::BoxedQuery<'static, Pg> {
    let mut boxed = items::table.into_boxed();
    if let Some(user_uuid) = &query.user_uuid {
        boxed = boxed.filter(items::user_uuid.eq(*user_uuid.as_uuid()));
    }
    if let Some(uuids) = &query.uuids {
        boxed = boxed.filter(items::uuid.eq_any(uuids.clone()));
    }
    if let Some(deleted) = query.deleted {
        boxed = boxed.filter(items::deleted.eq(deleted));
    }
    if let Some(content_type) = query.content_type {
        boxed = boxed.filter(items::content_type.eq(content_type.as_str()));
    }
    if let Some(last_sync_time) = query.last_sync_time {
        boxed = match query.sync_time_comparison {
            SyncTimeComparison::GreaterThan => {
                boxed.filter(items::updated_at_timestamp.gt(last_sync_time))
            }
            SyncTimeComparison::GreaterThanOrEqual => {
                boxed.filter(items::updated_at_timestamp.ge(last_sync_time))
            }
        };
    }
    boxed
}

fn ordered_page(query: &ItemQuery) -> items::BoxedQuery<'static, Pg> {
    let mut boxed = filtered(query);
    boxed = match (query.sort_by, query.sort_order) {
        (None, _) => boxed,
        (Some(ItemSortField::UpdatedAtTimestamp), SortOrder::Ascending) => {
            boxed.order(items::updated_at_timestamp.asc())
        }
        (Some(ItemSortField::UpdatedAtTimestamp), SortOrder::Descending) => {
            boxed.order(items::updated_at_timestamp.desc())
        }
        (Some(ItemSortField::CreatedAtTimestamp), SortOrder::Ascending) => {
            boxed.order(items::created_at_timestamp.asc())
        }
        (Some(ItemSortField::CreatedAtTimestamp), SortOrder::Descending) => {
            boxed.order(items::created_at_timestamp.desc())
        }
    };
    if let Some(limit) = query.limit {
        boxed = boxed.limit(limit);
    }
    if let Some(offset) = query.offset {
        boxed = boxed.offset(offset);
    }
    boxed
}

#[async_trait]
impl ItemRepository for DieselItemRepository {
    async fn find_all(&self, query: &ItemQuery) -> Result<Vec<Item>, ItemRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<ItemRow> = ordered_page(query)
            .select(ItemRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error("find items"))?;
        rows.into_iter().map(row_to_item).collect()
    }

    async fn find_by_uuid(&self, uuid: &Uuid) -> Result<Option<Item>, ItemRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = items::table
            .filter(items::uuid.eq(uuid))
            .select(ItemRow::as_select())
            .first::<ItemRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error("find item"))?;
        row.map(row_to_item).transpose()
    }

    async fn find_by_uuid_and_user_uuid(
        &self,
        uuid: &Uuid,
        user_uuid: &UserId,
    ) -> Result<Option<Item>, ItemRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = items::table
            .filter(items::uuid.eq(uuid))
            .filter(items::user_uuid.eq(user_uuid.as_uuid()))
            .select(ItemRow::as_select())
            .first::<ItemRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error("find owned item"))?;
        row.map(row_to_item).transpose()
    }

    async fn insert(&self, item: &Item) -> Result<(), ItemRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(items::table)
            .values(&item_to_row(item))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error("insert item"))
    }

    async fn update(&self, item: &Item) -> Result<(), ItemRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let affected = diesel::update(
            items::table
                .filter(items::uuid.eq(item.uuid))
                .filter(items::user_uuid.eq(*item.user_uuid.as_uuid())),
        )
        .set(&item_to_row(item))
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error("update item"))?;
        ensure_updated(affected, item)
    }

    async fn count_all(&self, query: &ItemQuery) -> Result<i64, ItemRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        filtered(query)
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error("count items"))
    }

    async fn find_content_size_for_computing_transfer_limit(
        &self,
        query: &ItemQuery,
    ) -> Result<Vec<ItemContentSize>, ItemRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<ItemContentSizeRow> = ordered_page(query)
            .select(ItemContentSizeRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error("find content sizes"))?;
        Ok(rows
            .into_iter()
            .map(|row| ItemContentSize {
                uuid: row.uuid,
                content_size: row.content_size,
            })
            .collect())
    }

    async fn find_dates_for_computing_integrity_hash(
        &self,
        user_uuid: &UserId,
    ) -> Result<Vec<i64>, ItemRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        items::table
            .filter(items::user_uuid.eq(user_uuid.as_uuid()))
            .filter(items::deleted.eq(false))
            .order(items::updated_at_timestamp.desc())
            .select(items::updated_at_timestamp)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error("find integrity dates"))
    }

    async fn mark_items_as_deleted(
        &self,
        uuids: &[Uuid],
        updated_at_timestamp: i64,
    ) -> Result<(), ItemRepositoryError> {
        if uuids.is_empty() {
            return Ok(());
        }
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::update(items::table.filter(items::uuid.eq_any(uuids)))
            .set((
                items::deleted.eq(true),
                items::content.eq(None::<String>),
                items::enc_item_key.eq(None::<String>),
                items::auth_hash.eq(None::<String>),
                items::items_key_id.eq(None::<String>),
                items::content_size.eq(0_i64),
                items::updated_at.eq(date_from_micros(updated_at_timestamp)),
                items::updated_at_timestamp.eq(updated_at_timestamp),
            ))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error("mark items deleted"))
    }
}
