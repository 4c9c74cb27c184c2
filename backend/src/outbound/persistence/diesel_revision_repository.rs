//! PostgreSQL-backed `RevisionRepository` implementation using Diesel ORM.
//!
//! A revision row and its `item_revisions` link are written and removed in
//! one transaction. Reads always go through the link table so copies made for
//! duplicates are visible only from the duplicate.

use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ContentType;
use crate::domain::Revision;
use crate::domain::ports::{RevisionRepository, RevisionRepositoryError};

use super::diesel_error_mapping;
use super::models::{NewItemRevisionRow, RevisionRow};
use super::pool::{DbPool, PoolError};
use super::schema::{item_revisions, revisions};

/// Diesel-backed implementation of the revision repository port.
#[derive(Clone)]
pub struct DieselRevisionRepository {
    pool: DbPool,
}

impl DieselRevisionRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> RevisionRepositoryError {
    diesel_error_mapping::map_pool_error(error, RevisionRepositoryError::connection)
}

fn map_diesel_error(
    operation: &'static str,
) -> impl FnOnce(diesel::result::Error) -> RevisionRepositoryError {
    move |error| {
        diesel_error_mapping::map_diesel_error(
            error,
            operation,
            RevisionRepositoryError::query,
            RevisionRepositoryError::connection,
        )
    }
}

fn row_to_revision(row: RevisionRow) -> Result<Revision, RevisionRepositoryError> {
    let content_type: ContentType = row
        .content_type
        .parse()
        .map_err(|err| RevisionRepositoryError::query(format!("revision {}: {err}", row.uuid)))?;
    Ok(Revision {
        uuid: row.uuid,
        item_uuid: row.item_uuid,
        content: row.content,
        content_type,
        items_key_id: row.items_key_id,
        enc_item_key: row.enc_item_key,
        auth_hash: row.auth_hash,
        creation_date: row.creation_date,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn revision_to_row(revision: &Revision) -> RevisionRow {
    RevisionRow {
        uuid: revision.uuid,
        item_uuid: revision.item_uuid,
        content: revision.content.clone(),
        content_type: revision.content_type.as_str().to_owned(),
        items_key_id: revision.items_key_id.clone(),
        enc_item_key: revision.enc_item_key.clone(),
        auth_hash: revision.auth_hash.clone(),
        creation_date: revision.creation_date,
        created_at: revision.created_at,
        updated_at: revision.updated_at,
    }
}

#[async_trait]
impl RevisionRepository for DieselRevisionRepository {
    async fn save(&self, revision: &Revision) -> Result<(), RevisionRepositoryError> {
        use diesel_async::AsyncConnection as _;
        use diesel_async::scoped_futures::ScopedFutureExt as _;

        let row = revision_to_row(revision);
        let link = NewItemRevisionRow {
            uuid: Uuid::new_v4(),
            item_uuid: revision.item_uuid,
            revision_uuid: revision.uuid,
        };
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction(|conn| {
            async move {
                diesel::insert_into(revisions::table)
                    .values(&row)
                    .execute(conn)
                    .await?;
                diesel::insert_into(item_revisions::table)
                    .values(&link)
                    .execute(conn)
                    .await?;
                Ok::<_, diesel::result::Error>(())
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error("save revision"))
    }

    async fn find_by_item_uuid(
        &self,
        item_uuid: &Uuid,
        created_after: Option<NaiveDate>,
    ) -> Result<Vec<Revision>, RevisionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let mut query = item_revisions::table
            .inner_join(revisions::table)
            .filter(item_revisions::item_uuid.eq(*item_uuid))
            .select(RevisionRow::as_select())
            .order(revisions::created_at.desc())
            .into_boxed();
        if let Some(date) = created_after {
            query = query.filter(revisions::creation_date.ge(date));
        }
        let rows: Vec<RevisionRow> = query
            .load(&mut conn)
            .await
            .map_err(map_diesel_error("find revisions"))?;
        rows.into_iter().map(row_to_revision).collect()
    }

    async fn find_one_by_uuid(
        &self,
        revision_uuid: &Uuid,
        item_uuid: &Uuid,
    ) -> Result<Option<Revision>, RevisionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = item_revisions::table
            .inner_join(revisions::table)
            .filter(item_revisions::item_uuid.eq(item_uuid))
            .filter(revisions::uuid.eq(revision_uuid))
            .select(RevisionRow::as_select())
            .first::<RevisionRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error("find revision"))?;
        row.map(row_to_revision).transpose()
    }

    async fn remove_by_uuid(
        &self,
        revision_uuid: &Uuid,
        item_uuid: &Uuid,
    ) -> Result<bool, RevisionRepositoryError> {
        use diesel_async::AsyncConnection as _;
        use diesel_async::scoped_futures::ScopedFutureExt as _;

        let (revision_uuid, item_uuid) = (*revision_uuid, *item_uuid);
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction(|conn| {
            async move {
                let unlinked = diesel::delete(
                    item_revisions::table
                        .filter(item_revisions::item_uuid.eq(item_uuid))
                        .filter(item_revisions::revision_uuid.eq(revision_uuid)),
                )
                .execute(conn)
                .await?;
                if unlinked == 0 {
                    return Ok::<_, diesel::result::Error>(false);
                }
                diesel::delete(revisions::table.filter(revisions::uuid.eq(revision_uuid)))
                    .execute(conn)
                    .await?;
                Ok(true)
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error("remove revision"))
    }
}
