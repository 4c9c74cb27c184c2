//! Diesel row structs.
//!
//! Rows mirror `schema.rs` and never leave the persistence module;
//! repositories convert them to and from domain types.

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{item_revisions, items, revisions};

/// Row read from and written to the `items` table.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(primary_key(uuid))]
#[diesel(treat_none_as_null = true)]
pub(crate) struct ItemRow {
    pub uuid: Uuid,
    pub user_uuid: Uuid,
    pub content: Option<String>,
    pub content_type: String,
    pub content_size: i64,
    pub enc_item_key: Option<String>,
    pub items_key_id: Option<String>,
    pub auth_hash: Option<String>,
    pub duplicate_of: Option<Uuid>,
    pub deleted: bool,
    pub last_user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
    pub created_at_timestamp: i64,
    pub updated_at: DateTime<Utc>,
    pub updated_at_timestamp: i64,
}

/// Size projection used by the transfer limit.
#[derive(Debug, Clone, Copy, Queryable, Selectable)]
#[diesel(table_name = items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ItemContentSizeRow {
    pub uuid: Uuid,
    pub content_size: i64,
}

/// Row of the `revisions` table.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = revisions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct RevisionRow {
    pub uuid: Uuid,
    pub item_uuid: Uuid,
    pub content: Option<String>,
    pub content_type: String,
    pub items_key_id: Option<String>,
    pub enc_item_key: Option<String>,
    pub auth_hash: Option<String>,
    pub creation_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insertable link between an item and one of its revisions.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = item_revisions)]
pub(crate) struct NewItemRevisionRow {
    pub uuid: Uuid,
    pub item_uuid: Uuid,
    pub revision_uuid: Uuid,
}
