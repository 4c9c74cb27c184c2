//! Immutable snapshots of note content.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use super::{ContentType, Item};

/// Historical copy of an item's encrypted content.
///
/// Revisions are linked to items through a join table so copies made for a
/// duplicate item stay independent of the original's history.
#[derive(Debug, Clone, PartialEq)]
pub struct Revision {
    pub uuid: Uuid,
    pub item_uuid: Uuid,
    pub content: Option<String>,
    pub content_type: ContentType,
    pub items_key_id: Option<String>,
    pub enc_item_key: Option<String>,
    pub auth_hash: Option<String>,
    /// Day the snapshot was taken; retention windows are counted in days.
    pub creation_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Revision {
    /// Snapshot `item` as of `now`.
    pub fn snapshot_of(item: &Item, now: DateTime<Utc>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            item_uuid: item.uuid,
            content: item.content.clone(),
            content_type: item.content_type,
            items_key_id: item.items_key_id.clone(),
            enc_item_key: item.enc_item_key.clone(),
            auth_hash: item.auth_hash.clone(),
            creation_date: now.date_naive(),
            created_at: item.created_at,
            updated_at: item.updated_at,
        }
    }

    /// Copy of this revision attached to another item.
    pub fn copied_to(&self, item_uuid: Uuid) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            item_uuid,
            ..self.clone()
        }
    }
}
