//! Wire projections of items and conflicts.

use serde::{Deserialize, Serialize};

use crate::domain::timer::format_date;
use crate::domain::{Item, ItemConflict, ItemHash};

/// Full item as sent to clients in `retrieved_items`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemProjection {
    pub uuid: String,
    pub items_key_id: Option<String>,
    pub duplicate_of: Option<String>,
    pub enc_item_key: Option<String>,
    pub content: Option<String>,
    pub content_type: String,
    pub auth_hash: Option<String>,
    pub deleted: bool,
    pub created_at: String,
    pub created_at_timestamp: i64,
    pub updated_at: String,
    pub updated_at_timestamp: i64,
}

impl From<&Item> for ItemProjection {
    fn from(item: &Item) -> Self {
        Self {
            uuid: item.uuid.to_string(),
            items_key_id: item.items_key_id.clone(),
            duplicate_of: item.duplicate_of.map(|uuid| uuid.to_string()),
            enc_item_key: item.enc_item_key.clone(),
            content: item.content.clone(),
            content_type: item.content_type.to_string(),
            auth_hash: item.auth_hash.clone(),
            deleted: item.deleted,
            created_at: format_date(&item.created_at),
            created_at_timestamp: item.created_at_timestamp,
            updated_at: format_date(&item.updated_at),
            updated_at_timestamp: item.updated_at_timestamp,
        }
    }
}

/// Item as echoed back in `saved_items`.
///
/// The client already holds the encrypted fields it just uploaded, so only
/// identity and timestamps are returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedItemProjection {
    pub uuid: String,
    pub duplicate_of: Option<String>,
    pub content_type: String,
    pub deleted: bool,
    pub created_at: String,
    pub created_at_timestamp: i64,
    pub updated_at: String,
    pub updated_at_timestamp: i64,
}

impl From<&Item> for SavedItemProjection {
    fn from(item: &Item) -> Self {
        Self {
            uuid: item.uuid.to_string(),
            duplicate_of: item.duplicate_of.map(|uuid| uuid.to_string()),
            content_type: item.content_type.to_string(),
            deleted: item.deleted,
            created_at: format_date(&item.created_at),
            created_at_timestamp: item.created_at_timestamp,
            updated_at: format_date(&item.updated_at),
            updated_at_timestamp: item.updated_at_timestamp,
        }
    }
}

/// Structured conflict used by current API versions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictProjection {
    #[serde(rename = "type")]
    pub conflict_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_item: Option<ItemProjection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unsaved_item: Option<ItemHash>,
}

impl From<&ItemConflict> for ConflictProjection {
    fn from(conflict: &ItemConflict) -> Self {
        Self {
            conflict_type: conflict.conflict_type.as_str().to_owned(),
            server_item: conflict.server_item.as_ref().map(ItemProjection::from),
            unsaved_item: conflict.unsaved_item.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::item::fixtures::{NOW_MICROS, note};
    use crate::domain::{ConflictType, UserId};
    use serde_json::json;

    #[test]
    fn item_projection_formats_dates_for_clients() {
        let item = note(&UserId::random(), NOW_MICROS + 123_456);
        let value = serde_json::to_value(ItemProjection::from(&item)).expect("serialise");

        assert_eq!(value["updated_at"], json!("2021-03-15T09:00:00.123Z"));
        assert_eq!(value["updated_at_timestamp"], json!(NOW_MICROS + 123_456));
        assert_eq!(value["content_type"], json!("Note"));
        assert_eq!(value["duplicate_of"], json!(null));
    }

    #[test]
    fn saved_projection_omits_encrypted_fields() {
        let item = note(&UserId::random(), NOW_MICROS);
        let value = serde_json::to_value(SavedItemProjection::from(&item)).expect("serialise");

        for field in ["content", "enc_item_key", "items_key_id", "auth_hash"] {
            assert!(value.get(field).is_none(), "{field} should be omitted");
        }
    }

    #[test]
    fn conflict_projection_uses_type_key() {
        let item = note(&UserId::random(), NOW_MICROS);
        let conflict = ItemConflict::with_server_item(ConflictType::SyncConflict, item);
        let value = serde_json::to_value(ConflictProjection::from(&conflict)).expect("serialise");

        assert_eq!(value["type"], json!("sync_conflict"));
        assert!(value.get("server_item").is_some());
        assert!(value.get("unsaved_item").is_none());
    }
}
