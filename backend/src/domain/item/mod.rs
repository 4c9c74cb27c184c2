//! The item aggregate, its wire hash and save conflicts.
//!
//! ## Invariants
//! - Once `deleted` is set, `content`, `enc_item_key`, `auth_hash` and
//!   `items_key_id` are cleared and `content_size` is zero.
//! - `updated_at` and `updated_at_timestamp` always describe the same
//!   instant; the same holds for the `created_at` pair.
//! - `content_size` is the UTF-8 byte length of `content`.

mod factory;

pub use factory::{ItemFactory, ItemFactoryError};
pub(crate) use factory::parse_duplicate_of;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::timer::date_from_micros;
use super::{ContentType, UserId};

/// Synchronised, client-encrypted unit of user data.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub uuid: Uuid,
    pub user_uuid: UserId,
    pub content: Option<String>,
    pub content_type: ContentType,
    pub enc_item_key: Option<String>,
    pub items_key_id: Option<String>,
    pub auth_hash: Option<String>,
    pub duplicate_of: Option<Uuid>,
    pub deleted: bool,
    pub content_size: i64,
    pub created_at: DateTime<Utc>,
    pub created_at_timestamp: i64,
    pub updated_at: DateTime<Utc>,
    pub updated_at_timestamp: i64,
    pub last_user_agent: Option<String>,
}

impl Item {
    /// Set both update fields from a microsecond timestamp.
    pub fn set_updated_at(&mut self, micros: i64) {
        self.updated_at_timestamp = micros;
        self.updated_at = date_from_micros(micros);
    }

    /// Set both creation fields from a microsecond timestamp.
    pub fn set_created_at(&mut self, micros: i64) {
        self.created_at_timestamp = micros;
        self.created_at = date_from_micros(micros);
    }

    /// Recompute `content_size` from `content`.
    pub fn recompute_content_size(&mut self) {
        self.content_size = self
            .content
            .as_deref()
            .map_or(0, |content| i64::try_from(content.len()).unwrap_or(i64::MAX));
    }

    /// Clear encrypted fields when the item is deleted.
    pub fn enforce_deleted_invariant(&mut self) {
        if self.deleted {
            self.content = None;
            self.enc_item_key = None;
            self.auth_hash = None;
            self.items_key_id = None;
        }
        self.recompute_content_size();
    }
}

/// Item as sent by a client in a sync request.
///
/// Every field except `uuid` is optional; absent and empty values leave the
/// stored item untouched on update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemHash {
    #[serde(default)]
    pub uuid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duplicate_of: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enc_item_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items_key_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at_timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at_timestamp: Option<i64>,
}

impl ItemHash {
    /// Content when it was sent as a non-empty string.
    pub fn content_str(&self) -> Option<&str> {
        self.content
            .as_ref()
            .and_then(Value::as_str)
            .filter(|content| !content.is_empty())
    }

    /// Parsed content type, if present and known.
    pub fn parsed_content_type(&self) -> Option<ContentType> {
        self.content_type.as_deref().and_then(|raw| raw.parse().ok())
    }

    /// Whether the client marked the item deleted.
    pub fn is_deleted(&self) -> bool {
        self.deleted.unwrap_or(false)
    }
}

pub(crate) fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|raw| !raw.is_empty())
}

/// Reason a single item could not be saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictType {
    /// The server holds a different version of the item.
    SyncConflict,
    /// The uuid collides with another account's item, or the item could
    /// not be created.
    UuidConflict,
    /// The uuid is not a valid UUID.
    UuidError,
    /// The content type is missing or unknown.
    ContentTypeError,
    /// The content is not a string.
    ContentError,
    /// The session only has read access.
    ReadonlyError,
}

impl ConflictType {
    /// Wire tag of the conflict.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SyncConflict => "sync_conflict",
            Self::UuidConflict => "uuid_conflict",
            Self::UuidError => "uuid_error",
            Self::ContentTypeError => "content_type_error",
            Self::ContentError => "content_error",
            Self::ReadonlyError => "readonly_error",
        }
    }
}

/// Rejected save, carrying either the server copy or the client's hash.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemConflict {
    pub conflict_type: ConflictType,
    pub server_item: Option<Item>,
    pub unsaved_item: Option<ItemHash>,
}

impl ItemConflict {
    /// Conflict reporting the server's copy of the item.
    pub fn with_server_item(conflict_type: ConflictType, server_item: Item) -> Self {
        Self {
            conflict_type,
            server_item: Some(server_item),
            unsaved_item: None,
        }
    }

    /// Conflict echoing the client's unsaved hash.
    pub fn with_unsaved_item(conflict_type: ConflictType, unsaved_item: ItemHash) -> Self {
        Self {
            conflict_type,
            server_item: None,
            unsaved_item: Some(unsaved_item),
        }
    }

    /// Uuid the conflict is about.
    pub fn item_uuid(&self) -> Option<String> {
        self.server_item
            .as_ref()
            .map(|item| item.uuid.to_string())
            .or_else(|| self.unsaved_item.as_ref().map(|hash| hash.uuid.clone()))
    }
}
