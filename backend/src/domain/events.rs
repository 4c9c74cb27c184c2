//! Domain events emitted by the sync engine.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::UserId;

/// A client marked an item as a duplicate of another item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateItemSynced {
    pub item_uuid: Uuid,
    pub user_uuid: UserId,
}

/// Items were saved and a realtime extension should receive them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemsSynced {
    pub user_uuid: UserId,
    pub extension_url: String,
    pub extension_id: Uuid,
    pub item_uuids: Vec<Uuid>,
    pub force_mute: bool,
    pub skip_file_backup: bool,
}

/// Events published through [`crate::domain::ports::DomainEventPublisher`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DomainEvent {
    DuplicateItemSynced(DuplicateItemSynced),
    ItemsSynced(ItemsSynced),
}

impl DomainEvent {
    /// Stable event name used in logs and on the wire.
    pub const fn event_type(&self) -> &'static str {
        match self {
            Self::DuplicateItemSynced(_) => "DUPLICATE_ITEM_SYNCED",
            Self::ItemsSynced(_) => "ITEMS_SYNCED",
        }
    }
}
