//! Response shape for the `20161215` API.
//!
//! Old clients understand a flat `unsaved` list instead of structured
//! conflicts. They also cannot tell a retrieved item apart from the copy they
//! just saved, so items present in both lists are dropped from
//! `retrieved_items` and reported as conflicts when the two copies disagree.

use serde::{Deserialize, Serialize};

use super::projection::{ItemProjection, SavedItemProjection};
use super::{SyncItemsResult, SyncResponse, SyncResponseFactory};
use crate::domain::{ConflictType, ItemConflict, ItemHash};

/// Largest tolerated gap between the saved and retrieved copies of an item,
/// in raw timestamp units.
pub const LEGACY_MIN_CONFLICT_INTERVAL: i64 = 20;

/// Item carried by an unsaved entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UnsavedItem {
    Server(ItemProjection),
    Client(ItemHash),
}

/// Error tag of an unsaved entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsavedError {
    pub tag: String,
}

/// One rejected item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnsavedEntry {
    pub item: UnsavedItem,
    pub error: UnsavedError,
}

impl UnsavedEntry {
    fn new(item: UnsavedItem, conflict_type: ConflictType) -> Self {
        Self {
            item,
            error: UnsavedError {
                tag: conflict_type.as_str().to_owned(),
            },
        }
    }
}

fn unsaved_entry(conflict: &ItemConflict) -> Option<UnsavedEntry> {
    let item = match (&conflict.server_item, &conflict.unsaved_item) {
        (Some(server_item), _) => UnsavedItem::Server(ItemProjection::from(server_item)),
        (None, Some(unsaved_item)) => UnsavedItem::Client(unsaved_item.clone()),
        (None, None) => return None,
    };
    Some(UnsavedEntry::new(item, conflict.conflict_type))
}

/// Sync response body for legacy clients.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegacySyncResponse {
    pub retrieved_items: Vec<ItemProjection>,
    pub saved_items: Vec<SavedItemProjection>,
    pub unsaved: Vec<UnsavedEntry>,
    pub sync_token: String,
    pub cursor_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integrity_hash: Option<String>,
}

/// Renders [`LegacySyncResponse`]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct LegacySyncResponseFactory;

impl SyncResponseFactory for LegacySyncResponseFactory {
    fn create_response(&self, result: SyncItemsResult) -> SyncResponse {
        let mut unsaved: Vec<UnsavedEntry> = result
            .conflicts
            .iter()
            .filter_map(unsaved_entry)
            .collect();

        let mut retrieved_items = Vec::with_capacity(result.retrieved_items.len());
        for retrieved in &result.retrieved_items {
            let saved = result
                .saved_items
                .iter()
                .find(|saved| saved.uuid == retrieved.uuid);
            match saved {
                Some(saved) => {
                    let difference = saved
                        .updated_at_timestamp
                        .saturating_sub(retrieved.updated_at_timestamp);
                    if difference.saturating_abs() > LEGACY_MIN_CONFLICT_INTERVAL {
                        unsaved.push(UnsavedEntry::new(
                            UnsavedItem::Server(ItemProjection::from(retrieved)),
                            ConflictType::SyncConflict,
                        ));
                    }
                }
                None => retrieved_items.push(ItemProjection::from(retrieved)),
            }
        }

        SyncResponse::Legacy(LegacySyncResponse {
            retrieved_items,
            saved_items: result
                .saved_items
                .iter()
                .map(SavedItemProjection::from)
                .collect(),
            unsaved,
            sync_token: result.sync_token,
            cursor_token: result.cursor_token,
            integrity_hash: result.integrity_hash,
        })
    }
}
