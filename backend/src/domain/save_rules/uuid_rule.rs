//! Rejects hashes whose identifiers are not UUIDs.

use async_trait::async_trait;
use uuid::Uuid;

use super::{ItemSaveContext, ItemSaveOutcome, ItemSaveRule};
use crate::domain::item::parse_duplicate_of;
use crate::domain::{ConflictType, ItemConflict};

/// Requires `uuid`, and `duplicate_of` when present, to be valid UUIDs.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidRule;

#[async_trait]
impl ItemSaveRule for UuidRule {
    async fn check(&self, context: &ItemSaveContext<'_>) -> ItemSaveOutcome {
        let hash = context.item_hash;
        let uuid_ok = Uuid::parse_str(&hash.uuid).is_ok();
        let duplicate_ok = parse_duplicate_of(hash.duplicate_of.as_ref()).is_ok();
        if uuid_ok && duplicate_ok {
            return ItemSaveOutcome::Passed;
        }
        ItemSaveOutcome::Conflict(ItemConflict::with_unsaved_item(
            ConflictType::UuidError,
            hash.clone(),
        ))
    }
}
