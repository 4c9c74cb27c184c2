//! Stops users from overwriting items that belong to someone else.

use async_trait::async_trait;

use super::{ItemSaveContext, ItemSaveOutcome, ItemSaveRule};
use crate::domain::{ConflictType, ItemConflict};

/// Refuses hashes whose uuid is already taken by another user's item.
#[derive(Debug, Default, Clone, Copy)]
pub struct OwnershipRule;

#[async_trait]
impl ItemSaveRule for OwnershipRule {
    async fn check(&self, context: &ItemSaveContext<'_>) -> ItemSaveOutcome {
        match context.existing_item {
            Some(existing) if existing.user_uuid != *context.user_uuid => {
                ItemSaveOutcome::Conflict(ItemConflict::with_unsaved_item(
                    ConflictType::UuidConflict,
                    context.item_hash.clone(),
                ))
            }
            _ => ItemSaveOutcome::Passed,
        }
    }
}
