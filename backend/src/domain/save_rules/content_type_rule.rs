//! Rejects hashes without a recognised content type.

use async_trait::async_trait;

use super::{ItemSaveContext, ItemSaveOutcome, ItemSaveRule};
use crate::domain::{ConflictType, ItemConflict};

/// Requires a content type the server knows about.
#[derive(Debug, Default, Clone, Copy)]
pub struct ContentTypeRule;

#[async_trait]
impl ItemSaveRule for ContentTypeRule {
    async fn check(&self, context: &ItemSaveContext<'_>) -> ItemSaveOutcome {
        if context.item_hash.parsed_content_type().is_some() {
            return ItemSaveOutcome::Passed;
        }
        ItemSaveOutcome::Conflict(ItemConflict::with_unsaved_item(
            ConflictType::ContentTypeError,
            context.item_hash.clone(),
        ))
    }
}
