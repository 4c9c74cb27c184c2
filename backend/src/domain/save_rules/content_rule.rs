//! Rejects hashes whose content is not text.

use async_trait::async_trait;
use serde_json::Value;

use super::{ItemSaveContext, ItemSaveOutcome, ItemSaveRule};
use crate::domain::{ConflictType, ItemConflict};

/// Content may be absent, null or a string; anything else is refused.
#[derive(Debug, Default, Clone, Copy)]
pub struct ContentRule;

#[async_trait]
impl ItemSaveRule for ContentRule {
    async fn check(&self, context: &ItemSaveContext<'_>) -> ItemSaveOutcome {
        match context.item_hash.content {
            None | Some(Value::Null | Value::String(_)) => ItemSaveOutcome::Passed,
            Some(_) => ItemSaveOutcome::Conflict(ItemConflict::with_unsaved_item(
                ConflictType::ContentError,
                context.item_hash.clone(),
            )),
        }
    }
}
