//! Response shape for the `20190520` and `20200115` APIs.

use serde::{Deserialize, Serialize};

use super::projection::{ConflictProjection, ItemProjection, SavedItemProjection};
use super::{SyncItemsResult, SyncResponse, SyncResponseFactory};

/// Sync response body with structured conflicts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrentSyncResponse {
    pub retrieved_items: Vec<ItemProjection>,
    pub saved_items: Vec<SavedItemProjection>,
    pub conflicts: Vec<ConflictProjection>,
    pub sync_token: String,
    pub cursor_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integrity_hash: Option<String>,
}

/// Renders [`CurrentSyncResponse`]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct CurrentSyncResponseFactory;

impl SyncResponseFactory for CurrentSyncResponseFactory {
    fn create_response(&self, result: SyncItemsResult) -> SyncResponse {
        SyncResponse::Current(CurrentSyncResponse {
            retrieved_items: result
                .retrieved_items
                .iter()
                .map(ItemProjection::from)
                .collect(),
            saved_items: result
                .saved_items
                .iter()
                .map(SavedItemProjection::from)
                .collect(),
            conflicts: result
                .conflicts
                .iter()
                .map(ConflictProjection::from)
                .collect(),
            sync_token: result.sync_token,
            cursor_token: result.cursor_token,
            integrity_hash: result.integrity_hash,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::item::fixtures::{NOW_MICROS, note};
    use crate::domain::{ConflictType, ItemConflict, UserId};
    use serde_json::json;

    #[test]
    fn renders_every_list() {
        let user = UserId::random();
        let retrieved = note(&user, NOW_MICROS);
        let saved = note(&user, NOW_MICROS);
        let server_copy = note(&user, NOW_MICROS);

        let response = CurrentSyncResponseFactory.create_response(SyncItemsResult {
            retrieved_items: vec![retrieved.clone()],
            saved_items: vec![saved.clone()],
            conflicts: vec![ItemConflict::with_server_item(
                ConflictType::SyncConflict,
                server_copy,
            )],
            sync_token: "sync".to_owned(),
            cursor_token: Some("cursor".to_owned()),
            integrity_hash: Some("abc".to_owned()),
        });

        let value = serde_json::to_value(&response).expect("serialise");
        assert_eq!(value["retrieved_items"][0]["uuid"], json!(retrieved.uuid.to_string()));
        assert_eq!(value["saved_items"][0]["uuid"], json!(saved.uuid.to_string()));
        assert!(value["saved_items"][0].get("content").is_none());
        assert_eq!(value["conflicts"][0]["type"], json!("sync_conflict"));
        assert_eq!(value["sync_token"], json!("sync"));
        assert_eq!(value["cursor_token"], json!("cursor"));
        assert_eq!(value["integrity_hash"], json!("abc"));
    }
}
