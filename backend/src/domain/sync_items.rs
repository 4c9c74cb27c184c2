//! Sync use case behind the sync endpoint.
//!
//! A sync retrieves server changes, saves the client's uploads and renders
//! both halves in the client's API version.

use std::collections::HashSet;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::item_service::{GetItemsRequest, ItemService, SaveItemsRequest};
use crate::domain::ports::{
    AuthService, DomainEventPublisher, ItemRepository, RevisionRepository, SyncItemsCommand,
    SyncItemsRequest,
};
use crate::domain::sync_response::{SyncItemsResult, SyncResponse, SyncResponseFactoryResolver};
use crate::domain::{ApiVersion, ConflictType, Error, ItemConflict};

/// Implements [`SyncItemsCommand`] on top of [`ItemService`].
#[derive(Clone)]
pub struct SyncItemsService<I, R, A, P> {
    items: ItemService<I, R, A, P>,
    resolver: SyncResponseFactoryResolver,
}

impl<I, R, A, P> SyncItemsService<I, R, A, P> {
    /// Create the use case.
    pub fn new(items: ItemService<I, R, A, P>) -> Self {
        Self {
            items,
            resolver: SyncResponseFactoryResolver,
        }
    }
}

fn sync_conflict_uuids(conflicts: &[ItemConflict]) -> HashSet<Uuid> {
    conflicts
        .iter()
        .filter(|conflict| conflict.conflict_type == ConflictType::SyncConflict)
        .filter_map(|conflict| conflict.server_item.as_ref().map(|item| item.uuid))
        .collect()
}

#[async_trait]
impl<I, R, A, P> SyncItemsCommand for SyncItemsService<I, R, A, P>
where
    I: ItemRepository,
    R: RevisionRepository,
    A: AuthService,
    P: DomainEventPublisher,
{
    async fn sync_items(&self, request: SyncItemsRequest) -> Result<SyncResponse, Error> {
        let api_version = ApiVersion::resolve(request.api_version.as_deref())?;
        let first_sync = request
            .sync_token
            .as_deref()
            .is_none_or(|token| token.trim().is_empty());

        let retrieved = self
            .items
            .get_items(&GetItemsRequest {
                user_uuid: request.user_uuid.clone(),
                sync_token: request.sync_token.clone(),
                cursor_token: request.cursor_token.clone(),
                limit: request.limit,
                content_type: request.content_type,
            })
            .await?;

        let saved = self
            .items
            .save_items(&SaveItemsRequest {
                user_uuid: request.user_uuid.clone(),
                items: request.items,
                api_version,
                read_only_access: request.read_only_access,
                user_agent: request.user_agent,
            })
            .await?;

        let mut retrieved_items = retrieved.items;
        if first_sync {
            retrieved_items = self
                .items
                .front_load_keys_items_to_top(&request.user_uuid, retrieved_items)
                .await?;
        }
        let conflicted = sync_conflict_uuids(&saved.conflicts);
        retrieved_items.retain(|item| !conflicted.contains(&item.uuid));

        let saved_uuids: Vec<Uuid> = saved.saved_items.iter().map(|item| item.uuid).collect();
        self.items
            .trigger_realtime_extensions(&request.user_uuid, &saved_uuids)
            .await;

        let integrity_hash = if request.compute_integrity_hash {
            Some(self.items.compute_integrity_hash(&request.user_uuid).await?)
        } else {
            None
        };

        let result = SyncItemsResult {
            retrieved_items,
            saved_items: saved.saved_items,
            conflicts: saved.conflicts,
            sync_token: saved.sync_token,
            cursor_token: retrieved.cursor_token,
            integrity_hash,
        };
        Ok(self.resolver.resolve(api_version).create_response(result))
    }
}
