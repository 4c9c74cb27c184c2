//! Driving port for the sync endpoint.
//!
//! A sync both uploads the client's changed items and downloads everything
//! that changed on the server since the client's last token. Inbound adapters
//! call [`SyncItemsCommand`] and serialise the version-specific response it
//! returns.

use async_trait::async_trait;
use pagination::SyncToken;

use crate::domain::sync_response::{CurrentSyncResponse, SyncResponse};
use crate::domain::{ContentType, Error, ItemHash, UserId};

/// Request to sync a batch of items.
#[derive(Debug, Clone)]
pub struct SyncItemsRequest {
    /// Authenticated owner of the items.
    pub user_uuid: UserId,
    /// Whether the session may only read.
    pub read_only_access: bool,
    /// Raw API version sent by the client; blank means the legacy API.
    pub api_version: Option<String>,
    /// Items the client wants to save.
    pub items: Vec<ItemHash>,
    /// Token returned by the previous completed sync.
    pub sync_token: Option<String>,
    /// Token returned by the previous page of this sync.
    pub cursor_token: Option<String>,
    /// Requested page size.
    pub limit: Option<i64>,
    /// Restrict retrieved items to one content type.
    pub content_type: Option<ContentType>,
    /// Whether to include the integrity hash.
    pub compute_integrity_hash: bool,
    /// Client user agent, recorded on saved items.
    pub user_agent: Option<String>,
}

impl SyncItemsRequest {
    /// Empty sync for `user_uuid` on the legacy API.
    pub fn new(user_uuid: UserId) -> Self {
        Self {
            user_uuid,
            read_only_access: false,
            api_version: None,
            items: Vec::new(),
            sync_token: None,
            cursor_token: None,
            limit: None,
            content_type: None,
            compute_integrity_hash: false,
            user_agent: None,
        }
    }
}

/// Domain use-case port for syncing items.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SyncItemsCommand: Send + Sync {
    /// Save the uploaded items and collect server changes.
    async fn sync_items(&self, request: SyncItemsRequest) -> Result<SyncResponse, Error>;
}

/// Fixture command that saves nothing and retrieves nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureSyncItemsCommand;

#[async_trait]
impl SyncItemsCommand for FixtureSyncItemsCommand {
    async fn sync_items(&self, _request: SyncItemsRequest) -> Result<SyncResponse, Error> {
        Ok(SyncResponse::Current(CurrentSyncResponse {
            sync_token: SyncToken::from_micros(1).encode(),
            ..CurrentSyncResponse::default()
        }))
    }
}
