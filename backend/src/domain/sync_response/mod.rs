//! Version-specific rendering of sync results.
//!
//! [`SyncResponseFactoryResolver`] picks the response shape for the client's
//! API version: the legacy flat `unsaved` list for `20161215` and structured
//! conflicts for everything newer.

mod current;
mod legacy;
mod projection;

pub use current::{CurrentSyncResponse, CurrentSyncResponseFactory};
pub use legacy::{
    LEGACY_MIN_CONFLICT_INTERVAL, LegacySyncResponse, LegacySyncResponseFactory, UnsavedEntry,
    UnsavedError, UnsavedItem,
};
pub use projection::{ConflictProjection, ItemProjection, SavedItemProjection};

use serde::{Deserialize, Serialize};

use super::{ApiVersion, Item, ItemConflict};

/// Everything a sync produced, before rendering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncItemsResult {
    pub retrieved_items: Vec<Item>,
    pub saved_items: Vec<Item>,
    pub conflicts: Vec<ItemConflict>,
    pub sync_token: String,
    pub cursor_token: Option<String>,
    pub integrity_hash: Option<String>,
}

/// Rendered sync response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SyncResponse {
    Legacy(LegacySyncResponse),
    Current(CurrentSyncResponse),
}

/// Turns a sync result into a wire response.
pub trait SyncResponseFactory: Send + Sync {
    /// Render `result`.
    fn create_response(&self, result: SyncItemsResult) -> SyncResponse;
}

/// Maps API versions to response factories.
#[derive(Debug, Default, Clone, Copy)]
pub struct SyncResponseFactoryResolver;

impl SyncResponseFactoryResolver {
    /// Factory for `api_version`.
    pub fn resolve(self, api_version: ApiVersion) -> &'static dyn SyncResponseFactory {
        match api_version {
            ApiVersion::V20161215 => &LegacySyncResponseFactory,
            ApiVersion::V20190520 | ApiVersion::V20200115 => &CurrentSyncResponseFactory,
        }
    }
}
