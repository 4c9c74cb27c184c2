//! OpenAPI schema definitions for sync payloads.
//!
//! The sync response types live in the domain and do not derive `ToSchema`.
//! These wrappers mirror their wire shape for documentation only.

use utoipa::ToSchema;

/// OpenAPI schema for [`crate::domain::sync_response::SyncResponse`].
///
/// Current API versions return `conflicts`; the legacy shape returns
/// `unsaved` instead. Both carry the remaining fields.
#[derive(ToSchema)]
#[schema(as = crate::domain::sync_response::SyncResponse)]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct SyncResponseSchema {
    /// Items changed on the server since the client's token.
    #[schema(value_type = Vec<Object>)]
    retrieved_items: Vec<serde_json::Value>,
    /// Items accepted from this request, without encrypted fields.
    #[schema(value_type = Vec<Object>)]
    saved_items: Vec<serde_json::Value>,
    /// Items refused with a conflict type.
    #[schema(value_type = Option<Vec<Object>>)]
    conflicts: Option<Vec<serde_json::Value>>,
    /// Legacy rendering of refused items.
    #[schema(value_type = Option<Vec<Object>>)]
    unsaved: Option<Vec<serde_json::Value>>,
    /// Token to send on the next sync.
    #[schema(example = "MjoxNjE1NTU1MTIzLjQ1Njc4OQ==")]
    sync_token: String,
    /// Token for the next page of this sync, when more items remain.
    cursor_token: Option<String>,
    /// SHA-256 over the user's item timestamps, when requested.
    integrity_hash: Option<String>,
}
