//! Domain model and use cases for the item sync engine.
//!
//! Purpose: hold the transport-agnostic rules of sync. Items, conflicts and
//! revisions live here alongside the services that save and serve them.
//! Adapters reach the outside world only through [`ports`].
//!
//! Public surface:
//! - Error (alias to `error::Error`): API error response payload.
//! - ErrorCode (alias to `error::ErrorCode`): stable error identifier.
//! - Item, ItemHash, ItemConflict: stored items, client uploads and the
//!   reasons an upload was refused.
//! - SyncItemsService: the sync use case behind the HTTP endpoint.

pub mod api_version;
pub mod content;
pub mod content_type;
pub mod duplicate_item_handler;
pub mod error;
pub mod events;
pub mod item;
pub mod item_service;
pub mod ports;
pub mod revision;
pub mod revision_service;
pub mod save_rules;
pub mod sync_items;
pub mod sync_response;
pub mod timer;
pub mod trace_id;
pub mod transfer_calculator;
pub mod user;

pub use self::api_version::ApiVersion;
pub use self::content_type::{ContentType, UnknownContentType};
pub use self::duplicate_item_handler::DuplicateItemSyncedHandler;
pub use self::error::{Error, ErrorCode};
pub use self::events::{DomainEvent, DuplicateItemSynced, ItemsSynced};
pub use self::item::{ConflictType, Item, ItemConflict, ItemFactory, ItemFactoryError, ItemHash};
pub use self::item_service::{ItemService, ItemServiceConfig};
pub use self::revision::Revision;
pub use self::revision_service::RevisionService;
pub use self::sync_items::SyncItemsService;
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{UserId, UserIdValidationError};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use syncing_server::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<()> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
