//! Item synchronisation service.
//!
//! Retrieval selects everything that changed since the client's token,
//! bounded by a page limit and a byte budget. Saving runs each uploaded hash
//! through the [`ItemSaveValidator`] and then updates or creates the item.
//!
//! ## Tokens
//! - A sync token marks the end of a completed sync: the next retrieval is
//!   exclusive (`>`) of its timestamp.
//! - A cursor token marks the end of a page: the next retrieval is inclusive
//!   (`>=`) so items sharing the boundary timestamp are not skipped.
//! - Sync tokens are biased by one microsecond past the newest saved item so
//!   the client never re-downloads what it just uploaded.

use std::collections::HashSet;
use std::sync::Arc;

use mockable::Clock;
use pagination::{SyncToken, TokenError, TokenVersion};
use serde_json::json;
use sha2::{Digest, Sha256};
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::domain::content::decode;
use crate::domain::item::{non_empty, parse_duplicate_of};
use crate::domain::ports::{
    AuthService, DomainEventPublisher, ItemQuery, ItemRepository, ItemSortField,
    RevisionRepository, SortOrder, SyncTimeComparison,
};
use crate::domain::revision_service::map_item_error;
use crate::domain::save_rules::{ItemSaveContext, ItemSaveOutcome, ItemSaveValidator};
use crate::domain::timer::{micros_from_date_string, micros_to_millis, now_micros, seconds_between};
use crate::domain::transfer_calculator::ItemTransferCalculator;
use crate::domain::{
    ApiVersion, ConflictType, ContentType, DomainEvent, DuplicateItemSynced, Error, Item,
    ItemConflict, ItemFactory, ItemHash, ItemsSynced, RevisionService, UserId,
};

/// Page size used when the client does not ask for one.
pub const DEFAULT_ITEMS_LIMIT: i64 = 150;

/// Tunables for [`ItemService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemServiceConfig {
    /// Minimum seconds between two revisions of the same item.
    pub revisions_frequency_seconds: i64,
    /// Byte budget for the content of one page of retrieved items.
    pub content_size_transfer_limit: i64,
    /// Upper bound on the page size a client may request.
    pub max_items_limit: i64,
}

impl Default for ItemServiceConfig {
    fn default() -> Self {
        Self {
            revisions_frequency_seconds: 300,
            content_size_transfer_limit: 10_000_000,
            max_items_limit: 500,
        }
    }
}

/// Retrieval half of a sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetItemsRequest {
    pub user_uuid: UserId,
    pub sync_token: Option<String>,
    pub cursor_token: Option<String>,
    pub limit: Option<i64>,
    pub content_type: Option<ContentType>,
}

/// Items changed since the client's token.
#[derive(Debug, Clone, PartialEq)]
pub struct GetItemsResult {
    pub items: Vec<Item>,
    /// Present when more pages remain.
    pub cursor_token: Option<String>,
}

/// Upload half of a sync.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveItemsRequest {
    pub user_uuid: UserId,
    pub items: Vec<ItemHash>,
    pub api_version: ApiVersion,
    pub read_only_access: bool,
    pub user_agent: Option<String>,
}

/// Outcome of an upload.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveItemsResult {
    pub saved_items: Vec<Item>,
    pub conflicts: Vec<ItemConflict>,
    pub sync_token: String,
}

fn token_error(error: TokenError) -> Error {
    Error::invalid_request(error.to_string())
}

/// Core sync engine.
#[derive(Clone)]
pub struct ItemService<I, R, A, P> {
    item_repo: Arc<I>,
    revisions: RevisionService<R, I, A>,
    publisher: Arc<P>,
    validator: ItemSaveValidator,
    factory: ItemFactory,
    clock: Arc<dyn Clock>,
    config: ItemServiceConfig,
}

impl<I, R, A, P> ItemService<I, R, A, P> {
    /// Create a new service with the given collaborators.
    pub fn new(
        item_repo: Arc<I>,
        revisions: RevisionService<R, I, A>,
        publisher: Arc<P>,
        validator: ItemSaveValidator,
        factory: ItemFactory,
        clock: Arc<dyn Clock>,
        config: ItemServiceConfig,
    ) -> Self {
        Self {
            item_repo,
            revisions,
            publisher,
            validator,
            factory,
            clock,
            config,
        }
    }

    fn page_limit(&self, requested: Option<i64>) -> i64 {
        let limit = requested
            .filter(|limit| *limit >= 1)
            .unwrap_or(DEFAULT_ITEMS_LIMIT);
        limit.min(self.config.max_items_limit)
    }

    fn sync_token_after(&self, newest_micros: i64) -> String {
        SyncToken::from_micros(newest_micros.saturating_add(1)).encode()
    }
}

fn provided(token: &Option<String>) -> Option<&str> {
    token.as_deref().filter(|raw| !raw.trim().is_empty())
}

/// Cursor for the page that ends with `last`.
///
/// A page made only of items sitting on its inclusive lower bound would
/// hand out the same cursor again, so the cursor moves one microsecond past.
fn next_cursor(last: &Item, last_sync: Option<(i64, SyncTimeComparison)>) -> String {
    let inclusive_bound = last_sync
        .filter(|(_, comparison)| *comparison == SyncTimeComparison::GreaterThanOrEqual)
        .map(|(micros, _)| micros);
    let micros = if inclusive_bound == Some(last.updated_at_timestamp) {
        last.updated_at_timestamp.saturating_add(1)
    } else {
        last.updated_at_timestamp
    };
    SyncToken::from_micros(micros).encode()
}

/// Lower bound of a retrieval, resolved from the client's tokens.
fn resolve_last_sync(
    request: &GetItemsRequest,
) -> Result<Option<(i64, SyncTimeComparison)>, Error> {
    let (raw, comparison) = match (provided(&request.cursor_token), provided(&request.sync_token)) {
        (Some(cursor), _) => (cursor, SyncTimeComparison::GreaterThanOrEqual),
        (None, Some(sync)) => (sync, SyncTimeComparison::GreaterThan),
        (None, None) => return Ok(None),
    };

    let token = SyncToken::decode(raw).map_err(token_error)?;
    let micros = match token.version() {
        TokenVersion::DateString => micros_from_date_string(token.value()).ok_or_else(|| {
            Error::invalid_request("sync token date is not valid")
                .with_details(json!({ "value": token.value() }))
        })?,
        TokenVersion::Seconds => token.seconds_as_micros().map_err(token_error)?,
    };
    Ok(Some((micros, comparison)))
}

impl<I, R, A, P> ItemService<I, R, A, P>
where
    I: ItemRepository,
    R: RevisionRepository,
    A: AuthService,
    P: DomainEventPublisher,
{
    /// Items changed since the client's cursor or sync token.
    pub async fn get_items(&self, request: &GetItemsRequest) -> Result<GetItemsResult, Error> {
        let last_sync = resolve_last_sync(request)?;
        let limit = self.page_limit(request.limit);
        let query = ItemQuery {
            content_type: request.content_type,
            deleted: last_sync.is_none().then_some(false),
            last_sync_time: last_sync.map(|(micros, _)| micros),
            sync_time_comparison: last_sync
                .map(|(_, comparison)| comparison)
                .unwrap_or_default(),
            sort_by: Some(ItemSortField::UpdatedAtTimestamp),
            sort_order: SortOrder::Ascending,
            limit: Some(limit),
            ..ItemQuery::for_user(&request.user_uuid)
        };

        let candidates = self
            .item_repo
            .find_content_size_for_computing_transfer_limit(&query)
            .await
            .map_err(map_item_error)?;
        let uuids = ItemTransferCalculator.compute_item_uuids_to_fetch(
            &candidates,
            self.config.content_size_transfer_limit,
        );

        let items = if uuids.is_empty() {
            Vec::new()
        } else {
            let fetched = ItemQuery {
                uuids: Some(uuids),
                sort_by: Some(ItemSortField::UpdatedAtTimestamp),
                sort_order: SortOrder::Ascending,
                ..ItemQuery::for_user(&request.user_uuid)
            };
            self.item_repo
                .find_all(&fetched)
                .await
                .map_err(map_item_error)?
        };

        let total = self
            .item_repo
            .count_all(&query)
            .await
            .map_err(map_item_error)?;
        let truncated_by_budget = items.len() < candidates.len();
        let cursor_token = if total > limit || truncated_by_budget {
            items.last().map(|last| next_cursor(last, last_sync))
        } else {
            None
        };

        Ok(GetItemsResult {
            items,
            cursor_token,
        })
    }

    /// Validate and store uploaded items.
    ///
    /// Per-item problems become conflicts and the batch continues. Failing
    /// to look up or update an existing item aborts the request.
    pub async fn save_items(&self, request: &SaveItemsRequest) -> Result<SaveItemsResult, Error> {
        let batch_started_at = now_micros(self.clock.as_ref());

        if request.read_only_access {
            let conflicts = request
                .items
                .iter()
                .map(|hash| ItemConflict::with_unsaved_item(ConflictType::ReadonlyError, hash.clone()))
                .collect();
            return Ok(SaveItemsResult {
                saved_items: Vec::new(),
                conflicts,
                sync_token: self.sync_token_after(batch_started_at),
            });
        }

        let mut saved_items = Vec::new();
        let mut conflicts = Vec::new();
        for hash in &request.items {
            let existing = match Uuid::parse_str(&hash.uuid) {
                Ok(uuid) => self
                    .item_repo
                    .find_by_uuid(&uuid)
                    .await
                    .map_err(map_item_error)?,
                Err(_) => None,
            };
            let context = ItemSaveContext {
                user_uuid: &request.user_uuid,
                api_version: request.api_version,
                item_hash: hash,
                existing_item: existing.as_ref(),
                user_agent: request.user_agent.as_deref(),
            };

            match self.validator.validate(&context).await {
                ItemSaveOutcome::Conflict(conflict) => conflicts.push(conflict),
                ItemSaveOutcome::Skipped(stub) => saved_items.push(stub),
                ItemSaveOutcome::Passed => match existing {
                    Some(existing) => {
                        saved_items.push(self.update_existing(existing, hash, request).await?);
                    }
                    None => match self.create_new(hash, request).await {
                        Ok(item) => saved_items.push(item),
                        Err(error) => {
                            warn!(item_uuid = %hash.uuid, %error, "could not create item");
                            conflicts.push(ItemConflict::with_unsaved_item(
                                ConflictType::UuidConflict,
                                hash.clone(),
                            ));
                        }
                    },
                },
            }
        }

        let newest = saved_items
            .iter()
            .map(|item| item.updated_at_timestamp)
            .max()
            .unwrap_or(batch_started_at);

        Ok(SaveItemsResult {
            saved_items,
            conflicts,
            sync_token: self.sync_token_after(newest),
        })
    }

    async fn update_existing(
        &self,
        mut item: Item,
        hash: &ItemHash,
        request: &SaveItemsRequest,
    ) -> Result<Item, Error> {
        let previous_updated_at = item.updated_at_timestamp;
        let was_duplicate = item.duplicate_of.is_some();

        if let Some(content) = hash.content_str() {
            item.content = Some(content.to_owned());
        }
        if let Some(content_type) = hash.parsed_content_type() {
            item.content_type = content_type;
        }
        if let Some(key) = non_empty(hash.enc_item_key.as_ref()) {
            item.enc_item_key = Some(key.to_owned());
        }
        if let Some(key_id) = non_empty(hash.items_key_id.as_ref()) {
            item.items_key_id = Some(key_id.to_owned());
        }
        if let Some(auth_hash) = non_empty(hash.auth_hash.as_ref()) {
            item.auth_hash = Some(auth_hash.to_owned());
        }
        if let Ok(Some(duplicate_of)) = parse_duplicate_of(hash.duplicate_of.as_ref()) {
            item.duplicate_of = Some(duplicate_of);
        }
        if let Some(deleted) = hash.deleted {
            item.deleted = deleted;
        }
        if let Some(created) = hash.created_at_timestamp.filter(|ts| *ts != 0) {
            item.set_created_at(created);
        } else if let Some(created) =
            non_empty(hash.created_at.as_ref()).and_then(micros_from_date_string)
        {
            item.set_created_at(created);
        }
        if let Some(user_agent) = request.user_agent.as_deref() {
            item.last_user_agent = Some(user_agent.to_owned());
        }

        let now = now_micros(self.clock.as_ref());
        item.set_updated_at(now);
        item.enforce_deleted_invariant();

        self.item_repo.update(&item).await.map_err(map_item_error)?;

        let due_for_revision =
            seconds_between(previous_updated_at, now) >= self.config.revisions_frequency_seconds;
        if due_for_revision && !item.deleted {
            self.revisions.create_revision(&item).await?;
        }
        if !was_duplicate && item.duplicate_of.is_some() {
            self.publish_duplicate(&item).await;
        }
        Ok(item)
    }

    async fn create_new(&self, hash: &ItemHash, request: &SaveItemsRequest) -> Result<Item, Error> {
        let item = self
            .factory
            .create(&request.user_uuid, hash, request.user_agent.as_deref())
            .map_err(|error| Error::invalid_request(error.to_string()))?;
        self.item_repo.insert(&item).await.map_err(map_item_error)?;
        self.revisions.create_revision(&item).await?;
        if item.duplicate_of.is_some() {
            self.publish_duplicate(&item).await;
        }
        Ok(item)
    }

    async fn publish_duplicate(&self, item: &Item) {
        let event = DomainEvent::DuplicateItemSynced(DuplicateItemSynced {
            item_uuid: item.uuid,
            user_uuid: item.user_uuid.clone(),
        });
        if let Err(publish_error) = self.publisher.publish(event).await {
            error!(item_uuid = %item.uuid, error = %publish_error, "failed to publish duplicate item event");
        }
    }

    /// Digest of the user's non-deleted item timestamps.
    ///
    /// Clients compute the same digest locally to detect drift without
    /// downloading their items.
    pub async fn compute_integrity_hash(&self, user_uuid: &UserId) -> Result<String, Error> {
        let mut millis: Vec<i64> = self
            .item_repo
            .find_dates_for_computing_integrity_hash(user_uuid)
            .await
            .map_err(map_item_error)?
            .into_iter()
            .map(micros_to_millis)
            .collect();
        millis.sort_unstable_by(|a, b| b.cmp(a));
        let joined = millis
            .iter()
            .map(i64::to_string)
            .collect::<Vec<_>>()
            .join(",");
        Ok(hex::encode(Sha256::digest(joined.as_bytes())))
    }

    /// Put the user's items keys ahead of `retrieved`, skipping keys already
    /// present. Clients need keys before they can decrypt anything else.
    pub async fn front_load_keys_items_to_top(
        &self,
        user_uuid: &UserId,
        retrieved: Vec<Item>,
    ) -> Result<Vec<Item>, Error> {
        let query = ItemQuery {
            content_type: Some(ContentType::ItemsKey),
            deleted: Some(false),
            sort_by: Some(ItemSortField::UpdatedAtTimestamp),
            sort_order: SortOrder::Ascending,
            ..ItemQuery::for_user(user_uuid)
        };
        let keys = self
            .item_repo
            .find_all(&query)
            .await
            .map_err(map_item_error)?;
        let present: HashSet<Uuid> = retrieved.iter().map(|item| item.uuid).collect();
        let mut front_loaded: Vec<Item> = keys
            .into_iter()
            .filter(|key| !present.contains(&key.uuid))
            .collect();
        front_loaded.extend(retrieved);
        Ok(front_loaded)
    }

    /// Notify the user's realtime extensions about freshly saved items.
    ///
    /// Failures are logged; a sync never fails because an extension could
    /// not be notified.
    pub async fn trigger_realtime_extensions(&self, user_uuid: &UserId, saved_uuids: &[Uuid]) {
        if saved_uuids.is_empty() {
            return;
        }
        let query = ItemQuery {
            content_type: Some(ContentType::ServerExtension),
            deleted: Some(false),
            ..ItemQuery::for_user(user_uuid)
        };
        let extensions = match self.item_repo.find_all(&query).await {
            Ok(extensions) => extensions,
            Err(lookup_error) => {
                error!(error = %lookup_error, "failed to load server extensions");
                return;
            }
        };

        for extension in extensions {
            let decoded = extension.content.as_deref().map(decode).unwrap_or_default();
            if !decoded.is_realtime() {
                continue;
            }
            let Some(url) = decoded.url else {
                continue;
            };
            debug!(extension_uuid = %extension.uuid, "triggering realtime extension");
            let event = DomainEvent::ItemsSynced(ItemsSynced {
                user_uuid: user_uuid.clone(),
                extension_url: url,
                extension_id: extension.uuid,
                item_uuids: saved_uuids.to_vec(),
                force_mute: false,
                skip_file_backup: false,
            });
            if let Err(publish_error) = self.publisher.publish(event).await {
                error!(
                    extension_uuid = %extension.uuid,
                    error = %publish_error,
                    "failed to trigger realtime extension"
                );
            }
        }
    }
}

#[cfg(test)]
#[path = "item_service_tests.rs"]
mod tests;
