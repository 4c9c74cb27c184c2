//! End-to-end sync flows over in-memory repositories.
//!
//! Each test drives the public sync use case the way two client devices
//! would, then inspects the stored items and their revision history.

#[path = "sync_flow/doubles.rs"]
mod doubles;

use std::collections::HashSet;
use std::sync::Arc;

use doubles::{InMemoryItems, InMemoryRevisions, SteppingClock};
use mockable::Clock;
use rstest::{fixture, rstest};
use serde_json::json;
use syncing_server::domain::ports::{
    FixtureAuthService, FixtureDomainEventPublisher, RevisionsQuery, SyncItemsCommand,
    SyncItemsRequest,
};
use syncing_server::domain::save_rules::{ItemSaveValidator, MfaRule};
use syncing_server::domain::sync_response::{CurrentSyncResponse, SyncResponse};
use syncing_server::domain::{
    ItemFactory, ItemHash, ItemService, ItemServiceConfig, RevisionService, SyncItemsService,
    UserId,
};
use uuid::Uuid;

const START_MICROS: i64 = 1_700_000_000_000_000;
const CURRENT_API: &str = "20200115";

type Revisions = RevisionService<InMemoryRevisions, InMemoryItems, FixtureAuthService>;

struct Harness {
    items: Arc<InMemoryItems>,
    clock: Arc<SteppingClock>,
    revisions: Revisions,
    sync: SyncItemsService<
        InMemoryItems,
        InMemoryRevisions,
        FixtureAuthService,
        FixtureDomainEventPublisher,
    >,
}

impl Harness {
    async fn sync(&self, request: SyncItemsRequest) -> CurrentSyncResponse {
        match self.sync.sync_items(request).await.expect("sync succeeds") {
            SyncResponse::Current(body) => body,
            SyncResponse::Legacy(_) => panic!("expected the current response shape"),
        }
    }

    async fn upload(&self, user: &UserId, items: Vec<ItemHash>) -> CurrentSyncResponse {
        let mut request = current_request(user);
        request.items = items;
        self.sync(request).await
    }
}

#[fixture]
fn harness() -> Harness {
    harness_with(ItemServiceConfig::default())
}

fn harness_with(config: ItemServiceConfig) -> Harness {
    let clock = Arc::new(SteppingClock::at_micros(START_MICROS));
    let dyn_clock: Arc<dyn Clock> = clock.clone();
    let items = Arc::new(InMemoryItems::default());
    let revision_repo = Arc::new(InMemoryRevisions::default());
    let auth = Arc::new(FixtureAuthService);
    let make_revisions = || {
        RevisionService::new(
            Arc::clone(&revision_repo),
            Arc::clone(&items),
            Arc::clone(&auth),
            Arc::clone(&dyn_clock),
        )
    };

    let factory = ItemFactory::new(Arc::clone(&dyn_clock));
    let mfa_rule = MfaRule::new(
        Arc::clone(&auth),
        Arc::clone(&items),
        factory.clone(),
        Arc::clone(&dyn_clock),
    );
    let service = ItemService::new(
        Arc::clone(&items),
        make_revisions(),
        Arc::new(FixtureDomainEventPublisher),
        ItemSaveValidator::standard(Arc::new(mfa_rule)),
        factory,
        Arc::clone(&dyn_clock),
        config,
    );

    Harness {
        revisions: make_revisions(),
        sync: SyncItemsService::new(service),
        items,
        clock,
    }
}

fn current_request(user: &UserId) -> SyncItemsRequest {
    let mut request = SyncItemsRequest::new(user.clone());
    request.api_version = Some(CURRENT_API.to_owned());
    request
}

fn note_hash(uuid: Uuid, content: &str, updated_at_timestamp: Option<i64>) -> ItemHash {
    let mut value = json!({
        "uuid": uuid.to_string(),
        "content_type": "Note",
        "content": content,
        "enc_item_key": "004:key",
        "items_key_id": "items-key-1",
    });
    if let Some(ts) = updated_at_timestamp {
        value["updated_at_timestamp"] = json!(ts);
    }
    serde_json::from_value(value).expect("valid item hash")
}

#[rstest]
#[tokio::test]
async fn stale_edit_from_second_device_conflicts_and_history_is_kept(harness: Harness) {
    let user = UserId::random();
    let note = Uuid::new_v4();

    let created = harness
        .upload(&user, vec![note_hash(note, "004:first", None)])
        .await;
    assert_eq!(created.saved_items.len(), 1);
    assert_eq!(created.saved_items[0].uuid, note.to_string());
    assert_eq!(created.saved_items[0].updated_at_timestamp, START_MICROS);
    let device_a_token = created.sync_token.clone();

    harness.clock.advance_seconds(600);
    let device_b_first = harness.sync(current_request(&user)).await;
    assert_eq!(device_b_first.retrieved_items.len(), 1);
    let seen = device_b_first.retrieved_items[0].updated_at_timestamp;

    let edited = harness
        .upload(&user, vec![note_hash(note, "004:second", Some(seen))])
        .await;
    assert!(edited.conflicts.is_empty());
    assert_eq!(edited.saved_items.len(), 1);
    let edited_at = edited.saved_items[0].updated_at_timestamp;
    assert!(edited_at > START_MICROS);

    harness.clock.advance_seconds(60);
    let mut stale = current_request(&user);
    stale.sync_token = Some(device_a_token);
    stale.items = vec![note_hash(note, "004:stale", Some(START_MICROS))];
    let response = harness.sync(stale).await;

    assert!(response.saved_items.is_empty());
    assert!(
        response.retrieved_items.is_empty(),
        "conflicted items are not retrieved twice"
    );
    assert_eq!(response.conflicts.len(), 1);
    assert_eq!(response.conflicts[0].conflict_type, "sync_conflict");
    let server_item = response.conflicts[0]
        .server_item
        .as_ref()
        .expect("server copy attached");
    assert_eq!(server_item.content.as_deref(), Some("004:second"));

    let stored = harness.items.get(&note).expect("note stored");
    assert_eq!(stored.content.as_deref(), Some("004:second"));
    assert_eq!(stored.updated_at_timestamp, edited_at);

    let history = harness
        .revisions
        .get_revisions(&user, &note)
        .await
        .expect("history readable");
    assert_eq!(history.len(), 2, "creation and the later edit are both kept");
}

#[rstest]
#[tokio::test]
async fn another_users_uuid_is_a_uuid_conflict(harness: Harness) {
    let owner = UserId::random();
    let intruder = UserId::random();
    let note = Uuid::new_v4();
    harness
        .upload(&owner, vec![note_hash(note, "004:mine", None)])
        .await;

    let response = harness
        .upload(&intruder, vec![note_hash(note, "004:theirs", None)])
        .await;

    assert!(response.saved_items.is_empty());
    assert_eq!(response.conflicts.len(), 1);
    assert_eq!(response.conflicts[0].conflict_type, "uuid_conflict");
    let stored = harness.items.get(&note).expect("note stored");
    assert_eq!(stored.user_uuid, owner);
    assert_eq!(stored.content.as_deref(), Some("004:mine"));
}

#[rstest]
#[tokio::test]
async fn read_only_sessions_save_nothing(harness: Harness) {
    let user = UserId::random();
    let note = Uuid::new_v4();
    let mut request = current_request(&user);
    request.read_only_access = true;
    request.items = vec![note_hash(note, "004:draft", None)];

    let response = harness.sync(request).await;

    assert!(response.saved_items.is_empty());
    assert_eq!(response.conflicts.len(), 1);
    assert_eq!(response.conflicts[0].conflict_type, "readonly_error");
    assert!(harness.items.get(&note).is_none());
}

#[rstest]
#[tokio::test]
async fn cursor_tokens_page_through_every_item(harness: Harness) {
    let user = UserId::random();
    let mut uploaded = HashSet::new();
    for index in 0..5 {
        let uuid = Uuid::new_v4();
        harness
            .upload(&user, vec![note_hash(uuid, &format!("004:note-{index}"), None)])
            .await;
        uploaded.insert(uuid.to_string());
        harness.clock.advance_seconds(1);
    }

    let mut seen = HashSet::new();
    let mut cursor = None;
    for _ in 0..uploaded.len() {
        let mut request = current_request(&user);
        request.limit = Some(2);
        request.cursor_token = cursor.take();
        let page = harness.sync(request).await;
        assert!(page.retrieved_items.len() <= 2);
        seen.extend(page.retrieved_items.into_iter().map(|item| item.uuid));
        match page.cursor_token {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    assert!(cursor.is_none(), "paging finishes within the item count");
    assert_eq!(seen, uploaded);
}

#[rstest]
#[tokio::test]
async fn integrity_hash_tracks_stored_items(harness: Harness) {
    let user = UserId::random();
    let mut request = current_request(&user);
    request.compute_integrity_hash = true;
    let empty = harness.sync(request.clone()).await;

    harness
        .upload(&user, vec![note_hash(Uuid::new_v4(), "004:body", None)])
        .await;
    let populated = harness.sync(request).await;

    let before = empty.integrity_hash.expect("hash requested");
    let after = populated.integrity_hash.expect("hash requested");
    assert_eq!(before.len(), 64);
    assert_ne!(before, after);
}

#[tokio::test]
async fn oversized_items_do_not_stall_cursor_paging() {
    let harness = harness_with(ItemServiceConfig {
        content_size_transfer_limit: 10,
        ..ItemServiceConfig::default()
    });
    let user = UserId::random();
    let bodies = ["004:a".to_owned(), format!("004:{}", "b".repeat(96)), "004:c".to_owned()];
    let mut uploaded = HashSet::new();
    for body in &bodies {
        let uuid = Uuid::new_v4();
        harness.upload(&user, vec![note_hash(uuid, body, None)]).await;
        uploaded.insert(uuid.to_string());
        harness.clock.advance_seconds(1);
    }

    let mut seen = HashSet::new();
    let mut cursor = None;
    let mut pages = 0;
    loop {
        pages += 1;
        assert!(pages <= bodies.len() + 1, "paging must terminate");
        let mut request = current_request(&user);
        request.cursor_token = cursor.take();
        let page = harness.sync(request).await;
        seen.extend(page.retrieved_items.into_iter().map(|item| item.uuid));
        match page.cursor_token {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    assert_eq!(seen, uploaded, "every item is delivered");
}
