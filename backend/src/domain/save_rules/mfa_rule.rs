//! Redirects legacy two-factor items to the auth subsystem.
//!
//! Two-factor secrets used to be synced as ordinary items. They now live in
//! user settings, so MFA items are handed to the auth service and answered
//! with a stub that never reaches the item table.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::warn;
use uuid::Uuid;
use zeroize::Zeroizing;

use super::{ItemSaveContext, ItemSaveOutcome, ItemSaveRule};
use crate::domain::content::decode;
use crate::domain::ports::{
    AuthService, AuthServiceError, ItemQuery, ItemRepository, ItemRepositoryError, MfaTransition,
};
use crate::domain::timer::now_micros;
use crate::domain::{ConflictType, ContentType, ItemConflict, ItemFactory, ItemHash, UserId};

/// Display name of the server extension that managed two-factor secrets
/// before the migration.
pub const LEGACY_MFA_EXTENSION_NAME: &str = "2FA Manager";

#[derive(Debug, thiserror::Error)]
enum MfaMigrationError {
    #[error(transparent)]
    Auth(#[from] AuthServiceError),
    #[error(transparent)]
    Items(#[from] ItemRepositoryError),
}

/// Sends MFA items to user settings instead of storing them.
pub struct MfaRule<A, R> {
    auth_service: Arc<A>,
    item_repository: Arc<R>,
    item_factory: ItemFactory,
    clock: Arc<dyn Clock>,
}

impl<A, R> MfaRule<A, R> {
    /// Create the rule.
    pub fn new(
        auth_service: Arc<A>,
        item_repository: Arc<R>,
        item_factory: ItemFactory,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            auth_service,
            item_repository,
            item_factory,
            clock,
        }
    }
}

impl<A, R> MfaRule<A, R>
where
    A: AuthService,
    R: ItemRepository,
{
    async fn remove_secret(&self, user_uuid: &UserId) -> Result<(), MfaMigrationError> {
        self.auth_service.remove_user_mfa(user_uuid).await?;
        self.auth_service
            .set_mfa_transition(user_uuid, MfaTransition::Deleted)
            .await?;
        Ok(())
    }

    async fn migrate_secret(
        &self,
        user_uuid: &UserId,
        item_uuid: &Uuid,
        secret: &str,
    ) -> Result<(), MfaMigrationError> {
        self.auth_service
            .save_user_mfa(user_uuid, item_uuid, secret)
            .await?;
        self.auth_service
            .set_mfa_transition(user_uuid, MfaTransition::Migrated)
            .await?;
        self.retire_legacy_extensions(user_uuid).await
    }

    async fn retire_legacy_extensions(&self, user_uuid: &UserId) -> Result<(), MfaMigrationError> {
        let query = ItemQuery {
            content_type: Some(ContentType::ServerExtension),
            deleted: Some(false),
            ..ItemQuery::for_user(user_uuid)
        };
        let extensions = self.item_repository.find_all(&query).await?;
        let legacy: Vec<Uuid> = extensions
            .iter()
            .filter(|item| {
                item.content.as_deref().map(decode).and_then(|content| content.name)
                    == Some(LEGACY_MFA_EXTENSION_NAME.to_owned())
            })
            .map(|item| item.uuid)
            .collect();
        if legacy.is_empty() {
            return Ok(());
        }
        self.item_repository
            .mark_items_as_deleted(&legacy, now_micros(self.clock.as_ref()))
            .await?;
        Ok(())
    }

    fn skipped(&self, context: &ItemSaveContext<'_>) -> ItemSaveOutcome {
        match self
            .item_factory
            .create_stub(context.user_uuid, context.item_hash, context.user_agent)
        {
            Ok(stub) => ItemSaveOutcome::Skipped(stub),
            Err(error) => {
                warn!(%error, "could not build MFA stub item");
                sync_conflict(context.item_hash)
            }
        }
    }
}

fn sync_conflict(hash: &ItemHash) -> ItemSaveOutcome {
    ItemSaveOutcome::Conflict(ItemConflict::with_unsaved_item(
        ConflictType::SyncConflict,
        hash.clone(),
    ))
}

#[async_trait]
impl<A, R> ItemSaveRule for MfaRule<A, R>
where
    A: AuthService,
    R: ItemRepository,
{
    async fn check(&self, context: &ItemSaveContext<'_>) -> ItemSaveOutcome {
        let hash = context.item_hash;
        if hash.parsed_content_type() != Some(ContentType::Mfa) {
            return ItemSaveOutcome::Passed;
        }

        let result = if hash.is_deleted() {
            self.remove_secret(context.user_uuid).await
        } else {
            let Ok(item_uuid) = Uuid::parse_str(&hash.uuid) else {
                return sync_conflict(hash);
            };
            let decoded = hash.content_str().map(decode).unwrap_or_default();
            let Some(secret) = decoded.secret.map(Zeroizing::new) else {
                return ItemSaveOutcome::Conflict(ItemConflict::with_unsaved_item(
                    ConflictType::ContentError,
                    hash.clone(),
                ));
            };
            self.migrate_secret(context.user_uuid, &item_uuid, secret.as_str())
                .await
        };

        match result {
            Ok(()) => self.skipped(context),
            Err(error) => {
                warn!(%error, user_uuid = %context.user_uuid, "MFA migration failed");
                sync_conflict(hash)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ApiVersion;
    use crate::domain::content::encode;
    use crate::domain::item::fixtures::{NOW_MICROS, note};
    use crate::domain::ports::{MockAuthService, MockItemRepository};
    use crate::test_support::fixed_clock;
    use mockall::predicate::eq;
    use rstest::rstest;
    use serde_json::json;

    const ITEM_UUID: &str = "2f1b2c9e-83a5-4f0d-9a2d-2f0a5b6f6c11";

    fn rule(auth: MockAuthService, items: MockItemRepository) -> MfaRule<MockAuthService, MockItemRepository> {
        let clock = fixed_clock(NOW_MICROS);
        MfaRule::new(
            Arc::new(auth),
            Arc::new(items),
            ItemFactory::new(Arc::clone(&clock)),
            clock,
        )
    }

    fn mfa_hash(content: Option<String>, deleted: bool) -> ItemHash {
        ItemHash {
            uuid: ITEM_UUID.to_owned(),
            content: content.map(serde_json::Value::String),
            content_type: Some("SF|MFA".to_owned()),
            deleted: Some(deleted),
            ..ItemHash::default()
        }
    }

    async fn run(
        rule: &MfaRule<MockAuthService, MockItemRepository>,
        user: &UserId,
        hash: &ItemHash,
    ) -> ItemSaveOutcome {
        rule.check(&ItemSaveContext {
            user_uuid: user,
            api_version: ApiVersion::V20200115,
            item_hash: hash,
            existing_item: None,
            user_agent: Some("test-agent"),
        })
        .await
    }

    #[rstest]
    #[tokio::test]
    async fn other_content_types_pass_untouched() {
        let user = UserId::random();
        let existing = note(&user, NOW_MICROS);
        let hash = crate::domain::item::fixtures::hash_for(&existing);

        let outcome = run(
            &rule(MockAuthService::new(), MockItemRepository::new()),
            &user,
            &hash,
        )
        .await;

        assert_eq!(outcome, ItemSaveOutcome::Passed);
    }

    #[rstest]
    #[tokio::test]
    async fn secret_is_migrated_and_stub_returned() {
        let user = UserId::random();
        let item_uuid = Uuid::parse_str(ITEM_UUID).expect("uuid");
        let mut extension = note(&user, NOW_MICROS);
        extension.content_type = ContentType::ServerExtension;
        extension.content = Some(encode(&json!({ "name": LEGACY_MFA_EXTENSION_NAME })));
        let mut unrelated = note(&user, NOW_MICROS);
        unrelated.content_type = ContentType::ServerExtension;
        unrelated.content = Some(encode(&json!({ "name": "Backups" })));
        let legacy_uuid = extension.uuid;

        let mut auth = MockAuthService::new();
        let expected_user = user.clone();
        auth.expect_save_user_mfa()
            .withf(move |u, id, secret| *u == expected_user && *id == item_uuid && secret == "shhhh")
            .times(1)
            .return_once(|_, _, _| Ok(()));
        auth.expect_set_mfa_transition()
            .with(mockall::predicate::always(), eq(MfaTransition::Migrated))
            .times(1)
            .return_once(|_, _| Ok(()));
        let mut items = MockItemRepository::new();
        items
            .expect_find_all()
            .withf(|query| query.content_type == Some(ContentType::ServerExtension))
            .times(1)
            .return_once(move |_| Ok(vec![extension, unrelated]));
        items
            .expect_mark_items_as_deleted()
            .withf(move |uuids, ts| uuids == [legacy_uuid] && *ts == NOW_MICROS)
            .times(1)
            .return_once(|_, _| Ok(()));
        items.expect_insert().never();
        items.expect_update().never();

        let hash = mfa_hash(Some(encode(&json!({ "secret": "shhhh" }))), false);
        let outcome = run(&rule(auth, items), &user, &hash).await;

        let ItemSaveOutcome::Skipped(stub) = outcome else {
            panic!("expected skipped outcome, got {outcome:?}");
        };
        assert_eq!(stub.uuid, item_uuid);
        assert_eq!(stub.content_type, ContentType::Mfa);
        assert_eq!(stub.last_user_agent.as_deref(), Some("test-agent"));
    }

    #[rstest]
    #[tokio::test]
    async fn deleted_item_removes_secret() {
        let user = UserId::random();
        let mut auth = MockAuthService::new();
        auth.expect_remove_user_mfa().times(1).return_once(|_| Ok(()));
        auth.expect_set_mfa_transition()
            .with(mockall::predicate::always(), eq(MfaTransition::Deleted))
            .times(1)
            .return_once(|_, _| Ok(()));
        auth.expect_save_user_mfa().never();

        let hash = mfa_hash(None, true);
        let outcome = run(&rule(auth, MockItemRepository::new()), &user, &hash).await;

        assert!(matches!(outcome, ItemSaveOutcome::Skipped(stub) if stub.deleted));
    }

    #[rstest]
    #[tokio::test]
    async fn auth_failure_becomes_sync_conflict() {
        let user = UserId::random();
        let mut auth = MockAuthService::new();
        auth.expect_save_user_mfa()
            .times(1)
            .return_once(|_, _, _| Err(AuthServiceError::transport("connection refused")));
        auth.expect_set_mfa_transition().never();

        let hash = mfa_hash(Some(encode(&json!({ "secret": "shhhh" }))), false);
        let outcome = run(&rule(auth, MockItemRepository::new()), &user, &hash).await;

        assert_eq!(
            outcome,
            ItemSaveOutcome::Conflict(ItemConflict::with_unsaved_item(
                ConflictType::SyncConflict,
                hash
            ))
        );
    }

    #[rstest]
    #[tokio::test]
    async fn payload_without_secret_is_a_content_error() {
        let user = UserId::random();
        let mut auth = MockAuthService::new();
        auth.expect_save_user_mfa().never();

        let hash = mfa_hash(Some("004not-base64!".to_owned()), false);
        let outcome = run(&rule(auth, MockItemRepository::new()), &user, &hash).await;

        assert_eq!(
            outcome,
            ItemSaveOutcome::Conflict(ItemConflict::with_unsaved_item(
                ConflictType::ContentError,
                hash
            ))
        );
    }
}
