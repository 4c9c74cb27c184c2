//! Copies revision history onto items marked as duplicates.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::domain::ports::{
    AuthService, DomainEventHandler, ItemRepository, RevisionRepository,
};
use crate::domain::revision_service::map_item_error;
use crate::domain::{DomainEvent, DuplicateItemSynced, Error, RevisionService};

/// Handles [`DuplicateItemSynced`] events.
#[derive(Clone)]
pub struct DuplicateItemSyncedHandler<I, R, A> {
    item_repo: Arc<I>,
    revisions: RevisionService<R, I, A>,
}

impl<I, R, A> DuplicateItemSyncedHandler<I, R, A> {
    /// Create a new handler.
    pub fn new(item_repo: Arc<I>, revisions: RevisionService<R, I, A>) -> Self {
        Self {
            item_repo,
            revisions,
        }
    }
}

impl<I, R, A> DuplicateItemSyncedHandler<I, R, A>
where
    I: ItemRepository,
    R: RevisionRepository,
    A: AuthService,
{
    async fn copy_history(&self, event: &DuplicateItemSynced) -> Result<(), Error> {
        let Some(item) = self
            .item_repo
            .find_by_uuid_and_user_uuid(&event.item_uuid, &event.user_uuid)
            .await
            .map_err(map_item_error)?
        else {
            warn!(item_uuid = %event.item_uuid, "duplicate item not found");
            return Ok(());
        };
        let Some(original_uuid) = item.duplicate_of else {
            warn!(item_uuid = %item.uuid, "item is not marked as a duplicate");
            return Ok(());
        };
        let original = self
            .item_repo
            .find_by_uuid_and_user_uuid(&original_uuid, &event.user_uuid)
            .await
            .map_err(map_item_error)?;
        if original.is_none() {
            warn!(
                item_uuid = %item.uuid,
                original_uuid = %original_uuid,
                "original of duplicate item not found"
            );
            return Ok(());
        }

        self.revisions.copy_revisions(&original_uuid, &item.uuid).await
    }
}

#[async_trait]
impl<I, R, A> DomainEventHandler for DuplicateItemSyncedHandler<I, R, A>
where
    I: ItemRepository,
    R: RevisionRepository,
    A: AuthService,
{
    async fn handle(&self, event: &DomainEvent) -> Result<(), Error> {
        match event {
            DomainEvent::DuplicateItemSynced(payload) => self.copy_history(payload).await,
            other => {
                debug!(event_type = other.event_type(), "event ignored by duplicate handler");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::item::fixtures::{NOW_MICROS, note};
    use crate::domain::ports::{FixtureAuthService, MockItemRepository, MockRevisionRepository};
    use crate::domain::{Revision, UserId};
    use crate::domain::timer::date_from_micros;
    use crate::test_support::fixed_clock;
    use mockall::predicate::eq;
    use uuid::Uuid;

    fn handler(
        items: MockItemRepository,
        revisions: MockRevisionRepository,
    ) -> DuplicateItemSyncedHandler<MockItemRepository, MockRevisionRepository, FixtureAuthService>
    {
        let items = Arc::new(items);
        let service = RevisionService::new(
            Arc::new(revisions),
            Arc::clone(&items),
            Arc::new(FixtureAuthService),
            fixed_clock(NOW_MICROS),
        );
        DuplicateItemSyncedHandler::new(items, service)
    }

    fn event(item_uuid: Uuid, user_uuid: &UserId) -> DomainEvent {
        DomainEvent::DuplicateItemSynced(DuplicateItemSynced {
            item_uuid,
            user_uuid: user_uuid.clone(),
        })
    }

    #[tokio::test]
    async fn missing_item_is_ignored() {
        let user = UserId::random();
        let mut items = MockItemRepository::new();
        items
            .expect_find_by_uuid_and_user_uuid()
            .times(1)
            .return_once(|_, _| Ok(None));
        let mut revisions = MockRevisionRepository::new();
        revisions.expect_find_by_item_uuid().never();

        handler(items, revisions)
            .handle(&event(Uuid::new_v4(), &user))
            .await
            .expect("ignored");
    }

    #[tokio::test]
    async fn item_without_duplicate_reference_is_ignored() {
        let user = UserId::random();
        let item = note(&user, NOW_MICROS);
        let item_uuid = item.uuid;
        let mut items = MockItemRepository::new();
        items
            .expect_find_by_uuid_and_user_uuid()
            .times(1)
            .return_once(move |_, _| Ok(Some(item)));
        let mut revisions = MockRevisionRepository::new();
        revisions.expect_find_by_item_uuid().never();

        handler(items, revisions)
            .handle(&event(item_uuid, &user))
            .await
            .expect("ignored");
    }

    #[tokio::test]
    async fn history_is_copied_from_the_original() {
        let user = UserId::random();
        let original = note(&user, NOW_MICROS);
        let mut duplicate = note(&user, NOW_MICROS);
        duplicate.duplicate_of = Some(original.uuid);
        let (original_uuid, duplicate_uuid) = (original.uuid, duplicate.uuid);
        let history = vec![Revision::snapshot_of(&original, date_from_micros(NOW_MICROS))];

        let mut items = MockItemRepository::new();
        let by_user_original = original.clone();
        items
            .expect_find_by_uuid_and_user_uuid()
            .with(eq(duplicate_uuid), eq(user.clone()))
            .return_once({
                let duplicate = duplicate.clone();
                move |_, _| Ok(Some(duplicate))
            });
        items
            .expect_find_by_uuid_and_user_uuid()
            .with(eq(original_uuid), eq(user.clone()))
            .return_once(move |_, _| Ok(Some(by_user_original)));
        items
            .expect_find_by_uuid()
            .with(eq(original_uuid))
            .return_once(move |_| Ok(Some(original)));
        items
            .expect_find_by_uuid()
            .with(eq(duplicate_uuid))
            .return_once(move |_| Ok(Some(duplicate)));
        let mut revisions = MockRevisionRepository::new();
        revisions
            .expect_find_by_item_uuid()
            .with(eq(original_uuid), eq(None))
            .return_once(move |_, _| Ok(history));
        revisions
            .expect_save()
            .withf(move |revision| revision.item_uuid == duplicate_uuid)
            .times(1)
            .return_once(|_| Ok(()));

        handler(items, revisions)
            .handle(&event(duplicate_uuid, &user))
            .await
            .expect("history copied");
    }
}
