//! In-memory driven adapters for end-to-end sync tests.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDate, TimeDelta, Utc};
use mockable::Clock;
use syncing_server::domain::ports::{
    ItemContentSize, ItemQuery, ItemRepository, ItemRepositoryError, ItemSortField,
    RevisionRepository, RevisionRepositoryError, SortOrder, SyncTimeComparison,
};
use syncing_server::domain::timer::date_from_micros;
use syncing_server::domain::{Item, Revision, UserId};
use uuid::Uuid;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Clock moved forward explicitly by the test.
pub struct SteppingClock(Mutex<DateTime<Utc>>);

impl SteppingClock {
    pub fn at_micros(micros: i64) -> Self {
        Self(Mutex::new(date_from_micros(micros)))
    }

    pub fn advance_seconds(&self, seconds: i64) {
        *lock(&self.0) += TimeDelta::seconds(seconds);
    }
}

impl Clock for SteppingClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *lock(&self.0)
    }
}

/// Item store honouring every [`ItemQuery`] filter.
#[derive(Default)]
pub struct InMemoryItems {
    items: Mutex<HashMap<Uuid, Item>>,
}

impl InMemoryItems {
    pub fn get(&self, uuid: &Uuid) -> Option<Item> {
        lock(&self.items).get(uuid).cloned()
    }

    fn matching(&self, query: &ItemQuery, paged: bool) -> Vec<Item> {
        let mut found: Vec<Item> = lock(&self.items)
            .values()
            .filter(|item| matches(item, query))
            .cloned()
            .collect();
        if let Some(field) = query.sort_by {
            found.sort_by(|a, b| {
                let ordering = sort_key(a, field).cmp(&sort_key(b, field));
                match query.sort_order {
                    SortOrder::Ascending => ordering,
                    SortOrder::Descending => ordering.reverse(),
                }
            });
        }
        if !paged {
            return found;
        }
        let offset = query
            .offset
            .and_then(|offset| usize::try_from(offset).ok())
            .unwrap_or(0);
        let limit = query
            .limit
            .and_then(|limit| usize::try_from(limit).ok())
            .unwrap_or(usize::MAX);
        found.into_iter().skip(offset).take(limit).collect()
    }
}

fn sort_key(item: &Item, field: ItemSortField) -> i64 {
    match field {
        ItemSortField::UpdatedAtTimestamp => item.updated_at_timestamp,
        ItemSortField::CreatedAtTimestamp => item.created_at_timestamp,
    }
}

fn matches(item: &Item, query: &ItemQuery) -> bool {
    let owner = query
        .user_uuid
        .as_ref()
        .is_none_or(|user| item.user_uuid == *user);
    let uuid = query
        .uuids
        .as_ref()
        .is_none_or(|uuids| uuids.contains(&item.uuid));
    let deleted = query.deleted.is_none_or(|deleted| item.deleted == deleted);
    let content_type = query
        .content_type
        .is_none_or(|content_type| item.content_type == content_type);
    let since = query.last_sync_time.is_none_or(|last| {
        match item.updated_at_timestamp.cmp(&last) {
            Ordering::Greater => true,
            Ordering::Equal => query.sync_time_comparison == SyncTimeComparison::GreaterThanOrEqual,
            Ordering::Less => false,
        }
    });
    owner && uuid && deleted && content_type && since
}

#[async_trait]
impl ItemRepository for InMemoryItems {
    async fn find_all(&self, query: &ItemQuery) -> Result<Vec<Item>, ItemRepositoryError> {
        Ok(self.matching(query, true))
    }

    async fn find_by_uuid(&self, uuid: &Uuid) -> Result<Option<Item>, ItemRepositoryError> {
        Ok(self.get(uuid))
    }

    async fn find_by_uuid_and_user_uuid(
        &self,
        uuid: &Uuid,
        user_uuid: &UserId,
    ) -> Result<Option<Item>, ItemRepositoryError> {
        Ok(self.get(uuid).filter(|item| item.user_uuid == *user_uuid))
    }

    async fn insert(&self, item: &Item) -> Result<(), ItemRepositoryError> {
        let mut items = lock(&self.items);
        if items.contains_key(&item.uuid) {
            return Err(ItemRepositoryError::query(format!("item {} exists", item.uuid)));
        }
        items.insert(item.uuid, item.clone());
        Ok(())
    }

    async fn update(&self, item: &Item) -> Result<(), ItemRepositoryError> {
        let mut items = lock(&self.items);
        match items.get_mut(&item.uuid) {
            Some(stored) if stored.user_uuid == item.user_uuid => {
                *stored = item.clone();
                Ok(())
            }
            _ => Err(ItemRepositoryError::query(format!(
                "item {} not owned by {}",
                item.uuid, item.user_uuid
            ))),
        }
    }

    async fn count_all(&self, query: &ItemQuery) -> Result<i64, ItemRepositoryError> {
        let count = self.matching(query, false).len();
        i64::try_from(count).map_err(|err| ItemRepositoryError::query(err.to_string()))
    }

    async fn find_content_size_for_computing_transfer_limit(
        &self,
        query: &ItemQuery,
    ) -> Result<Vec<ItemContentSize>, ItemRepositoryError> {
        Ok(self
            .matching(query, true)
            .into_iter()
            .map(|item| ItemContentSize {
                uuid: item.uuid,
                content_size: item.content_size,
            })
            .collect())
    }

    async fn find_dates_for_computing_integrity_hash(
        &self,
        user_uuid: &UserId,
    ) -> Result<Vec<i64>, ItemRepositoryError> {
        Ok(lock(&self.items)
            .values()
            .filter(|item| item.user_uuid == *user_uuid && !item.deleted)
            .map(|item| item.updated_at_timestamp)
            .collect())
    }

    async fn mark_items_as_deleted(
        &self,
        uuids: &[Uuid],
        updated_at_timestamp: i64,
    ) -> Result<(), ItemRepositoryError> {
        let mut items = lock(&self.items);
        for uuid in uuids {
            if let Some(item) = items.get_mut(uuid) {
                item.deleted = true;
                item.set_updated_at(updated_at_timestamp);
                item.enforce_deleted_invariant();
            }
        }
        Ok(())
    }
}

/// Revision store keyed by item.
#[derive(Default)]
pub struct InMemoryRevisions {
    revisions: Mutex<Vec<Revision>>,
}

#[async_trait]
impl RevisionRepository for InMemoryRevisions {
    async fn save(&self, revision: &Revision) -> Result<(), RevisionRepositoryError> {
        lock(&self.revisions).push(revision.clone());
        Ok(())
    }

    async fn find_by_item_uuid(
        &self,
        item_uuid: &Uuid,
        created_after: Option<NaiveDate>,
    ) -> Result<Vec<Revision>, RevisionRepositoryError> {
        let mut found: Vec<Revision> = lock(&self.revisions)
            .iter()
            .filter(|revision| revision.item_uuid == *item_uuid)
            .filter(|revision| created_after.is_none_or(|day| revision.creation_date >= day))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn find_one_by_uuid(
        &self,
        revision_uuid: &Uuid,
        item_uuid: &Uuid,
    ) -> Result<Option<Revision>, RevisionRepositoryError> {
        Ok(lock(&self.revisions)
            .iter()
            .find(|revision| revision.uuid == *revision_uuid && revision.item_uuid == *item_uuid)
            .cloned())
    }

    async fn remove_by_uuid(
        &self,
        revision_uuid: &Uuid,
        item_uuid: &Uuid,
    ) -> Result<bool, RevisionRepositoryError> {
        let mut revisions = lock(&self.revisions);
        let before = revisions.len();
        revisions.retain(|revision| !(revision.uuid == *revision_uuid && revision.item_uuid == *item_uuid));
        Ok(revisions.len() < before)
    }
}
