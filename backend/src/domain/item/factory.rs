//! Builds items from client hashes.

use std::sync::Arc;

use mockable::Clock;
use uuid::Uuid;

use super::{Item, ItemHash, non_empty};
use crate::domain::timer::{date_from_micros, micros_from_date_string, now_micros};
use crate::domain::{ContentType, UserId};

/// Reasons a hash cannot become an item.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ItemFactoryError {
    /// The uuid is not a valid UUID.
    #[error("invalid item uuid: {uuid}")]
    InvalidUuid { uuid: String },
    /// The content type is missing or unknown.
    #[error("unknown content type: {content_type}")]
    UnknownContentType { content_type: String },
    /// The duplicate reference is not a valid UUID.
    #[error("invalid duplicate_of reference: {duplicate_of}")]
    InvalidDuplicateOf { duplicate_of: String },
}

/// Parse an optional duplicate reference, treating empty strings as unset.
pub(crate) fn parse_duplicate_of(raw: Option<&String>) -> Result<Option<Uuid>, ItemFactoryError> {
    non_empty(raw)
        .map(|value| {
            Uuid::parse_str(value).map_err(|_| ItemFactoryError::InvalidDuplicateOf {
                duplicate_of: value.to_owned(),
            })
        })
        .transpose()
}

/// Creates [`Item`]s stamped with the injected clock.
#[derive(Clone)]
pub struct ItemFactory {
    clock: Arc<dyn Clock>,
}

impl ItemFactory {
    /// Create a factory reading "now" from `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Build a new item owned by `user_uuid`.
    ///
    /// Creation time is taken from `created_at_timestamp`, then from the
    /// `created_at` string, then from the clock. The update time is always
    /// the clock.
    pub fn create(
        &self,
        user_uuid: &UserId,
        hash: &ItemHash,
        user_agent: Option<&str>,
    ) -> Result<Item, ItemFactoryError> {
        let uuid = Uuid::parse_str(&hash.uuid).map_err(|_| ItemFactoryError::InvalidUuid {
            uuid: hash.uuid.clone(),
        })?;
        let content_type = hash
            .content_type
            .as_deref()
            .and_then(|raw| raw.parse::<ContentType>().ok())
            .ok_or_else(|| ItemFactoryError::UnknownContentType {
                content_type: hash.content_type.clone().unwrap_or_default(),
            })?;
        let duplicate_of = parse_duplicate_of(hash.duplicate_of.as_ref())?;
        let now = now_micros(self.clock.as_ref());

        let mut item = Item {
            uuid,
            user_uuid: user_uuid.clone(),
            content: hash.content_str().map(str::to_owned),
            content_type,
            enc_item_key: non_empty(hash.enc_item_key.as_ref()).map(str::to_owned),
            items_key_id: non_empty(hash.items_key_id.as_ref()).map(str::to_owned),
            auth_hash: non_empty(hash.auth_hash.as_ref()).map(str::to_owned),
            duplicate_of,
            deleted: hash.is_deleted(),
            content_size: 0,
            created_at: date_from_micros(now),
            created_at_timestamp: now,
            updated_at: date_from_micros(now),
            updated_at_timestamp: now,
            last_user_agent: user_agent.map(str::to_owned),
        };

        if let Some(created) = hash.created_at_timestamp.filter(|ts| *ts != 0) {
            item.set_created_at(created);
        } else if let Some(created) =
            non_empty(hash.created_at.as_ref()).and_then(micros_from_date_string)
        {
            item.set_created_at(created);
        }

        item.enforce_deleted_invariant();
        Ok(item)
    }

    /// Build a synthetic item that is reported back to the client without
    /// being stored.
    ///
    /// Unlike [`ItemFactory::create`], the update time honours the hash.
    pub fn create_stub(
        &self,
        user_uuid: &UserId,
        hash: &ItemHash,
        user_agent: Option<&str>,
    ) -> Result<Item, ItemFactoryError> {
        let mut item = self.create(user_uuid, hash, user_agent)?;
        if hash.content.is_none() {
            item.content = None;
        }

        if let Some(updated) = hash.updated_at_timestamp.filter(|ts| *ts != 0) {
            item.set_updated_at(updated);
        } else if let Some(updated) =
            non_empty(hash.updated_at.as_ref()).and_then(micros_from_date_string)
        {
            item.set_updated_at(updated);
        }

        item.recompute_content_size();
        Ok(item)
    }
}
