//! Ordered rule chain every incoming item passes before it is stored.
//!
//! Cheap structural checks run first, then the rules that need the stored
//! copy or external services. The first rule that does not pass decides the
//! outcome for the item.

mod content_rule;
mod content_type_rule;
mod mfa_rule;
mod ownership_rule;
mod time_difference_rule;
mod uuid_rule;

pub use content_rule::ContentRule;
pub use content_type_rule::ContentTypeRule;
pub use mfa_rule::MfaRule;
pub use ownership_rule::OwnershipRule;
pub use time_difference_rule::{LEGACY_API_TOLERANCE_MICROS, TOLERANCE_MICROS, TimeDifferenceRule};
pub use uuid_rule::UuidRule;

use std::sync::Arc;

use async_trait::async_trait;

use super::{ApiVersion, Item, ItemConflict, ItemHash, UserId};

/// Inputs shared by every rule.
#[derive(Debug, Clone, Copy)]
pub struct ItemSaveContext<'a> {
    pub user_uuid: &'a UserId,
    pub api_version: ApiVersion,
    pub item_hash: &'a ItemHash,
    pub existing_item: Option<&'a Item>,
    pub user_agent: Option<&'a str>,
}

/// Verdict of a rule.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemSaveOutcome {
    /// Continue with the next rule, or store the item if none remain.
    Passed,
    /// Reject the item.
    Conflict(ItemConflict),
    /// Handled elsewhere; report this stub as saved without storing it.
    Skipped(Item),
}

/// A single step of the save pipeline.
#[async_trait]
pub trait ItemSaveRule: Send + Sync {
    /// Judge one item.
    async fn check(&self, context: &ItemSaveContext<'_>) -> ItemSaveOutcome;
}

/// Runs rules in order and stops at the first verdict other than
/// [`ItemSaveOutcome::Passed`].
#[derive(Clone)]
pub struct ItemSaveValidator {
    rules: Vec<Arc<dyn ItemSaveRule>>,
}

impl ItemSaveValidator {
    /// Validator running `rules` in the given order.
    pub fn new(rules: Vec<Arc<dyn ItemSaveRule>>) -> Self {
        Self { rules }
    }

    /// Standard chain: uuid, content type, content, ownership, time
    /// difference, then MFA redirection.
    pub fn standard(mfa_rule: Arc<dyn ItemSaveRule>) -> Self {
        Self::new(vec![
            Arc::new(UuidRule),
            Arc::new(ContentTypeRule),
            Arc::new(ContentRule),
            Arc::new(OwnershipRule),
            Arc::new(TimeDifferenceRule),
            mfa_rule,
        ])
    }

    /// Run the chain for one item.
    pub async fn validate(&self, context: &ItemSaveContext<'_>) -> ItemSaveOutcome {
        for rule in &self.rules {
            match rule.check(context).await {
                ItemSaveOutcome::Passed => continue,
                verdict => return verdict,
            }
        }
        ItemSaveOutcome::Passed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ConflictType;
    use crate::domain::item::fixtures::{NOW_MICROS, hash_for, note};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingRule(Arc<AtomicUsize>);

    #[async_trait]
    impl ItemSaveRule for CountingRule {
        async fn check(&self, _context: &ItemSaveContext<'_>) -> ItemSaveOutcome {
            self.0.fetch_add(1, Ordering::SeqCst);
            ItemSaveOutcome::Passed
        }
    }

    #[tokio::test]
    async fn first_failing_rule_short_circuits() {
        let calls = Arc::new(AtomicUsize::new(0));
        let validator =
            ItemSaveValidator::standard(Arc::new(CountingRule(Arc::clone(&calls))));
        let user = UserId::random();
        let hash = ItemHash {
            uuid: "bad-uuid".to_owned(),
            content_type: Some("Note".to_owned()),
            ..ItemHash::default()
        };

        let outcome = validator
            .validate(&ItemSaveContext {
                user_uuid: &user,
                api_version: ApiVersion::V20200115,
                item_hash: &hash,
                existing_item: None,
                user_agent: None,
            })
            .await;

        assert_eq!(
            outcome,
            ItemSaveOutcome::Conflict(ItemConflict::with_unsaved_item(
                ConflictType::UuidError,
                hash.clone()
            ))
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn valid_item_reaches_every_rule() {
        let calls = Arc::new(AtomicUsize::new(0));
        let validator =
            ItemSaveValidator::standard(Arc::new(CountingRule(Arc::clone(&calls))));
        let user = UserId::random();
        let existing = note(&user, NOW_MICROS);
        let hash = hash_for(&existing);

        let outcome = validator
            .validate(&ItemSaveContext {
                user_uuid: &user,
                api_version: ApiVersion::V20200115,
                item_hash: &hash,
                existing_item: Some(&existing),
                user_agent: None,
            })
            .await;

        assert_eq!(outcome, ItemSaveOutcome::Passed);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
