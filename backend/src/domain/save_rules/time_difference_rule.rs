//! Detects stale writes by comparing update timestamps.
//!
//! A client proves it edited the latest version by echoing the server's
//! update timestamp. Hashes carrying `updated_at_timestamp` must match it
//! exactly; hashes carrying only a date string are compared within a
//! tolerance because the string lost sub-millisecond precision.

use async_trait::async_trait;

use super::{ItemSaveContext, ItemSaveOutcome, ItemSaveRule};
use crate::domain::timer::micros_from_date_string;
use crate::domain::{ApiVersion, ConflictType, ItemConflict};

/// Tolerance for date-string comparisons on current API versions.
pub const TOLERANCE_MICROS: i64 = 1_000;
/// Tolerance for date-string comparisons on the legacy API.
pub const LEGACY_API_TOLERANCE_MICROS: i64 = 1_000_000;

/// Flags updates based on an outdated copy of the item.
#[derive(Debug, Default, Clone, Copy)]
pub struct TimeDifferenceRule;

#[async_trait]
impl ItemSaveRule for TimeDifferenceRule {
    async fn check(&self, context: &ItemSaveContext<'_>) -> ItemSaveOutcome {
        let Some(existing) = context.existing_item else {
            return ItemSaveOutcome::Passed;
        };
        let conflict = || {
            ItemSaveOutcome::Conflict(ItemConflict::with_server_item(
                ConflictType::SyncConflict,
                existing.clone(),
            ))
        };
        let hash = context.item_hash;

        let exact_timestamp = hash.updated_at_timestamp.filter(|ts| *ts != 0);
        let incoming = match exact_timestamp {
            Some(ts) => ts,
            None => match hash.updated_at.as_deref() {
                Some(raw) => match micros_from_date_string(raw) {
                    Some(ts) => ts,
                    None => return conflict(),
                },
                None => 0,
            },
        };

        if incoming == 0 && context.api_version.is_legacy() {
            return ItemSaveOutcome::Passed;
        }

        let difference = incoming.saturating_sub(existing.updated_at_timestamp);
        let passed = if exact_timestamp.is_some() {
            difference == 0
        } else {
            difference.saturating_abs() < tolerance(context.api_version)
        };

        if passed { ItemSaveOutcome::Passed } else { conflict() }
    }
}

const fn tolerance(api_version: ApiVersion) -> i64 {
    if api_version.is_legacy() {
        LEGACY_API_TOLERANCE_MICROS
    } else {
        TOLERANCE_MICROS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::item::fixtures::{NOW_MICROS, note};
    use crate::domain::{Item, ItemHash, UserId};
    use rstest::rstest;

    async fn check(api_version: ApiVersion, hash: &ItemHash, existing: &Item) -> ItemSaveOutcome {
        TimeDifferenceRule
            .check(&ItemSaveContext {
                user_uuid: &existing.user_uuid,
                api_version,
                item_hash: hash,
                existing_item: Some(existing),
                user_agent: None,
            })
            .await
    }

    fn hash(updated_at_timestamp: Option<i64>, updated_at: Option<&str>) -> ItemHash {
        ItemHash {
            uuid: "2f1b2c9e-83a5-4f0d-9a2d-2f0a5b6f6c11".to_owned(),
            content_type: Some("Note".to_owned()),
            updated_at_timestamp,
            updated_at: updated_at.map(str::to_owned),
            ..ItemHash::default()
        }
    }

    #[rstest]
    #[tokio::test]
    async fn new_items_always_pass() {
        let user = UserId::random();
        let incoming = hash(Some(1), None);
        let outcome = TimeDifferenceRule
            .check(&ItemSaveContext {
                user_uuid: &user,
                api_version: ApiVersion::V20200115,
                item_hash: &incoming,
                existing_item: None,
                user_agent: None,
            })
            .await;
        assert_eq!(outcome, ItemSaveOutcome::Passed);
    }

    #[rstest]
    #[case(0, true)]
    #[case(1, false)]
    #[case(-1, false)]
    #[tokio::test]
    async fn microsecond_timestamps_must_match_exactly(#[case] offset: i64, #[case] passes: bool) {
        let existing = note(&UserId::random(), NOW_MICROS + 123);
        let incoming = hash(Some(NOW_MICROS + 123 + offset), None);

        let outcome = check(ApiVersion::V20200115, &incoming, &existing).await;

        assert_eq!(outcome == ItemSaveOutcome::Passed, passes);
    }

    #[rstest]
    #[case(ApiVersion::V20200115, "2021-03-15T09:00:00.000Z", NOW_MICROS + 999, true)]
    #[case(ApiVersion::V20200115, "2021-03-15T09:00:00.000Z", NOW_MICROS + 1_000, false)]
    #[case(ApiVersion::V20161215, "2021-03-15T09:00:00.000Z", NOW_MICROS + 999_999, true)]
    #[case(ApiVersion::V20161215, "2021-03-15T09:00:00.000Z", NOW_MICROS + 1_000_000, false)]
    #[tokio::test]
    async fn date_strings_compare_within_tolerance(
        #[case] api_version: ApiVersion,
        #[case] updated_at: &str,
        #[case] server_timestamp: i64,
        #[case] passes: bool,
    ) {
        let existing = note(&UserId::random(), server_timestamp);
        let incoming = hash(None, Some(updated_at));

        let outcome = check(api_version, &incoming, &existing).await;

        assert_eq!(outcome == ItemSaveOutcome::Passed, passes);
    }

    #[rstest]
    #[case(ApiVersion::V20161215, true)]
    #[case(ApiVersion::V20200115, false)]
    #[tokio::test]
    async fn missing_dates_only_pass_for_legacy_clients(
        #[case] api_version: ApiVersion,
        #[case] passes: bool,
    ) {
        let existing = note(&UserId::random(), NOW_MICROS);
        let outcome = check(api_version, &hash(None, None), &existing).await;
        assert_eq!(outcome == ItemSaveOutcome::Passed, passes);
    }

    #[rstest]
    #[tokio::test]
    async fn conflicts_carry_the_server_copy() {
        let existing = note(&UserId::random(), NOW_MICROS);
        let incoming = hash(None, Some("yesterday-ish"));

        let outcome = check(ApiVersion::V20200115, &incoming, &existing).await;

        assert_eq!(
            outcome,
            ItemSaveOutcome::Conflict(ItemConflict::with_server_item(
                ConflictType::SyncConflict,
                existing
            ))
        );
    }
}
