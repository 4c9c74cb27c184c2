//! Byte budget for a single page of retrieved items.

use tracing::warn;
use uuid::Uuid;

use super::ports::ItemContentSize;

/// Picks which candidate items fit in one sync response.
#[derive(Debug, Default, Clone, Copy)]
pub struct ItemTransferCalculator;

impl ItemTransferCalculator {
    /// Uuids to fetch, in candidate order.
    ///
    /// Items are taken until the running total reaches `bytes_transfer_limit`.
    /// The item that crosses the limit is still included, so a single
    /// oversized item is delivered on its own page instead of blocking the
    /// sync forever.
    pub fn compute_item_uuids_to_fetch(
        &self,
        candidates: &[ItemContentSize],
        bytes_transfer_limit: i64,
    ) -> Vec<Uuid> {
        let mut selected = Vec::new();
        let mut total_bytes: i64 = 0;
        for candidate in candidates {
            selected.push(candidate.uuid);
            total_bytes = total_bytes.saturating_add(candidate.content_size.max(0));
            if total_bytes >= bytes_transfer_limit {
                if selected.len() == 1 && candidates.len() > 1 {
                    warn!(
                        item_uuid = %candidate.uuid,
                        bytes_transfer_limit,
                        "item is breaching the content size transfer limit"
                    );
                }
                break;
            }
        }
        selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn sizes(values: &[i64]) -> Vec<ItemContentSize> {
        values
            .iter()
            .map(|content_size| ItemContentSize {
                uuid: Uuid::new_v4(),
                content_size: *content_size,
            })
            .collect()
    }

    #[rstest]
    #[case(&[10, 10, 10], 100, 3)]
    #[case(&[10, 10, 10], 20, 2)]
    #[case(&[10, 10, 10], 15, 2)]
    #[case(&[50, 1, 1], 1, 1)]
    #[case(&[0, 0, 0], 1, 3)]
    #[case(&[], 10, 0)]
    fn stops_once_budget_is_reached(
        #[case] content_sizes: &[i64],
        #[case] limit: i64,
        #[case] expected: usize,
    ) {
        let candidates = sizes(content_sizes);
        let selected = ItemTransferCalculator.compute_item_uuids_to_fetch(&candidates, limit);

        assert_eq!(selected.len(), expected);
        let expected_uuids: Vec<Uuid> = candidates
            .iter()
            .take(expected)
            .map(|candidate| candidate.uuid)
            .collect();
        assert_eq!(selected, expected_uuids);
    }

    #[rstest]
    fn oversized_first_item_is_still_delivered() {
        let candidates = sizes(&[1_000_000, 5]);
        let selected = ItemTransferCalculator.compute_item_uuids_to_fetch(&candidates, 1);
        assert_eq!(selected, vec![candidates[0].uuid]);
    }
}
