//! Paging arithmetic shared by every collection variant. Page indexes are
//! 1-based; item indexes in ranges are 0-based, displayed positions are
//! 1-based.

use std::ops::Range;

/// Number of pages needed for `total` items.
#[must_use]
pub const fn num_of_pages(total: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }

    total.div_ceil(page_size)
}

/// Half-open item range of 1-based page `page_idx`, not yet clipped to
/// the item count.
#[must_use]
pub const fn page_range(page_idx: usize, page_size: usize) -> Range<usize> {
    let start = page_idx.saturating_sub(1).saturating_mul(page_size);

    start..start.saturating_add(page_size)
}

/// Clip `range` to `total` items. Ranges past the end become empty.
#[must_use]
pub fn clip(range: Range<usize>, total: usize) -> Range<usize> {
    let start = range.start.min(total);

    start..range.end.clamp(start, total)
}

/// 1-based position of the first item on the page; 0 when there are no
/// items.
#[must_use]
pub const fn idx_of_first_item(page_idx: usize, page_size: usize, total: usize) -> usize {
    if total == 0 {
        return 0;
    }

    page_size
        .saturating_mul(page_idx.saturating_sub(1))
        .saturating_add(1)
}

/// 1-based position of the last item on the page; 0 when there are no
/// items.
#[must_use]
pub fn idx_of_last_item(page_idx: usize, page_size: usize, total: usize) -> usize {
    if total == 0 {
        return 0;
    }

    page_size.saturating_mul(page_idx).min(total)
}

/// Block indexes covering the item range `range`.
#[must_use]
pub const fn block_span(range: &Range<usize>, block_size: usize) -> Range<usize> {
    if range.start >= range.end || block_size == 0 {
        return 0..0;
    }

    (range.start / block_size)..range.end.div_ceil(block_size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_collection_has_no_positions() {
        assert_eq!(idx_of_first_item(1, 10, 0), 0);
        assert_eq!(idx_of_last_item(1, 10, 0), 0);
        assert_eq!(num_of_pages(0, 10), 0);
        assert_eq!(clip(page_range(1, 10), 0), 0..0);
    }

    #[test]
    fn last_page_is_clipped() {
        assert_eq!(clip(page_range(3, 10), 25), 20..25);
        assert_eq!(idx_of_first_item(3, 10, 25), 21);
        assert_eq!(idx_of_last_item(3, 10, 25), 25);
        assert_eq!(clip(page_range(4, 10), 25), 25..25);
    }

    #[test]
    fn blocks_cover_ranges() {
        assert_eq!(block_span(&(0..1), 2), 0..1);
        assert_eq!(block_span(&(3..6), 2), 1..3);
        assert_eq!(block_span(&(4..4), 2), 0..0);
    }

    #[test]
    fn clip_never_inverts_a_range() {
        assert_eq!(clip(1..3, 5), 1..3);
        assert_eq!(clip(5..9, 2), 2..2);
        assert_eq!(clip(4..2, 10), 4..4);
    }

    proptest! {
        #[test]
        fn page_math_is_consistent(total in 0usize..500, page_size in 1usize..40, page in 1usize..30) {
            let pages = num_of_pages(total, page_size);
            prop_assert_eq!(pages, (total + page_size - 1) / page_size);

            let range = clip(page_range(page, page_size), total);
            prop_assert!(range.len() <= page_size);

            if total > 0 {
                prop_assert_eq!(idx_of_first_item(page, page_size, total), page_size * (page - 1) + 1);
            }
            if page <= pages {
                prop_assert_eq!(range.start + 1, idx_of_first_item(page, page_size, total));
                prop_assert_eq!(range.end, idx_of_last_item(page, page_size, total));
            } else {
                prop_assert!(range.is_empty());
            }
        }

        #[test]
        fn pages_partition_items(total in 0usize..300, page_size in 1usize..25) {
            let covered: usize = (1..=num_of_pages(total, page_size))
                .map(|page| clip(page_range(page, page_size), total).len())
                .sum();

            prop_assert_eq!(covered, total);
        }

        #[test]
        fn block_span_covers_range(start in 0usize..200, len in 1usize..50, block in 1usize..16) {
            let range = start..start + len;
            let blocks = block_span(&range, block);

            prop_assert!(blocks.start * block <= range.start);
            prop_assert!(blocks.end * block >= range.end);
        }
    }
}
