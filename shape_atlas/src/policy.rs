// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! What to do when the current page has no room left.

use crate::key::ShapeKey;
use crate::lru::LruStore;
use crate::region::{PlacementRecord, Size};

/// Outcome of a bounded search for a slot to reclaim.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Reclaim {
    /// An old entry's slot is big enough and can be taken over.
    Reuse {
        /// Key of the entry whose slot is taken over.
        key: ShapeKey,
        /// Where that entry lives.
        record: PlacementRecord,
        /// Number of entries inspected, including the match.
        inspected: usize,
    },
    /// No inspected slot was big enough; the atlas should move to a new page.
    Exhausted {
        /// Number of entries inspected.
        inspected: usize,
    },
}

/// Number of oldest entries considered for reuse in a store of `len` entries.
///
/// Truncates, so small stores scan nothing at all.
#[expect(
    clippy::cast_possible_truncation,
    reason = "product is non-negative and at most len"
)]
pub fn scan_budget(len: usize, fraction: f32) -> usize {
    let budget = f64::from(fraction.clamp(0.0, 1.0)) * len as f64;
    (budget as usize).min(len)
}

/// Looks for the least recently used slot that can hold `needed`.
///
/// Only the oldest [`scan_budget`] entries are inspected, so the search is
/// bounded even when no slot qualifies. A slot qualifies when its allotted
/// size, not its current content size, covers `needed` in both dimensions.
pub fn find_reusable_slot(
    store: &LruStore<ShapeKey, PlacementRecord>,
    needed: Size,
    fraction: f32,
) -> Reclaim {
    let budget = scan_budget(store.len(), fraction);
    let mut inspected = 0;
    for (key, record) in store.iter_oldest().take(budget) {
        inspected += 1;
        if record.allotted_size.contains(needed) {
            return Reclaim::Reuse {
                key,
                record: *record,
                inspected,
            };
        }
    }
    Reclaim::Exhausted { inspected }
}

/// Evicts every entry that lives on `page`. Returns how many were evicted.
pub(crate) fn evict_page(store: &mut LruStore<ShapeKey, PlacementRecord>, page: u32) -> usize {
    let mut evicted = 0;
    let mut cursor = store.oldest();
    while let Some(at) = cursor {
        // Read the successor before the current entry goes away.
        cursor = store.next(at);
        let Some((key, record)) = store.entry(at) else {
            continue;
        };
        if record.page != page {
            continue;
        }
        if store.evict(&key) {
            evicted += 1;
        } else {
            log::error!("failed to evict {key:?} from page {page}");
        }
    }
    evicted
}
