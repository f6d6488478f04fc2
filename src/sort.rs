//! In-place name ordering for entry collections.
//!
//! Comb sort: a shrinking-gap bubble sort that needs no scratch allocation
//! and averages O(n log n), plenty for listings of a few thousand entries.
//! Names within one directory are unique, so stability does not matter.

use crate::scan::ListEntry;

/// Sort entries by strict byte-wise name order.
///
/// The gap shrinks by the classic 10/13 factor, with gaps of 9 and 10
/// corrected to 11 (the known bad region for this sequence). Passes repeat
/// until a full gap-1 pass makes no swap.
pub fn sort_entries(entries: &mut [ListEntry]) {
    let count = entries.len();
    if count < 2 {
        return;
    }

    let mut gap = count;
    loop {
        gap = gap * 10 / 13;
        if gap == 9 || gap == 10 {
            gap = 11;
        }
        if gap < 1 {
            gap = 1;
        }

        let mut swapped = false;
        for i in 0..count - gap {
            let j = i + gap;
            if entries[i].name_bytes() > entries[j].name_bytes() {
                entries.swap(i, j);
                swapped = true;
            }
        }

        if gap == 1 && !swapped {
            return;
        }
    }
}
