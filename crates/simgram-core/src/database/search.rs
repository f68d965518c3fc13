//! Overlap join over one length bucket.
//!
//! Finds every member sharing at least `m` n-grams with the query. With the
//! query's posting lists sorted by length, a member missing from the first
//! `q - m + 1` lists cannot reach `m`, so only those lists are scanned to
//! build candidates. The longer lists are then probed per candidate, and a
//! candidate is dropped as soon as the lists left cannot lift it to `m`.

use roaring::RoaringBitmap;
use rustc_hash::FxHashMap;
use std::ops::ControlFlow;

use crate::index::PostingBucket;
use crate::ngram::NGram;

/// Calls `emit(id, shared)` for every member of `bucket` sharing at least
/// `min_overlap` n-grams with `query`, in ascending ID order. `shared` is the
/// exact count. Stops early when `emit` breaks.
pub(crate) fn overlap_join<F>(
    bucket: &PostingBucket,
    query: &[NGram],
    min_overlap: usize,
    mut emit: F,
) -> ControlFlow<()>
where
    F: FnMut(u32, usize) -> ControlFlow<()>,
{
    let q = query.len();
    if min_overlap == 0 || min_overlap > q {
        return ControlFlow::Continue(());
    }

    let mut lists: Vec<&RoaringBitmap> = query.iter().filter_map(|g| bucket.lookup(g)).collect();
    // Absent n-grams are empty lists and would sort first.
    let missing = q - lists.len();
    let signature = (q - min_overlap + 1).saturating_sub(missing);
    if signature == 0 {
        return ControlFlow::Continue(());
    }
    lists.sort_by_key(|list| list.len());

    let mut counts: FxHashMap<u32, usize> = FxHashMap::default();
    for list in &lists[..signature] {
        for id in *list {
            *counts.entry(id).or_insert(0) += 1;
        }
    }
    let mut candidates: Vec<(u32, usize)> = counts.into_iter().collect();
    candidates.sort_unstable_by_key(|&(id, _)| id);

    for (i, list) in lists.iter().enumerate().skip(signature) {
        let remaining = lists.len() - i - 1;
        candidates.retain_mut(|(id, shared)| {
            if list.contains(*id) {
                *shared += 1;
            }
            *shared + remaining >= min_overlap
        });
        if candidates.is_empty() {
            return ControlFlow::Continue(());
        }
    }

    for (id, shared) in candidates {
        if shared >= min_overlap && emit(id, shared).is_break() {
            return ControlFlow::Break(());
        }
    }
    ControlFlow::Continue(())
}
