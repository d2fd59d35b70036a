//! Pairwise candidate-signature comparison with the IoU near-duplicate guard.

use std::collections::HashSet;

use crate::dom::Signature;
use crate::page::PageRepresentation;

/// Default Intersection-over-Union threshold above which a pair is treated
/// as near-duplicate and discarded.
pub const DEFAULT_IOU_MAX: f64 = 0.9;

/// Signatures shared between `a` and `b`, unless their IoU exceeds
/// `iou_max` (near-duplicate guard), in which case an empty set is returned.
///
/// `iou = 0` when the union of candidate signatures is empty (no useful
/// information either way). The threshold is exclusive on the discard side:
/// a pair exactly at `iou_max` is kept.
pub fn shared_signatures(
    a: &HashSet<Signature>,
    b: &HashSet<Signature>,
    iou_max: f64,
) -> HashSet<Signature> {
    if a.is_empty() || b.is_empty() {
        return HashSet::new();
    }

    let shared: HashSet<Signature> = a.intersection(b).copied().collect();
    let union_len = a.union(b).count();

    let iou = if union_len == 0 {
        0.0
    } else {
        shared.len() as f64 / union_len as f64
    };

    if iou > iou_max {
        HashSet::new()
    } else {
        shared
    }
}

/// Convenience wrapper over [`shared_signatures`] for two full
/// [`PageRepresentation`]s.
pub fn shared_signatures_for_pages(
    a: &PageRepresentation,
    b: &PageRepresentation,
    iou_max: f64,
) -> HashSet<Signature> {
    shared_signatures(&a.signatures, &b.signatures, iou_max)
}
