//! Nearest-entity selection.

use crate::model::DistanceRecord;

/// The record with the smallest distance. Ties go to the earliest record.
pub fn closest(records: &[DistanceRecord]) -> Option<&DistanceRecord> {
    records
        .iter()
        .reduce(|best, candidate| if candidate.distance_km < best.distance_km { candidate } else { best })
}

/// Indices of the `k` nearest records, nearest first.
///
/// The sort is stable, so equal distances keep input order.
pub fn nearest_indices(records: &[DistanceRecord], k: usize) -> Vec<usize> {
    let mut order = (0..records.len()).collect::<Vec<_>>();
    order.sort_by(|&a, &b| records[a].distance_km.total_cmp(&records[b].distance_km));
    order.truncate(k);
    order
}
