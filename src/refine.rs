//! Routed refinement of the nearest candidates.
//!
//! Only the `k` nearest records by approximate distance are sent to the
//! matrix service, which bounds the cost of a cycle regardless of how many
//! entities there are.

use tracing::{debug, warn};

use crate::error::RefinementError;
use crate::geo::GeoPoint;
use crate::model::{Accuracy, ResultSet};
use crate::nearest::nearest_indices;
use crate::traits::RoutedDistanceProvider;

/// Default number of candidates sent for refinement.
pub const DEFAULT_REFINE_LIMIT: usize = 3;

/// Replace the approximate distances of the `k` nearest records with routed
/// distances.
///
/// All-or-nothing: any provider error, a reply whose length differs from
/// the number of requested candidates, or an unusable value fails the call.
/// Records outside the top `k` are never touched and order is preserved.
pub fn refine_top_k<P>(
    provider: &P,
    user: GeoPoint,
    mut results: ResultSet,
    k: usize,
) -> Result<ResultSet, RefinementError>
where
    P: RoutedDistanceProvider + ?Sized,
{
    let selected = nearest_indices(&results, k);
    if selected.is_empty() {
        return Ok(results);
    }

    let destinations = selected
        .iter()
        .map(|&i| results[i].entity.location())
        .collect::<Result<Vec<_>, _>>()?;

    let distances = provider.routed_distances_km(user, &destinations)?;
    if distances.len() != selected.len() {
        return Err(RefinementError::LengthMismatch {
            expected: selected.len(),
            actual: distances.len(),
        });
    }
    if let Some(index) = distances.iter().position(|d| !d.is_finite() || *d < 0.0) {
        return Err(RefinementError::InvalidDistance { index });
    }

    for (&i, km) in selected.iter().zip(distances) {
        let record = &mut results[i];
        record.distance_km = km;
        record.accuracy = Accuracy::Routed;
    }

    Ok(results)
}

/// Refine, or keep the approximate set unchanged when refinement fails.
///
/// This is the only place a refinement failure is absorbed.
pub fn refine_or_fallback<P>(provider: &P, user: GeoPoint, approx: ResultSet, k: usize) -> ResultSet
where
    P: RoutedDistanceProvider + ?Sized,
{
    match refine_top_k(provider, user, approx.clone(), k) {
        Ok(refined) => {
            debug!(candidates = k.min(refined.len()), "refined nearest candidates with routed distances");
            refined
        }
        Err(err) => {
            warn!(error = %err, "routed refinement failed, keeping approximate distances");
            approx
        }
    }
}

/// Extract the single origin row from a matrix reply.
///
/// Matrix services report unreachable pairs as `null`; any such cell makes
/// the row unusable.
pub(crate) fn origin_row(rows: Option<Vec<Vec<Option<f64>>>>) -> Result<Vec<f64>, RefinementError> {
    let row = rows
        .and_then(|rows| rows.into_iter().next())
        .ok_or(RefinementError::EmptyMatrix)?;

    row.into_iter()
        .enumerate()
        .map(|(index, cell)| cell.ok_or(RefinementError::InvalidDistance { index }))
        .collect()
}
