//! Great-circle distance estimation.
//!
//! The first accuracy tier: cheap, always available, ignores roads.
//! Every entity gets one of these before any routed refinement.

use rayon::prelude::*;

use crate::error::GeoError;
use crate::geo::GeoPoint;
use crate::model::{Accuracy, DistanceRecord, Entity, ResultSet};

/// Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Calculate haversine distance between two points in kilometers.
pub fn haversine_km(from: GeoPoint, to: GeoPoint) -> f64 {
    let lat1_rad = from.latitude().to_radians();
    let lat2_rad = to.latitude().to_radians();
    let delta_lat = (to.latitude() - from.latitude()).to_radians();
    let delta_lng = (to.longitude() - from.longitude()).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    // Rounding can push `a` a hair past 1 for antipodal points.
    let c = 2.0 * a.sqrt().min(1.0).asin();

    EARTH_RADIUS_KM * c
}

/// Haversine distance in meters.
pub fn haversine_m(from: GeoPoint, to: GeoPoint) -> f64 {
    haversine_km(from, to) * 1000.0
}

/// Annotate every entity with its approximate distance from `user`.
///
/// Output is in input order, one record per entity. An entity with
/// out-of-range coordinates fails the whole batch.
pub fn estimate_all(user: GeoPoint, entities: &[Entity]) -> Result<ResultSet, GeoError> {
    entities
        .par_iter()
        .map(|entity| -> Result<DistanceRecord, GeoError> {
            let location = entity.location()?;
            Ok(DistanceRecord {
                entity: entity.clone(),
                distance_km: haversine_km(user, location),
                accuracy: Accuracy::Approx,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(lat: f64, lng: f64) -> GeoPoint {
        GeoPoint::new(lat, lng).unwrap()
    }

    #[test]
    fn test_haversine_same_point() {
        let dist = haversine_km(point(36.1, -115.1), point(36.1, -115.1));
        assert_eq!(dist, 0.0, "Same point should have zero distance");
    }

    #[test]
    fn test_haversine_known_distance() {
        // Las Vegas (36.17, -115.14) to Los Angeles (34.05, -118.24)
        // Actual distance ~370 km
        let dist = haversine_km(point(36.17, -115.14), point(34.05, -118.24));
        assert!(dist > 350.0 && dist < 400.0, "LV to LA should be ~370km, got {}", dist);
    }

    #[test]
    fn test_haversine_symmetric() {
        let a = point(35.8989, 14.5146);
        let b = point(36.0443, 14.2512);
        assert_eq!(haversine_km(a, b), haversine_km(b, a));
    }

    #[test]
    fn test_haversine_antipodal_is_finite() {
        let dist = haversine_km(point(0.0, 0.0), point(0.0, 180.0));
        assert!(dist.is_finite());
        assert!((dist - EARTH_RADIUS_KM * std::f64::consts::PI).abs() < 1e-6);
    }

    #[test]
    fn test_meters_scale() {
        let a = point(35.0, 14.0);
        let b = point(35.1, 14.0);
        assert!((haversine_m(a, b) - haversine_km(a, b) * 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_estimate_all_preserves_identity_and_order() {
        let entities = vec![
            Entity::new("a", 35.90, 14.51),
            Entity::new("b", 36.04, 14.25).with_field("name", "Gozo"),
            Entity::new("c", 35.85, 14.56),
        ];

        let results = estimate_all(point(35.9, 14.5), &entities).unwrap();

        assert_eq!(results.len(), entities.len());
        for (record, entity) in results.iter().zip(&entities) {
            assert_eq!(&record.entity, entity);
            assert_eq!(record.accuracy, Accuracy::Approx);
            assert!(record.distance_km >= 0.0);
        }
    }

    #[test]
    fn test_estimate_all_empty() {
        let results = estimate_all(point(0.0, 0.0), &[]).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_estimate_all_rejects_bad_entity() {
        let entities = vec![Entity::new("ok", 1.0, 1.0), Entity::new("bad", 91.0, 1.0)];
        let err = estimate_all(point(0.0, 0.0), &entities).unwrap_err();
        assert_eq!(err, GeoError::LatitudeOutOfRange(91.0));
    }
}
