//! Churches around Valletta, placed at known distances from the user.

use proximity_cache::geo::GeoPoint;
use proximity_cache::model::Entity;

/// Kilometers per degree of latitude on the haversine sphere.
pub const KM_PER_DEG_LAT: f64 = 6371.0 * std::f64::consts::PI / 180.0;

pub const USER_LAT: f64 = 35.8989;
pub const USER_LNG: f64 = 14.5146;

pub fn user() -> GeoPoint {
    GeoPoint::new(USER_LAT, USER_LNG).unwrap()
}

/// `point` shifted north (positive) or south (negative) by `km`.
pub fn shifted_north(point: GeoPoint, km: f64) -> GeoPoint {
    GeoPoint::new(point.latitude() + km / KM_PER_DEG_LAT, point.longitude()).unwrap()
}

/// `point` shifted east by `km`.
pub fn shifted_east(point: GeoPoint, km: f64) -> GeoPoint {
    let km_per_deg_lng = KM_PER_DEG_LAT * point.latitude().to_radians().cos();
    GeoPoint::new(point.latitude(), point.longitude() + km / km_per_deg_lng).unwrap()
}

fn church(id: &str, name: &str, at: GeoPoint) -> Entity {
    Entity::new(id, at.latitude(), at.longitude())
        .with_field("name", name)
        .with_field("denomination", "Catholic")
}

/// Three churches: 2 km north, 4.5 km east and 8 km south of [`user`],
/// listed farthest-first so input order differs from distance order.
pub fn churches() -> Vec<Entity> {
    vec![
        church("st-gregory", "St. Gregory", shifted_north(user(), -8.0)),
        church("st-julian", "St. Julian", shifted_east(user(), 4.5)),
        church("st-publius", "St. Publius", shifted_north(user(), 2.0)),
    ]
}

pub const NEAREST_ID: &str = "st-publius";
