//! Records flowing through the distance cache.
//!
//! Field names serialize in camelCase so a persisted [`CacheEntry`] has the
//! same shape as the record the map front end stores.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::GeoError;
use crate::geo::GeoPoint;
use crate::nearest;

/// A place supplied by the content source.
///
/// Only `id` and the coordinates are interpreted; every other field is
/// carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Entity {
    pub fn new(id: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            id: id.into(),
            latitude,
            longitude,
            fields: Map::new(),
        }
    }

    /// Attach a pass-through display field.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn location(&self) -> Result<GeoPoint, GeoError> {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// Where a distance value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Accuracy {
    /// Great-circle estimate.
    Approx,
    /// Road-network distance from the matrix service.
    Routed,
}

/// An entity annotated with its distance from the user.
///
/// Persisted with the entity's display fields under their own `fields` key,
/// so a display field may share a name with `distanceKm` or `accuracy`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredRecord", into = "StoredRecord")]
pub struct DistanceRecord {
    pub entity: Entity,
    pub distance_km: f64,
    pub accuracy: Accuracy,
}

impl DistanceRecord {
    pub fn id(&self) -> &str {
        &self.entity.id
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredRecord {
    id: String,
    latitude: f64,
    longitude: f64,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    fields: Map<String, Value>,
    distance_km: f64,
    accuracy: Accuracy,
}

impl From<DistanceRecord> for StoredRecord {
    fn from(record: DistanceRecord) -> Self {
        Self {
            id: record.entity.id,
            latitude: record.entity.latitude,
            longitude: record.entity.longitude,
            fields: record.entity.fields,
            distance_km: record.distance_km,
            accuracy: record.accuracy,
        }
    }
}

impl From<StoredRecord> for DistanceRecord {
    fn from(stored: StoredRecord) -> Self {
        Self {
            entity: Entity {
                id: stored.id,
                latitude: stored.latitude,
                longitude: stored.longitude,
                fields: stored.fields,
            },
            distance_km: stored.distance_km,
            accuracy: stored.accuracy,
        }
    }
}

/// One record per input entity, in input order.
pub type ResultSet = Vec<DistanceRecord>;

/// The last computed result set together with what it was computed against.
///
/// Replaced as a whole after every successful cycle, never patched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub computed_at: DateTime<Utc>,
    pub user_location_snapshot: GeoPoint,
    pub results: ResultSet,
}

impl CacheEntry {
    /// True when the entry holds exactly one record for each of `entities`.
    pub fn covers(&self, entities: &[Entity]) -> bool {
        if self.results.len() != entities.len() {
            return false;
        }
        let mut cached = self.results.iter().map(|r| r.id()).collect::<Vec<_>>();
        let mut current = entities.iter().map(|e| e.id.as_str()).collect::<Vec<_>>();
        cached.sort_unstable();
        current.sort_unstable();
        cached == current
    }
}

/// What presentation code consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyView {
    pub result_set: ResultSet,
    pub closest: Option<DistanceRecord>,
}

impl NearbyView {
    pub fn from_results(result_set: ResultSet) -> Self {
        let closest = nearest::closest(&result_set).cloned();
        Self {
            result_set,
            closest,
        }
    }
}
