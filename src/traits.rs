//! Capability seams between the cache and the outside world.
//!
//! These are intentionally minimal. The orchestrator only ever talks to a
//! routing backend, a key-value store and a clock through them, so tests
//! and hosts can swap any of the three.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::{RefinementError, StoreError};
use crate::geo::GeoPoint;

/// Provides routed (road network) distances from one origin.
///
/// Implementations make a single request per call and do not retry. The
/// returned vector is expected to follow `destinations` order; callers
/// verify its length.
pub trait RoutedDistanceProvider: Send + Sync {
    fn routed_distances_km(
        &self,
        origin: GeoPoint,
        destinations: &[GeoPoint],
    ) -> Result<Vec<f64>, RefinementError>;
}

impl<T: RoutedDistanceProvider + ?Sized> RoutedDistanceProvider for Arc<T> {
    fn routed_distances_km(
        &self,
        origin: GeoPoint,
        destinations: &[GeoPoint],
    ) -> Result<Vec<f64>, RefinementError> {
        (**self).routed_distances_km(origin, destinations)
    }
}

/// String key-value persistence.
///
/// Writes replace the whole value; concurrent writers resolve as
/// last-write-wins.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }
}

/// Source of "now".
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

impl<T: Clock + ?Sized> Clock for Arc<T> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
