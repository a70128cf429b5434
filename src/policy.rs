//! Cache validity policy.
//!
//! Two independent invalidation triggers: age and displacement. Either one
//! alone forces a recompute.

use chrono::{DateTime, Duration, Utc};

use crate::geo::GeoPoint;
use crate::haversine::haversine_m;
use crate::model::CacheEntry;

/// Outcome of checking a cache entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verdict {
    Fresh,
    Missing,
    /// Entry age reached the TTL.
    Expired { age: Duration },
    /// User moved at least the threshold away from the snapshot.
    Moved { meters: f64 },
}

impl Verdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, Verdict::Fresh)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CachePolicy {
    pub ttl: Duration,
    pub move_threshold_m: f64,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            ttl: Duration::minutes(30),
            move_threshold_m: 3000.0,
        }
    }
}

impl CachePolicy {
    pub fn new(ttl: Duration, move_threshold_m: f64) -> Self {
        Self { ttl, move_threshold_m }
    }

    pub fn evaluate(&self, entry: Option<&CacheEntry>, here: GeoPoint, now: DateTime<Utc>) -> Verdict {
        let Some(entry) = entry else {
            return Verdict::Missing;
        };

        let age = now - entry.computed_at;
        if self.is_expired(entry.computed_at, now) {
            return Verdict::Expired { age };
        }

        let meters = haversine_m(entry.user_location_snapshot, here);
        if meters >= self.move_threshold_m {
            return Verdict::Moved { meters };
        }

        Verdict::Fresh
    }

    /// True once `computed_at` is at least a TTL in the past.
    pub fn is_expired(&self, computed_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now - computed_at >= self.ttl
    }
}
