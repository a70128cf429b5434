//! Tunables for the cache and its routing backends.

use std::time::Duration;

use crate::refine::DEFAULT_REFINE_LIMIT;

/// Key the distance cache is persisted under.
pub const DEFAULT_CACHE_KEY: &str = "proximity_distance_cache";

#[derive(Debug, Clone)]
pub struct RefreshOptions {
    /// Maximum age of a cached result set.
    pub ttl: chrono::Duration,
    /// Displacement (meters) from the cached snapshot that forces a recompute.
    pub move_threshold_m: f64,
    /// Number of nearest candidates sent for routed refinement.
    pub refine_limit: usize,
    /// How often the background scheduler checks whether the TTL has run out.
    pub check_interval: Duration,
    pub cache_key: String,
}

impl Default for RefreshOptions {
    fn default() -> Self {
        Self {
            ttl: chrono::Duration::minutes(30),
            move_threshold_m: 3000.0,
            refine_limit: DEFAULT_REFINE_LIMIT,
            check_interval: Duration::from_secs(5 * 60),
            cache_key: DEFAULT_CACHE_KEY.to_string(),
        }
    }
}

/// OpenRouteService matrix endpoint settings.
#[derive(Debug, Clone)]
pub struct OrsConfig {
    pub base_url: String,
    pub profile: String,
    /// Sent as the `Authorization` header. Without one, no request is made.
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for OrsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openrouteservice.org".to_string(),
            profile: "driving-car".to_string(),
            api_key: None,
            timeout_secs: 5,
        }
    }
}

impl OrsConfig {
    /// Defaults, with `ORS_API_KEY` and `ORS_BASE_URL` taken from the
    /// environment when set and non-empty.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(key) = non_empty_var("ORS_API_KEY") {
            config.api_key = Some(key);
        }
        if let Some(url) = non_empty_var("ORS_BASE_URL") {
            config.base_url = url;
        }
        config
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// OSRM `table` service settings.
#[derive(Debug, Clone)]
pub struct OsrmConfig {
    pub base_url: String,
    pub profile: String,
    pub timeout_secs: u64,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            profile: "car".to_string(),
            timeout_secs: 5,
        }
    }
}
