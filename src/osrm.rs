//! OSRM HTTP adapter for routed distances.

use serde::Deserialize;

use crate::config::OsrmConfig;
use crate::error::RefinementError;
use crate::geo::GeoPoint;
use crate::refine::origin_row;
use crate::traits::RoutedDistanceProvider;

#[derive(Debug, Clone)]
pub struct OsrmClient {
    config: OsrmConfig,
    client: reqwest::blocking::Client,
}

impl OsrmClient {
    pub fn new(config: OsrmConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    /// Table request with the origin as the only source.
    fn table_url(&self, origin: GeoPoint, destinations: &[GeoPoint]) -> String {
        let coords = std::iter::once(&origin)
            .chain(destinations)
            .map(|point| format!("{:.6},{:.6}", point.longitude(), point.latitude()))
            .collect::<Vec<_>>()
            .join(";");

        let targets = (1..=destinations.len())
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join(";");

        format!(
            "{}/table/v1/{}/{}?sources=0&destinations={}&annotations=distance",
            self.config.base_url.trim_end_matches('/'),
            self.config.profile,
            coords,
            targets
        )
    }
}

impl RoutedDistanceProvider for OsrmClient {
    fn routed_distances_km(
        &self,
        origin: GeoPoint,
        destinations: &[GeoPoint],
    ) -> Result<Vec<f64>, RefinementError> {
        if destinations.is_empty() {
            return Ok(Vec::new());
        }

        let body = self
            .client
            .get(self.table_url(origin, destinations))
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.json::<OsrmTableResponse>())?;

        if body.code != "Ok" {
            return Err(RefinementError::Rejected(body.message.unwrap_or(body.code)));
        }

        // OSRM reports meters.
        let meters = origin_row(body.distances)?;
        Ok(meters.into_iter().map(|m| m / 1000.0).collect())
    }
}

#[derive(Debug, Deserialize)]
struct OsrmTableResponse {
    code: String,
    message: Option<String>,
    distances: Option<Vec<Vec<Option<f64>>>>,
}
