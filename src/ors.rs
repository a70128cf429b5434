//! OpenRouteService matrix adapter for routed distances.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::OrsConfig;
use crate::error::RefinementError;
use crate::geo::GeoPoint;
use crate::refine::origin_row;
use crate::traits::RoutedDistanceProvider;

#[derive(Debug, Clone)]
pub struct OrsClient {
    config: OrsConfig,
    client: reqwest::blocking::Client,
}

impl OrsClient {
    pub fn new(config: OrsConfig) -> Result<Self, reqwest::Error> {
        if config.api_key.is_none() {
            tracing::warn!("no ORS API key configured, routed refinement is disabled");
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    fn matrix_url(&self) -> String {
        format!(
            "{}/v2/matrix/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.profile
        )
    }
}

impl RoutedDistanceProvider for OrsClient {
    fn routed_distances_km(
        &self,
        origin: GeoPoint,
        destinations: &[GeoPoint],
    ) -> Result<Vec<f64>, RefinementError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(RefinementError::MissingCredential)?;

        if destinations.is_empty() {
            return Ok(Vec::new());
        }

        let body = MatrixRequest::new(origin, destinations);
        debug!(destinations = destinations.len(), "requesting ORS distance matrix");

        let response = self
            .client
            .post(self.matrix_url())
            .header(reqwest::header::AUTHORIZATION, api_key)
            .json(&body)
            .send()?;

        let status = response.status();
        let text = response.text()?;
        if !status.is_success() {
            return Err(RefinementError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: MatrixResponse = serde_json::from_str(&text)?;
        origin_row(parsed.distances)
    }
}

/// Matrix request with the user at index 0 as the only source.
#[derive(Debug, Serialize)]
struct MatrixRequest {
    locations: Vec<[f64; 2]>,
    sources: Vec<usize>,
    destinations: Vec<usize>,
    metrics: [&'static str; 1],
    units: &'static str,
}

impl MatrixRequest {
    fn new(origin: GeoPoint, destinations: &[GeoPoint]) -> Self {
        let locations = std::iter::once(origin)
            .chain(destinations.iter().copied())
            .map(|point| point.lng_lat())
            .collect();

        Self {
            locations,
            sources: vec![0],
            destinations: (1..=destinations.len()).collect(),
            metrics: ["distance"],
            units: "km",
        }
    }
}

#[derive(Debug, Deserialize)]
struct MatrixResponse {
    distances: Option<Vec<Vec<Option<f64>>>>,
}
