use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{error, warn};

use crate::error::AppError;
use crate::geo::GeoPoint;
use crate::routing::RoutingClient;

/// One retry, on transport failures only. A well-formed error response
/// from OSRM means the request itself is bad and is not retried.
const RETRIES: u32 = 1;

pub struct OsrmClient {
    base_url: String,
    profile: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct TableResponse {
    code: String,
    durations: Option<Vec<Vec<Option<f64>>>>,
}

#[derive(Debug, Deserialize)]
struct RouteResponse {
    code: String,
    #[serde(default)]
    routes: Vec<Route>,
}

#[derive(Debug, Deserialize)]
struct Route {
    duration: f64,
}

impl OsrmClient {
    pub fn new(
        base_url: impl Into<String>,
        profile: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| AppError::Internal(format!("failed to build http client: {err}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            profile: profile.into(),
            client,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, params: &[(&str, &str)]) -> Option<T> {
        for attempt in 0..=RETRIES {
            match self.client.get(url).query(params).send().await {
                Ok(response) => {
                    let status = response.status();
                    if !status.is_success() {
                        warn!(%status, url, "osrm returned error status");
                        return None;
                    }
                    match response.json::<T>().await {
                        Ok(data) => return Some(data),
                        Err(err) => {
                            warn!(error = %err, url, "failed to decode osrm response");
                            return None;
                        }
                    }
                }
                Err(err) if (err.is_timeout() || err.is_connect()) && attempt < RETRIES => {
                    warn!(error = %err, attempt = attempt + 1, url, "osrm request failed; retrying");
                }
                Err(err) => {
                    error!(error = %err, url, "osrm request failed");
                    return None;
                }
            }
        }

        None
    }
}

fn coord_str(point: &GeoPoint) -> String {
    // OSRM wants lng,lat order
    format!("{},{}", point.lng, point.lat)
}

#[async_trait]
impl RoutingClient for OsrmClient {
    async fn table_durations(
        &self,
        origin: &GeoPoint,
        destinations: &[GeoPoint],
    ) -> Vec<Option<f64>> {
        if destinations.is_empty() {
            return Vec::new();
        }

        let coords = std::iter::once(coord_str(origin))
            .chain(destinations.iter().map(coord_str))
            .collect::<Vec<_>>()
            .join(";");
        let url = format!("{}/table/v1/{}/{}", self.base_url, self.profile, coords);

        let table: Option<TableResponse> = self
            .get_json(&url, &[("sources", "0"), ("annotations", "duration")])
            .await;

        let table = match table {
            Some(table) if table.code == "Ok" => table,
            _ => {
                warn!("osrm table lookup failed; reporting all destinations unknown");
                return vec![None; destinations.len()];
            }
        };

        // Row 0 is the single source; column 0 is the origin itself,
        // columns 1..=n line up with the destinations.
        let row = table
            .durations
            .unwrap_or_default()
            .into_iter()
            .next()
            .unwrap_or_default();

        (0..destinations.len())
            .map(|i| row.get(i + 1).copied().flatten())
            .collect()
    }

    async fn route_duration(&self, origin: &GeoPoint, dest: &GeoPoint) -> Option<f64> {
        let coords = format!("{};{}", coord_str(origin), coord_str(dest));
        let url = format!("{}/route/v1/{}/{}", self.base_url, self.profile, coords);

        let response: RouteResponse = self.get_json(&url, &[("overview", "false")]).await?;
        if response.code != "Ok" {
            return None;
        }

        response.routes.first().map(|route| route.duration)
    }
}

#[cfg(test)]
mod tests {
    use super::coord_str;
    use crate::geo::GeoPoint;

    #[test]
    fn coords_are_lng_lat() {
        let p = GeoPoint {
            lat: 42.36,
            lng: -71.06,
        };
        assert_eq!(coord_str(&p), "-71.06,42.36");
    }
}
