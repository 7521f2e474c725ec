pub mod osrm;

pub use osrm::OsrmClient;

use async_trait::async_trait;

use crate::geo::GeoPoint;

/// Boundary to the external driving-time service.
#[async_trait]
pub trait RoutingClient: Send + Sync {
    /// Durations in seconds from one origin to each destination, in
    /// destination order. `None` means unreachable or unknown; when the
    /// service is down every entry is `None` — numbers are never invented.
    /// An empty destination list yields an empty result.
    async fn table_durations(
        &self,
        origin: &GeoPoint,
        destinations: &[GeoPoint],
    ) -> Vec<Option<f64>>;

    /// Duration in seconds for a single origin → destination pair.
    async fn route_duration(&self, origin: &GeoPoint, dest: &GeoPoint) -> Option<f64>;
}
