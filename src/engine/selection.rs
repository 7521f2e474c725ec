use dashmap::DashMap;
use tracing::{info, warn};
use uuid::Uuid;

use crate::geo::{GeoPoint, haversine_km};
use crate::models::food_bank::FoodBank;
use crate::routing::RoutingClient;

/// ~30 mph surface-street average, only used to bound the prefilter radius.
const KM_PER_MINUTE_ESTIMATE: f64 = 0.8;

/// Straight-line distance is a poor proxy for travel time, so the
/// prefilter hands the routing service more candidates than we keep.
const PREFILTER_OVERSAMPLE: usize = 4;

#[derive(Debug, Clone)]
pub struct Candidate {
    pub bank: FoodBank,
    pub duration_minutes: Option<f64>,
}

/// Find food banks reachable from `origin` within `max_minutes` of driving.
///
/// Returns `(candidates, routing_used)`. `routing_used` is false only when
/// the prefilter found destinations but the routing service could not
/// produce a single duration; in that degraded mode the nearest `top_k`
/// banks are returned with unknown durations and the caller is expected to
/// surface the lower confidence rather than present a precise plan.
pub async fn select_candidates(
    routing: &dyn RoutingClient,
    food_banks: &DashMap<Uuid, FoodBank>,
    origin: &GeoPoint,
    top_k: usize,
    max_minutes: f64,
) -> (Vec<Candidate>, bool) {
    // generous 2x so slow roads don't exclude reachable banks
    let radius_km = max_minutes * KM_PER_MINUTE_ESTIMATE * 2.0;

    let mut nearby: Vec<(f64, FoodBank)> = food_banks
        .iter()
        .filter_map(|entry| {
            let bank = entry.value();
            if !bank.active {
                return None;
            }
            let distance_km = haversine_km(origin, &bank.location);
            (distance_km <= radius_km).then(|| (distance_km, bank.clone()))
        })
        .collect();

    nearby.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
    nearby.truncate(top_k.saturating_mul(PREFILTER_OVERSAMPLE));

    if nearby.is_empty() {
        // nothing to route to; not the same thing as the service being down
        info!(radius_km, "no active food banks within prefilter radius");
        return (Vec::new(), true);
    }

    let destinations: Vec<GeoPoint> = nearby.iter().map(|(_, bank)| bank.location).collect();

    let durations = if destinations.len() == 1 {
        vec![routing.route_duration(origin, &destinations[0]).await]
    } else {
        routing.table_durations(origin, &destinations).await
    };

    let routing_used = durations.iter().any(|duration| duration.is_some());

    let mut candidates = Vec::new();
    if routing_used {
        for ((_, bank), duration) in nearby.into_iter().zip(durations) {
            let Some(seconds) = duration else { continue };
            let minutes = seconds / 60.0;
            if minutes <= max_minutes {
                candidates.push(Candidate {
                    bank,
                    duration_minutes: Some(round_tenth(minutes)),
                });
            }
        }
    } else {
        warn!("routing unavailable; falling back to straight-line proximity");
        for (_, bank) in nearby.into_iter().take(top_k) {
            candidates.push(Candidate {
                bank,
                duration_minutes: None,
            });
        }
    }

    candidates.truncate(top_k);
    (candidates, routing_used)
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::Utc;
    use dashmap::DashMap;
    use uuid::Uuid;

    use super::select_candidates;
    use crate::geo::GeoPoint;
    use crate::models::food_bank::FoodBank;
    use crate::routing::RoutingClient;

    struct StubRouting {
        durations: Vec<Option<f64>>,
    }

    #[async_trait]
    impl RoutingClient for StubRouting {
        async fn table_durations(
            &self,
            _origin: &GeoPoint,
            destinations: &[GeoPoint],
        ) -> Vec<Option<f64>> {
            destinations
                .iter()
                .enumerate()
                .map(|(i, _)| self.durations.get(i).copied().flatten())
                .collect()
        }

        async fn route_duration(&self, _origin: &GeoPoint, _dest: &GeoPoint) -> Option<f64> {
            self.durations.first().copied().flatten()
        }
    }

    fn bank(lat: f64, lng: f64, active: bool) -> FoodBank {
        FoodBank {
            id: Uuid::new_v4(),
            name: "bank".to_string(),
            address: None,
            phone: None,
            location: GeoPoint { lat, lng },
            need_weight: 1.0,
            capacity_daily: None,
            active,
            created_at: Utc::now(),
        }
    }

    fn origin() -> GeoPoint {
        GeoPoint {
            lat: 42.3601,
            lng: -71.0589,
        }
    }

    #[tokio::test]
    async fn empty_store_reports_routing_used() {
        let banks = DashMap::new();
        let routing = StubRouting { durations: vec![] };

        let (candidates, routing_used) =
            select_candidates(&routing, &banks, &origin(), 5, 20.0).await;

        assert!(candidates.is_empty());
        assert!(routing_used);
    }

    #[tokio::test]
    async fn inactive_banks_are_never_candidates() {
        let banks = DashMap::new();
        let inactive = bank(42.36, -71.06, false);
        banks.insert(inactive.id, inactive);
        let routing = StubRouting {
            durations: vec![Some(60.0)],
        };

        let (candidates, routing_used) =
            select_candidates(&routing, &banks, &origin(), 5, 20.0).await;

        assert!(candidates.is_empty());
        assert!(routing_used);
    }

    #[tokio::test]
    async fn discards_candidates_over_the_time_budget() {
        let banks = DashMap::new();
        // nearest-first prefilter order: near, then far
        let near = bank(42.3650, -71.0600, true);
        let far = bank(42.4500, -71.1000, true);
        banks.insert(near.id, near.clone());
        banks.insert(far.id, far.clone());
        let routing = StubRouting {
            durations: vec![Some(300.0), Some(30.0 * 60.0)],
        };

        let (candidates, routing_used) =
            select_candidates(&routing, &banks, &origin(), 5, 20.0).await;

        assert!(routing_used);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].bank.id, near.id);
        assert_eq!(candidates[0].duration_minutes, Some(5.0));
    }

    #[tokio::test]
    async fn all_unknown_durations_fall_back_to_proximity() {
        let banks = DashMap::new();
        let near = bank(42.3650, -71.0600, true);
        let far = bank(42.4500, -71.1000, true);
        banks.insert(near.id, near.clone());
        banks.insert(far.id, far.clone());
        let routing = StubRouting {
            durations: vec![None, None],
        };

        let (candidates, routing_used) =
            select_candidates(&routing, &banks, &origin(), 1, 20.0).await;

        assert!(!routing_used);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].bank.id, near.id);
        assert!(candidates[0].duration_minutes.is_none());
    }

    #[tokio::test]
    async fn single_candidate_uses_the_route_lookup() {
        let banks = DashMap::new();
        let only = bank(42.3650, -71.0600, true);
        banks.insert(only.id, only.clone());
        let routing = StubRouting {
            durations: vec![Some(450.0)],
        };

        let (candidates, routing_used) =
            select_candidates(&routing, &banks, &origin(), 5, 20.0).await;

        assert!(routing_used);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].duration_minutes, Some(7.5));
    }
}
