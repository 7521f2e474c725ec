use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::config::Config;
use crate::engine::planner::PlanOutcome;
use crate::error::AppError;
use crate::models::donation::DonationRecord;
use crate::models::food_bank::FoodBank;
use crate::models::listing::Listing;
use crate::observability::metrics::Metrics;
use crate::routing::{OsrmClient, RoutingClient};

#[derive(Debug, Clone, Copy)]
pub struct PlanDefaults {
    pub max_minutes: f64,
    pub top_k: usize,
}

pub struct AppState {
    pub listings: DashMap<Uuid, Listing>,
    pub food_banks: DashMap<Uuid, FoodBank>,
    pub donations: DashMap<Uuid, DonationRecord>,
    pub routing: Arc<dyn RoutingClient>,
    pub defaults: PlanDefaults,
    pub plan_events_tx: broadcast::Sender<PlanOutcome>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let routing = OsrmClient::new(
            config.osrm_base_url.clone(),
            config.osrm_profile.clone(),
            Duration::from_secs(config.osrm_timeout_secs),
        )?;

        Ok(Self::with_routing(
            Arc::new(routing),
            PlanDefaults {
                max_minutes: config.default_max_minutes,
                top_k: config.default_top_k,
            },
            config.event_buffer_size,
        ))
    }

    pub fn with_routing(
        routing: Arc<dyn RoutingClient>,
        defaults: PlanDefaults,
        event_buffer_size: usize,
    ) -> Self {
        let (plan_events_tx, _unused_rx) = broadcast::channel(event_buffer_size);

        Self {
            listings: DashMap::new(),
            food_banks: DashMap::new(),
            donations: DashMap::new(),
            routing,
            defaults,
            plan_events_tx,
            metrics: Metrics::new(),
        }
    }
}
