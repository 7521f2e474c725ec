use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::planner::{PlanParams, SweepOutcome, plan_for_listing, sweep_expiring};
use crate::error::AppError;
use crate::models::donation::{Allocation, DonationRecord};
use crate::models::listing::DonationMode;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/listings/:id/donation/plan", post(create_donation_plan))
        .route("/donations/trigger-expiring", post(trigger_expiring))
        .route("/donations", get(list_donations))
}

#[derive(Deserialize)]
pub struct DonationPlanRequest {
    pub donate_percent: f64,
    pub max_minutes: Option<f64>,
    pub top_k: Option<usize>,
}

#[derive(Serialize)]
pub struct DonationPlanResponse {
    pub donation_qty: u32,
    pub allocated_qty: u32,
    pub remaining_public_qty: u32,
    pub routing_used: bool,
    pub allocations: Vec<Allocation>,
}

#[derive(Deserialize)]
pub struct TriggerExpiringRequest {
    pub minutes_before_end: i64,
    pub max_minutes: Option<f64>,
    #[serde(default = "default_donate_percent")]
    pub donate_percent: f64,
}

fn default_donate_percent() -> f64 {
    1.0
}

async fn create_donation_plan(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<DonationPlanRequest>,
) -> Result<Json<DonationPlanResponse>, AppError> {
    let params = PlanParams {
        donate_percent: payload.donate_percent,
        max_minutes: payload.max_minutes,
        top_k: payload.top_k,
    };

    let outcome = plan_for_listing(&state, id, &params, DonationMode::Planned).await?;

    Ok(Json(DonationPlanResponse {
        donation_qty: outcome.donation_qty,
        allocated_qty: outcome.allocated_qty,
        remaining_public_qty: outcome.remaining_public_qty,
        routing_used: outcome.routing_used,
        allocations: outcome.allocations,
    }))
}

async fn trigger_expiring(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<TriggerExpiringRequest>,
) -> Result<Json<SweepOutcome>, AppError> {
    let outcome = sweep_expiring(
        &state,
        payload.minutes_before_end,
        payload.max_minutes,
        payload.donate_percent,
    )
    .await?;

    Ok(Json(outcome))
}

async fn list_donations(State(state): State<Arc<AppState>>) -> Json<Vec<DonationRecord>> {
    let donations = state
        .donations
        .iter()
        .map(|entry| entry.value().clone())
        .collect();
    Json(donations)
}
