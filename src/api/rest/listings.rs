use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::engine::planner::{PlanParams, plan_for_listing};
use crate::error::AppError;
use crate::geo::GeoPoint;
use crate::models::donation::Allocation;
use crate::models::listing::{DonationMode, Listing, ListingStatus};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/listings", post(create_listing).get(list_listings))
        .route("/listings/:id", get(get_listing))
}

#[derive(Deserialize)]
pub struct CreateListingRequest {
    pub title: String,
    pub business_name: Option<String>,
    pub qty_available: u32,
    pub price_cents: Option<u32>,
    pub location: Option<GeoPoint>,
    pub pickup_start: Option<DateTime<Utc>>,
    pub pickup_end: Option<DateTime<Utc>>,
    pub donate_percent: Option<f64>,
}

#[derive(Serialize)]
pub struct CreateListingResponse {
    pub listing: Listing,
    pub allocations: Vec<Allocation>,
    pub routing_used: Option<bool>,
}

async fn create_listing(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateListingRequest>,
) -> Result<Json<CreateListingResponse>, AppError> {
    if payload.title.trim().is_empty() {
        return Err(AppError::InvalidInput("title cannot be empty".to_string()));
    }

    if payload.qty_available == 0 {
        return Err(AppError::InvalidInput(
            "qty_available must be > 0".to_string(),
        ));
    }

    if let Some(percent) = payload.donate_percent {
        if !(percent > 0.0 && percent <= 1.0) {
            return Err(AppError::InvalidInput(
                "donate_percent must be in (0, 1]".to_string(),
            ));
        }
        if payload.location.is_none() {
            return Err(AppError::InvalidInput(
                "location is required when donate_percent is set so nearby food banks can be found"
                    .to_string(),
            ));
        }
    }

    let listing = Listing {
        id: Uuid::new_v4(),
        title: payload.title,
        business_name: payload.business_name,
        qty_available: payload.qty_available,
        price_cents: payload.price_cents,
        status: ListingStatus::Open,
        location: payload.location,
        pickup_start: payload.pickup_start,
        pickup_end: payload.pickup_end,
        donation_mode: DonationMode::None,
        donation_plan: Vec::new(),
        donate_percent: None,
        created_at: Utc::now(),
    };

    let listing_id = listing.id;
    state.listings.insert(listing_id, listing.clone());

    let Some(percent) = payload.donate_percent else {
        return Ok(Json(CreateListingResponse {
            listing,
            allocations: Vec::new(),
            routing_used: None,
        }));
    };

    let params = PlanParams {
        donate_percent: percent,
        max_minutes: None,
        top_k: None,
    };

    match plan_for_listing(&state, listing_id, &params, DonationMode::Planned).await {
        Ok(outcome) => {
            let listing = state
                .listings
                .get(&listing_id)
                .map(|entry| entry.value().clone())
                .ok_or_else(|| {
                    AppError::Internal(format!("listing {listing_id} vanished after planning"))
                })?;

            Ok(Json(CreateListingResponse {
                listing,
                allocations: outcome.allocations,
                routing_used: Some(outcome.routing_used),
            }))
        }
        Err(err) => {
            // the listing only existed to carry this donation; a listing
            // whose promised donation never materialized must not reach
            // buyers, so compensate by deleting it and its records
            warn!(
                listing_id = %listing_id,
                error = %err,
                "donation plan failed; deleting listing created with donation intent"
            );
            state.listings.remove(&listing_id);
            state
                .donations
                .retain(|_, record| record.listing_id != listing_id);
            Err(err)
        }
    }
}

async fn list_listings(State(state): State<Arc<AppState>>) -> Json<Vec<Listing>> {
    let listings = state
        .listings
        .iter()
        .map(|entry| entry.value().clone())
        .collect();
    Json(listings)
}

async fn get_listing(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Listing>, AppError> {
    let listing = state
        .listings
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("listing {} not found", id)))?;

    Ok(Json(listing.value().clone()))
}
