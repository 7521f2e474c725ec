use std::time::Instant;

use chrono::{Duration, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::engine::allocation::allocate_units;
use crate::engine::scoring::score_candidates;
use crate::engine::selection::select_candidates;
use crate::error::AppError;
use crate::models::donation::{Allocation, DonationRecord, DonationStatus};
use crate::models::listing::{DonationMode, ListingStatus};
use crate::state::AppState;

#[derive(Debug, Clone)]
pub struct PlanParams {
    pub donate_percent: f64,
    pub max_minutes: Option<f64>,
    pub top_k: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanOutcome {
    pub listing_id: Uuid,
    pub title: String,
    /// Units carved out by `donate_percent`.
    pub donation_qty: u32,
    /// Units the allocator actually placed; below `donation_qty` when
    /// capacities bind (a constrained plan, still a success).
    pub allocated_qty: u32,
    pub remaining_public_qty: u32,
    pub routing_used: bool,
    pub allocations: Vec<Allocation>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SweepEntry {
    Planned {
        listing_id: Uuid,
        title: String,
        donation_qty: u32,
        allocated_qty: u32,
        routing_used: bool,
        allocations: Vec<Allocation>,
    },
    Failed {
        listing_id: Uuid,
        title: String,
        error: String,
    },
}

#[derive(Debug, Serialize)]
pub struct SweepOutcome {
    pub processed: usize,
    pub plans: Vec<SweepEntry>,
}

/// Compute and commit a donation plan for one listing.
///
/// Validation happens before any write, so failures leave the listing
/// untouched. `mode` is the donation mode stamped on the listing:
/// `Planned` for explicit requests, `Pending` for the expiry sweep.
pub async fn plan_for_listing(
    state: &AppState,
    listing_id: Uuid,
    params: &PlanParams,
    mode: DonationMode,
) -> Result<PlanOutcome, AppError> {
    let start = Instant::now();
    let result = compute_and_persist(state, listing_id, params, mode).await;

    let outcome_label = if result.is_ok() { "success" } else { "error" };
    state
        .metrics
        .plan_latency_seconds
        .with_label_values(&[outcome_label])
        .observe(start.elapsed().as_secs_f64());
    state
        .metrics
        .plans_total
        .with_label_values(&[outcome_label])
        .inc();

    if let Ok(outcome) = &result {
        state
            .metrics
            .allocated_units_total
            .inc_by(outcome.allocated_qty as u64);
        if !outcome.routing_used {
            state.metrics.routing_fallbacks_total.inc();
        }
        let _ = state.plan_events_tx.send(outcome.clone());
        info!(
            listing_id = %outcome.listing_id,
            donation_qty = outcome.donation_qty,
            allocated_qty = outcome.allocated_qty,
            routing_used = outcome.routing_used,
            "donation plan committed"
        );
    }

    result
}

async fn compute_and_persist(
    state: &AppState,
    listing_id: Uuid,
    params: &PlanParams,
    mode: DonationMode,
) -> Result<PlanOutcome, AppError> {
    if !(params.donate_percent > 0.0 && params.donate_percent <= 1.0) {
        return Err(AppError::InvalidInput(
            "donate_percent must be in (0, 1]".to_string(),
        ));
    }

    let listing = state
        .listings
        .get(&listing_id)
        .map(|entry| entry.value().clone())
        .ok_or_else(|| AppError::NotFound(format!("listing {listing_id} not found")))?;

    // the at-most-one-plan-per-listing guard; callers wanting stronger
    // guarantees serialize above this engine
    if listing.donation_mode != DonationMode::None {
        return Err(AppError::Conflict(format!(
            "listing {listing_id} already has a donation plan in flight"
        )));
    }

    let Some(origin) = listing.location else {
        return Err(AppError::InvalidInput(
            "listing has no usable location".to_string(),
        ));
    };

    let donation_qty = (listing.qty_available as f64 * params.donate_percent).floor() as u32;
    if donation_qty < 1 {
        return Err(AppError::InvalidInput(
            "donation quantity rounds to zero; nothing to donate".to_string(),
        ));
    }

    let max_minutes = params.max_minutes.unwrap_or(state.defaults.max_minutes);
    let top_k = params.top_k.unwrap_or(state.defaults.top_k);

    let (candidates, routing_used) = select_candidates(
        state.routing.as_ref(),
        &state.food_banks,
        &origin,
        top_k,
        max_minutes,
    )
    .await;

    if candidates.is_empty() {
        return Err(if routing_used {
            AppError::NoCandidates(
                "no reachable food banks within the time budget".to_string(),
            )
        } else {
            AppError::RoutingUnavailable
        });
    }

    let scored = score_candidates(candidates);
    let allocations = allocate_units(donation_qty, &scored, None);
    if allocations.is_empty() {
        return Err(AppError::AllocationImpossible);
    }
    let allocated_qty: u32 = allocations.iter().map(|allocation| allocation.qty).sum();

    let now = Utc::now();
    for allocation in &allocations {
        let record = DonationRecord {
            id: Uuid::new_v4(),
            listing_id,
            food_bank_id: allocation.food_bank_id,
            qty: allocation.qty,
            status: DonationStatus::Planned,
            created_at: now,
        };
        state.donations.insert(record.id, record);
    }

    // carve the donated units out before the plan becomes visible
    let remaining_public_qty = {
        let mut entry = state.listings.get_mut(&listing_id).ok_or_else(|| {
            AppError::Internal(format!("listing {listing_id} vanished during planning"))
        })?;
        entry.qty_available = entry.qty_available.saturating_sub(allocated_qty);
        entry.donation_mode = mode;
        entry.donation_plan = allocations.clone();
        entry.donate_percent = Some(params.donate_percent);
        if entry.qty_available == 0 {
            entry.status = ListingStatus::SoldOut;
        }
        entry.qty_available
    };

    Ok(PlanOutcome {
        listing_id,
        title: listing.title,
        donation_qty,
        allocated_qty,
        remaining_public_qty,
        routing_used,
        allocations,
    })
}

/// Plan donations for every open listing whose pickup window closes inside
/// the lookahead. One listing's failure is recorded in its own entry and
/// never aborts the rest of the sweep.
pub async fn sweep_expiring(
    state: &AppState,
    minutes_before_end: i64,
    max_minutes: Option<f64>,
    donate_percent: f64,
) -> Result<SweepOutcome, AppError> {
    if minutes_before_end <= 0 {
        return Err(AppError::InvalidInput(
            "minutes_before_end must be positive".to_string(),
        ));
    }

    if !(donate_percent > 0.0 && donate_percent <= 1.0) {
        return Err(AppError::InvalidInput(
            "donate_percent must be in (0, 1]".to_string(),
        ));
    }

    let now = Utc::now();
    let cutoff = now + Duration::minutes(minutes_before_end);

    let expiring: Vec<(Uuid, String)> = state
        .listings
        .iter()
        .filter_map(|entry| {
            let listing = entry.value();
            let closing_soon = listing
                .pickup_end
                .is_some_and(|end| end > now && end <= cutoff);
            let eligible = listing.status == ListingStatus::Open
                && listing.qty_available > 0
                && closing_soon
                && listing.donation_mode == DonationMode::None;
            eligible.then(|| (listing.id, listing.title.clone()))
        })
        .collect();

    let params = PlanParams {
        donate_percent,
        max_minutes,
        top_k: None,
    };

    let mut plans = Vec::with_capacity(expiring.len());
    let mut processed = 0;

    for (listing_id, title) in expiring {
        match plan_for_listing(state, listing_id, &params, DonationMode::Pending).await {
            Ok(outcome) => {
                processed += 1;
                plans.push(SweepEntry::Planned {
                    listing_id,
                    title,
                    donation_qty: outcome.donation_qty,
                    allocated_qty: outcome.allocated_qty,
                    routing_used: outcome.routing_used,
                    allocations: outcome.allocations,
                });
            }
            Err(err) => {
                warn!(listing_id = %listing_id, error = %err, "sweep: donation plan failed");
                plans.push(SweepEntry::Failed {
                    listing_id,
                    title,
                    error: err.to_string(),
                });
            }
        }
    }

    Ok(SweepOutcome { processed, plans })
}
