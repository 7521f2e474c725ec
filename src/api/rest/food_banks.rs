use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::routing::{patch, post};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::geo::GeoPoint;
use crate::models::food_bank::FoodBank;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/food-banks", post(create_food_bank).get(list_food_banks))
        .route("/food-banks/:id/active", patch(update_food_bank_active))
}

#[derive(Deserialize)]
pub struct CreateFoodBankRequest {
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub location: GeoPoint,
    pub need_weight: Option<f64>,
    pub capacity_daily: Option<u32>,
}

#[derive(Deserialize)]
pub struct UpdateActiveRequest {
    pub active: bool,
}

async fn create_food_bank(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateFoodBankRequest>,
) -> Result<Json<FoodBank>, AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::InvalidInput("name cannot be empty".to_string()));
    }

    let food_bank = FoodBank {
        id: Uuid::new_v4(),
        name: payload.name,
        address: payload.address,
        phone: payload.phone,
        location: payload.location,
        need_weight: payload.need_weight.unwrap_or(1.0).clamp(0.0, 1.0),
        capacity_daily: payload.capacity_daily,
        active: true,
        created_at: Utc::now(),
    };

    state.food_banks.insert(food_bank.id, food_bank.clone());
    Ok(Json(food_bank))
}

async fn list_food_banks(State(state): State<Arc<AppState>>) -> Json<Vec<FoodBank>> {
    let food_banks = state
        .food_banks
        .iter()
        .map(|entry| entry.value().clone())
        .collect();
    Json(food_banks)
}

async fn update_food_bank_active(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateActiveRequest>,
) -> Result<Json<FoodBank>, AppError> {
    let mut food_bank = state
        .food_banks
        .get_mut(&id)
        .ok_or_else(|| AppError::NotFound(format!("food bank {} not found", id)))?;

    food_bank.active = payload.active;

    Ok(Json(food_bank.clone()))
}
