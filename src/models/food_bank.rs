use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::GeoPoint;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodBank {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub location: GeoPoint,
    /// Relative need in [0, 1]; higher means the bank is shorter on supply.
    pub need_weight: f64,
    pub capacity_daily: Option<u32>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}
