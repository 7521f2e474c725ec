use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum DonationStatus {
    Planned,
    Pending,
    Assigned,
}

/// One planned hand-off of units to a food bank. Immutable once written;
/// re-planning creates new records instead of editing old ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonationRecord {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub food_bank_id: Uuid,
    pub qty: u32,
    pub status: DonationStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Allocation {
    pub food_bank_id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub qty: u32,
    /// None when the plan was computed in routing-fallback mode.
    pub duration_minutes: Option<f64>,
    pub score: f64,
}
