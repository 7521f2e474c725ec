use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::GeoPoint;
use crate::models::donation::Allocation;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ListingStatus {
    Open,
    SoldOut,
    Expired,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum DonationMode {
    None,
    Planned,
    Pending,
    Assigned,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    pub id: Uuid,
    pub title: String,
    pub business_name: Option<String>,
    pub qty_available: u32,
    pub price_cents: Option<u32>,
    pub status: ListingStatus,
    pub location: Option<GeoPoint>,
    pub pickup_start: Option<DateTime<Utc>>,
    pub pickup_end: Option<DateTime<Utc>>,
    pub donation_mode: DonationMode,
    /// Snapshot of the most recent plan; donation records are the durable copy.
    pub donation_plan: Vec<Allocation>,
    pub donate_percent: Option<f64>,
    pub created_at: DateTime<Utc>,
}
