use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "hold_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum HoldStatus {
    Active,
    Expired,
    Cancelled,
    Converted,
}

/// A time-bounded intent to occupy inventory. Owns a set of [`HoldNight`]
/// rows, one per night in `[checkin, checkout)`.
///
/// `adult_count` + `children_ages` is authoritative (no legacy
/// `guest_count` column — see DESIGN.md).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Hold {
    pub id: Uuid,
    pub property_id: Uuid,
    pub room_type_id: Option<Uuid>,
    pub checkin: NaiveDate,
    pub checkout: NaiveDate,
    pub expires_at: DateTime<Utc>,
    pub total_cents: i64,
    pub currency: String,
    pub status: HoldStatus,
    pub conversation_id: Option<Uuid>,
    pub create_idempotency_key: Option<String>,
    pub adult_count: i16,
    pub children_ages: Vec<i16>,
    pub guest_name: Option<String>,
    pub guest_email: Option<String>,
    pub guest_phone: Option<String>,
}

impl Hold {
    pub fn nights(&self) -> i64 {
        (self.checkout - self.checkin).num_days()
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct HoldNight {
    pub hold_id: Uuid,
    pub property_id: Uuid,
    pub room_type_id: Uuid,
    pub date: NaiveDate,
    pub qty: i32,
}

/// Result of [`crate::services::holds::create_hold`]. The `created: bool`
/// flag lets callers distinguish a fresh reservation of inventory from an
/// idempotent replay.
#[derive(Debug, Clone, Serialize)]
pub struct CreateHoldResult {
    pub hold: Hold,
    pub created: bool,
}
