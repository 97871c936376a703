use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// `InHouse` is canonical; the deprecated `checked_in` DB enum value is
/// not modelled (DESIGN.md Open Question #2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "reservation_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Pending,
    PendingPayment,
    Confirmed,
    InHouse,
    CheckedOut,
    Cancelled,
}

impl ReservationStatus {
    pub const OPERATIONAL: [ReservationStatus; 3] = [
        ReservationStatus::Confirmed,
        ReservationStatus::InHouse,
        ReservationStatus::CheckedOut,
    ];

    pub fn is_operational(self) -> bool {
        Self::OPERATIONAL.contains(&self)
    }

    pub fn is_payable(self) -> bool {
        matches!(self, ReservationStatus::Confirmed | ReservationStatus::InHouse)
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Reservation {
    pub id: Uuid,
    pub property_id: Uuid,
    pub hold_id: Option<Uuid>,
    pub status: ReservationStatus,
    pub checkin: NaiveDate,
    pub checkout: NaiveDate,
    pub total_cents: i64,
    pub currency: String,
    pub room_type_id: Option<Uuid>,
    pub room_id: Option<Uuid>,
    pub guest_id: Option<Uuid>,
    pub guest_name: Option<String>,
    pub adult_count: i16,
    pub children_ages: Vec<i16>,
    pub adjusted_checkin: Option<NaiveDate>,
    pub adjusted_checkout: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "folio_payment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FolioPaymentStatus {
    Captured,
    Voided,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "folio_payment_method", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FolioPaymentMethod {
    CreditCard,
    DebitCard,
    Cash,
    Pix,
    Transfer,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FolioPayment {
    pub id: Uuid,
    pub property_id: Uuid,
    pub reservation_id: Uuid,
    pub amount_cents: i64,
    pub method: FolioPaymentMethod,
    pub status: FolioPaymentStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "extra_pricing_mode", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExtraPricingMode {
    PerUnit,
    PerNight,
    PerGuest,
    PerGuestPerNight,
}

impl ExtraPricingMode {
    /// Computes `total_price_cents` for a reservation extra.
    pub fn calculate_total(
        self,
        unit_price_cents: i64,
        quantity: i32,
        nights: i64,
        total_guests: i32,
    ) -> Result<i64, String> {
        if unit_price_cents < 0 {
            return Err("unit_price_cents must be >= 0".to_string());
        }
        if quantity < 1 {
            return Err("quantity must be >= 1".to_string());
        }
        if nights < 1 {
            return Err("nights must be >= 1".to_string());
        }
        if total_guests < 1 {
            return Err("total_guests must be >= 1".to_string());
        }
        Ok(match self {
            ExtraPricingMode::PerUnit => unit_price_cents * quantity as i64,
            ExtraPricingMode::PerNight => unit_price_cents * quantity as i64 * nights,
            ExtraPricingMode::PerGuest => unit_price_cents * quantity as i64 * total_guests as i64,
            ExtraPricingMode::PerGuestPerNight => {
                unit_price_cents * quantity as i64 * total_guests as i64 * nights
            }
        })
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ReservationExtra {
    pub id: Uuid,
    pub property_id: Uuid,
    pub reservation_id: Uuid,
    pub name: String,
    pub pricing_mode: ExtraPricingMode,
    pub unit_price_cents: i64,
    pub quantity: i32,
    pub total_price_cents: i64,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PendingRefund {
    pub id: Uuid,
    pub property_id: Uuid,
    pub reservation_id: Uuid,
    pub amount_cents: i64,
    pub policy_applied: sqlx::types::Json<crate::models::property::CancellationPolicy>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FolioSummary {
    pub reservation_id: Uuid,
    pub total_cents: i64,
    pub extras_total_cents: i64,
    pub paid_cents: i64,
    pub balance_cents: i64,
    pub payments: Vec<FolioPayment>,
    pub extras: Vec<ReservationExtra>,
}
