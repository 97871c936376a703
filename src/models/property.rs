use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Tenant row. Every query touching a tenant-owned table carries
/// `property_id` as a hard predicate — see `tenancy.rs`.
#[derive(Debug, Clone, FromRow)]
pub struct Property {
    pub id: Uuid,
    pub name: String,
    pub timezone: String,
    pub currency: String,
    /// Fraction (0.0..=1.0) of total price required to move a reservation
    /// from `pending_payment` to `confirmed`.
    pub confirmation_threshold: f64,
}

impl Property {
    pub fn tz(&self) -> Tz {
        self.timezone.parse().unwrap_or(chrono_tz::UTC)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancellationPolicyType {
    NonRefundable,
    Free,
    Flexible,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancellationPolicy {
    pub policy_type: CancellationPolicyType,
    pub free_until_days_before_checkin: i32,
    pub penalty_percent: i32,
    pub notes: Option<String>,
}

impl Default for CancellationPolicy {
    fn default() -> Self {
        Self {
            policy_type: CancellationPolicyType::Flexible,
            free_until_days_before_checkin: 7,
            penalty_percent: 100,
            notes: None,
        }
    }
}
