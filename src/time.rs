use chrono::{DateTime, Utc};

/// Current UTC instant. Centralised so call sites never reach for
/// `Utc::now()` directly, keeping clock access mockable if a fixed-clock
/// test harness is ever introduced.
pub fn utc_now() -> DateTime<Utc> {
    Utc::now()
}
