use chrono::NaiveDate;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Availability/Restriction/Inventory row keyed by (property, room type,
/// date). `inv_total - inv_booked - inv_held` MUST remain >= 0 at all
/// times.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AriDay {
    pub property_id: Uuid,
    pub room_type_id: Uuid,
    pub date: NaiveDate,
    pub inv_total: i32,
    pub inv_booked: i32,
    pub inv_held: i32,
    pub currency: String,
    /// Legacy flat rate, used only when no PAX rate is configured.
    pub base_rate_cents: Option<i64>,
}

impl AriDay {
    pub fn available(&self) -> i32 {
        self.inv_total - self.inv_booked - self.inv_held
    }
}

/// Per-night rate matrix keyed by (property, room type, date). Columns are
/// indexed by adult occupancy (1..=4) and three child-age buckets.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RateDay {
    pub property_id: Uuid,
    pub room_type_id: Uuid,
    pub date: NaiveDate,
    pub price_1pax_cents: Option<i64>,
    pub price_2pax_cents: Option<i64>,
    pub price_3pax_cents: Option<i64>,
    pub price_4pax_cents: Option<i64>,
    pub child_bucket_1_cents: Option<i64>,
    pub child_bucket_2_cents: Option<i64>,
    pub child_bucket_3_cents: Option<i64>,
    pub min_los: Option<i32>,
    pub max_los: Option<i32>,
    pub closed_checkin: bool,
    pub closed_checkout: bool,
    pub is_blocked: bool,
}

impl RateDay {
    pub fn pax_price(&self, adults: i16) -> Option<i64> {
        match adults {
            1 => self.price_1pax_cents,
            2 => self.price_2pax_cents,
            3 => self.price_3pax_cents,
            4 => self.price_4pax_cents,
            _ => None,
        }
    }

    pub fn child_bucket_price(&self, bucket: i16) -> Option<i64> {
        match bucket {
            1 => self.child_bucket_1_cents,
            2 => self.child_bucket_2_cents,
            3 => self.child_bucket_3_cents,
            _ => None,
        }
    }
}

/// Exactly three rows per property (`bucket_number` 1..=3), partitioning
/// ages 0..17 contiguously without gaps or overlap.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ChildAgeBucket {
    pub property_id: Uuid,
    pub bucket_number: i16,
    pub min_age: i16,
    pub max_age: i16,
}

impl ChildAgeBucket {
    pub fn contains(&self, age: i16) -> bool {
        age >= self.min_age && age <= self.max_age
    }

    /// Default three-bucket partition (0-5, 6-11, 12-17) used when a
    /// property has not configured its own buckets yet.
    pub fn defaults(property_id: Uuid) -> Vec<ChildAgeBucket> {
        vec![
            ChildAgeBucket { property_id, bucket_number: 1, min_age: 0, max_age: 5 },
            ChildAgeBucket { property_id, bucket_number: 2, min_age: 6, max_age: 11 },
            ChildAgeBucket { property_id, bucket_number: 3, min_age: 12, max_age: 17 },
        ]
    }

    /// Validates that a set of buckets fully partitions 0..17 without gaps
    /// or overlap.
    pub fn validate_partition(buckets: &[ChildAgeBucket]) -> Result<(), String> {
        if buckets.len() != 3 {
            return Err("exactly three child-age buckets are required".to_string());
        }
        let mut sorted: Vec<&ChildAgeBucket> = buckets.iter().collect();
        sorted.sort_by_key(|b| b.min_age);
        if sorted[0].min_age != 0 {
            return Err("buckets must start at age 0".to_string());
        }
        let Some(last) = sorted.last() else {
            return Err("exactly three child-age buckets are required".to_string());
        };
        if last.max_age != 17 {
            return Err("buckets must end at age 17".to_string());
        }
        for pair in sorted.windows(2) {
            if pair[0].max_age < pair[0].min_age {
                return Err("bucket min_age must not exceed max_age".to_string());
            }
            if pair[1].min_age != pair[0].max_age + 1 {
                return Err("buckets must be contiguous with no gaps or overlap".to_string());
            }
        }
        Ok(())
    }

    pub fn bucket_for_age(buckets: &[ChildAgeBucket], age: i16) -> Option<i16> {
        buckets.iter().find(|b| b.contains(age)).map(|b| b.bucket_number)
    }
}
