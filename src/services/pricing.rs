use chrono::NaiveDate;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::repository::{ari, child_buckets, rates};

/// Priced outcome of a date range for one room type. `Unavailable` covers
/// every reason a quote cannot be produced — missing ARI row, zero
/// availability, currency mismatch, missing rate — without distinguishing
/// them to the caller, matching `domain/quote.py::quote_minimum`'s single
/// `None` return.
#[derive(Debug, Clone, Serialize)]
pub struct Quote {
    pub property_id: Uuid,
    pub room_type_id: Uuid,
    pub checkin: NaiveDate,
    pub checkout: NaiveDate,
    pub nights: i64,
    pub total_cents: i64,
    pub currency: String,
}

/// Synchronous input validation for [`quote_minimum`], split out so it is
/// unit-testable without a pool.
fn validate_pax_request(
    checkin: NaiveDate,
    checkout: NaiveDate,
    adult_count: i16,
    children_ages: &[i16],
) -> AppResult<()> {
    if checkin >= checkout {
        return Err(AppError::BadRequest("checkin must be before checkout".to_string()));
    }
    if !(1..=4).contains(&adult_count) {
        return Err(AppError::BadRequest("adult_count must be between 1 and 4".to_string()));
    }
    if children_ages.len() > 3 {
        return Err(AppError::BadRequest("children_ages must have at most 3 entries".to_string()));
    }
    for age in children_ages {
        if !(0..=17).contains(age) {
            return Err(AppError::BadRequest("children_ages entries must be between 0 and 17".to_string()));
        }
    }
    Ok(())
}

/// Computes the minimum quote for `[checkin, checkout)` against ARI and
/// the PAX rate matrix, falling back to `ari_days.base_rate_cents` when a
/// night has no PAX rate configured.
///
/// Returns `Ok(None)` for any night that is unavailable, currency-
/// mismatched, or has no resolvable price — the caller maps that to the
/// `Unavailable` outbox/quote outcome rather than an error.
pub async fn quote_minimum(
    pool: &PgPool,
    property_id: Uuid,
    room_type_id: Uuid,
    checkin: NaiveDate,
    checkout: NaiveDate,
    adult_count: i16,
    children_ages: &[i16],
    expected_currency: &str,
) -> AppResult<Option<Quote>> {
    validate_pax_request(checkin, checkout, adult_count, children_ages)?;

    let buckets = child_buckets::get(pool, property_id).await?;
    let ari_days = ari::get_range(pool, property_id, room_type_id, checkin, checkout).await?;
    let rate_days = rates::get_range(pool, property_id, Some(room_type_id), checkin, checkout).await?;

    let mut total_cents: i64 = 0;
    let mut current = checkin;
    let nights = (checkout - checkin).num_days();

    while current < checkout {
        let Some(ari_day) = ari_days.iter().find(|d| d.date == current) else {
            return Ok(None);
        };

        if ari_day.available() < 1 {
            return Ok(None);
        }

        if ari_day.currency != expected_currency {
            return Ok(None);
        }

        let rate_day = rate_days.iter().find(|d| d.date == current);

        let nightly = match rate_day.and_then(|r| r.pax_price(adult_count)) {
            Some(pax_price) => {
                let mut child_add: i64 = 0;
                for age in children_ages {
                    let Some(bucket) = crate::models::ari::ChildAgeBucket::bucket_for_age(&buckets, *age) else {
                        return Ok(None);
                    };
                    let Some(surcharge) = rate_day.and_then(|r| r.child_bucket_price(bucket)) else {
                        return Ok(None);
                    };
                    child_add += surcharge;
                }
                pax_price + child_add
            }
            None => match ari_day.base_rate_cents {
                Some(base) => base,
                None => return Ok(None),
            },
        };

        total_cents += nightly;
        current += chrono::Duration::days(1);
    }

    Ok(Some(Quote {
        property_id,
        room_type_id,
        checkin,
        checkout,
        nights,
        total_cents,
        currency: ari_days.first().map(|d| d.currency.clone()).unwrap_or_default(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn rejects_inverted_date_range() {
        let err = validate_pax_request(date(2026, 3, 10), date(2026, 3, 9), 2, &[]).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn rejects_zero_adults() {
        let err = validate_pax_request(date(2026, 3, 10), date(2026, 3, 12), 0, &[]).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn rejects_more_than_four_adults() {
        let err = validate_pax_request(date(2026, 3, 10), date(2026, 3, 12), 5, &[]).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn rejects_more_than_three_children() {
        let err =
            validate_pax_request(date(2026, 3, 10), date(2026, 3, 12), 2, &[3, 5, 7, 9]).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn accepts_well_formed_request() {
        assert!(validate_pax_request(date(2026, 3, 10), date(2026, 3, 12), 2, &[5, 9]).is_ok());
    }
}
