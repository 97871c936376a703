use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::ari::RateDay;

pub async fn get_range(
    pool: &PgPool,
    property_id: Uuid,
    room_type_id: Option<Uuid>,
    start: NaiveDate,
    end_exclusive: NaiveDate,
) -> Result<Vec<RateDay>, sqlx::Error> {
    sqlx::query_as::<_, RateDay>(
        "SELECT property_id, room_type_id, date,
                price_1pax_cents, price_2pax_cents, price_3pax_cents, price_4pax_cents,
                child_bucket_1_cents, child_bucket_2_cents, child_bucket_3_cents,
                min_los, max_los, closed_checkin, closed_checkout, is_blocked
         FROM rate_days
         WHERE property_id = $1
           AND ($2::uuid IS NULL OR room_type_id = $2)
           AND date >= $3 AND date < $4
         ORDER BY room_type_id, date",
    )
    .bind(property_id)
    .bind(room_type_id)
    .bind(start)
    .bind(end_exclusive)
    .fetch_all(pool)
    .await
}

pub async fn get_day(
    pool: &PgPool,
    property_id: Uuid,
    room_type_id: Uuid,
    date: NaiveDate,
) -> Result<Option<RateDay>, sqlx::Error> {
    sqlx::query_as::<_, RateDay>(
        "SELECT property_id, room_type_id, date,
                price_1pax_cents, price_2pax_cents, price_3pax_cents, price_4pax_cents,
                child_bucket_1_cents, child_bucket_2_cents, child_bucket_3_cents,
                min_los, max_los, closed_checkin, closed_checkout, is_blocked
         FROM rate_days
         WHERE property_id = $1 AND room_type_id = $2 AND date = $3",
    )
    .bind(property_id)
    .bind(room_type_id)
    .bind(date)
    .fetch_optional(pool)
    .await
}

/// Upserts one rate day. Used by `PUT /rates`, which accepts up to 366
/// rows per call.
pub async fn upsert(pool: &PgPool, rate: &RateDay) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO rate_days (
            property_id, room_type_id, date,
            price_1pax_cents, price_2pax_cents, price_3pax_cents, price_4pax_cents,
            child_bucket_1_cents, child_bucket_2_cents, child_bucket_3_cents,
            min_los, max_los, closed_checkin, closed_checkout, is_blocked
         )
         VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15)
         ON CONFLICT (property_id, room_type_id, date) DO UPDATE SET
            price_1pax_cents = EXCLUDED.price_1pax_cents,
            price_2pax_cents = EXCLUDED.price_2pax_cents,
            price_3pax_cents = EXCLUDED.price_3pax_cents,
            price_4pax_cents = EXCLUDED.price_4pax_cents,
            child_bucket_1_cents = EXCLUDED.child_bucket_1_cents,
            child_bucket_2_cents = EXCLUDED.child_bucket_2_cents,
            child_bucket_3_cents = EXCLUDED.child_bucket_3_cents,
            min_los = EXCLUDED.min_los,
            max_los = EXCLUDED.max_los,
            closed_checkin = EXCLUDED.closed_checkin,
            closed_checkout = EXCLUDED.closed_checkout,
            is_blocked = EXCLUDED.is_blocked",
    )
    .bind(rate.property_id)
    .bind(rate.room_type_id)
    .bind(rate.date)
    .bind(rate.price_1pax_cents)
    .bind(rate.price_2pax_cents)
    .bind(rate.price_3pax_cents)
    .bind(rate.price_4pax_cents)
    .bind(rate.child_bucket_1_cents)
    .bind(rate.child_bucket_2_cents)
    .bind(rate.child_bucket_3_cents)
    .bind(rate.min_los)
    .bind(rate.max_los)
    .bind(rate.closed_checkin)
    .bind(rate.closed_checkout)
    .bind(rate.is_blocked)
    .execute(pool)
    .await?;
    Ok(())
}
