use sqlx::PgPool;
use uuid::Uuid;

use crate::models::ari::ChildAgeBucket;

/// Returns the property's three configured buckets, or the default
/// partition if none are configured.
pub async fn get(pool: &PgPool, property_id: Uuid) -> Result<Vec<ChildAgeBucket>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ChildAgeBucket>(
        "SELECT property_id, bucket_number, min_age, max_age
         FROM child_age_buckets WHERE property_id = $1 ORDER BY bucket_number",
    )
    .bind(property_id)
    .fetch_all(pool)
    .await?;

    if rows.is_empty() {
        Ok(ChildAgeBucket::defaults(property_id))
    } else {
        Ok(rows)
    }
}

pub async fn put(pool: &PgPool, property_id: Uuid, buckets: &[ChildAgeBucket]) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM child_age_buckets WHERE property_id = $1")
        .bind(property_id)
        .execute(&mut *tx)
        .await?;
    for bucket in buckets {
        sqlx::query(
            "INSERT INTO child_age_buckets (property_id, bucket_number, min_age, max_age)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(property_id)
        .bind(bucket.bucket_number)
        .bind(bucket.min_age)
        .bind(bucket.max_age)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await
}
