use uuid::Uuid;

use crate::db::Tx;
use crate::models::guest::Guest;

/// Resolves a guest profile for `property_id`, grounded on
/// `original_source/infra/repositories/guests_repository.py::upsert_guest`:
///
/// 1. Look up by email (if provided), locking the row `FOR UPDATE`.
/// 2. If no email match, look up by phone (if provided), locking `FOR UPDATE`.
/// 3. On a match, update `full_name` and return the existing id
///    (`created = false`).
/// 4. On a miss, insert a new guest row (`created = true`).
///
/// The `FOR UPDATE` locks prevent two concurrent reservations for the
/// same contact from racing to insert duplicate guest rows; the caller
/// runs this inside a transaction.
pub async fn find_or_create(
    tx: &mut Tx<'_>,
    property_id: Uuid,
    full_name: Option<&str>,
    email: Option<&str>,
    phone: Option<&str>,
) -> Result<Option<(Guest, bool)>, sqlx::Error> {
    let Some(name) = full_name else { return Ok(None) };

    let mut found: Option<Guest> = None;

    if let Some(email) = email {
        found = sqlx::query_as::<_, Guest>(
            "SELECT id, property_id, full_name, email, phone, created_at
             FROM guests WHERE property_id = $1 AND email = $2
             FOR UPDATE",
        )
        .bind(property_id)
        .bind(email)
        .fetch_optional(&mut **tx)
        .await?;
    }

    if found.is_none() {
        if let Some(phone) = phone {
            found = sqlx::query_as::<_, Guest>(
                "SELECT id, property_id, full_name, email, phone, created_at
                 FROM guests WHERE property_id = $1 AND phone = $2
                 FOR UPDATE",
            )
            .bind(property_id)
            .bind(phone)
            .fetch_optional(&mut **tx)
            .await?;
        }
    }

    if let Some(existing) = found {
        let updated = sqlx::query_as::<_, Guest>(
            "UPDATE guests SET full_name = $1 WHERE id = $2
             RETURNING id, property_id, full_name, email, phone, created_at",
        )
        .bind(name)
        .bind(existing.id)
        .fetch_one(&mut **tx)
        .await?;
        return Ok(Some((updated, false)));
    }

    let inserted = sqlx::query_as::<_, Guest>(
        "INSERT INTO guests (property_id, full_name, email, phone)
         VALUES ($1, $2, $3, $4)
         RETURNING id, property_id, full_name, email, phone, created_at",
    )
    .bind(property_id)
    .bind(name)
    .bind(email)
    .bind(phone)
    .fetch_one(&mut **tx)
    .await?;

    Ok(Some((inserted, true)))
}

pub async fn get(pool: &sqlx::PgPool, property_id: Uuid, guest_id: Uuid) -> Result<Option<Guest>, sqlx::Error> {
    sqlx::query_as::<_, Guest>(
        "SELECT id, property_id, full_name, email, phone, created_at
         FROM guests WHERE id = $1 AND property_id = $2",
    )
    .bind(guest_id)
    .bind(property_id)
    .fetch_optional(pool)
    .await
}
