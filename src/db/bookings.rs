use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Booking;

pub async fn create(
    pool: &PgPool,
    organization_id: Uuid,
    employee_id: Uuid,
    customer_name: &str,
    customer_email: &str,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
) -> Result<Booking, sqlx::Error> {
    sqlx::query_as::<_, Booking>(
        "INSERT INTO bookings (organization_id, employee_id, customer_name, customer_email, starts_at, ends_at)
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
    )
    .bind(organization_id)
    .bind(employee_id)
    .bind(customer_name)
    .bind(customer_email)
    .bind(starts_at)
    .bind(ends_at)
    .fetch_one(pool)
    .await
}

pub async fn list_by_organization(
    pool: &PgPool,
    organization_id: Uuid,
) -> Result<Vec<Booking>, sqlx::Error> {
    sqlx::query_as::<_, Booking>(
        "SELECT * FROM bookings WHERE organization_id = $1 ORDER BY starts_at",
    )
    .bind(organization_id)
    .fetch_all(pool)
    .await
}

pub async fn list_for_employee_between(
    pool: &PgPool,
    employee_id: Uuid,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Vec<Booking>, sqlx::Error> {
    sqlx::query_as::<_, Booking>(
        "SELECT * FROM bookings
         WHERE employee_id = $1 AND starts_at < $3 AND ends_at > $2
         ORDER BY starts_at",
    )
    .bind(employee_id)
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await
}

pub async fn overlap_exists(
    pool: &PgPool,
    employee_id: Uuid,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
) -> Result<bool, sqlx::Error> {
    let row: (bool,) = sqlx::query_as(
        "SELECT EXISTS (
             SELECT 1 FROM bookings
             WHERE employee_id = $1 AND starts_at < $3 AND ends_at > $2
         )",
    )
    .bind(employee_id)
    .bind(starts_at)
    .bind(ends_at)
    .fetch_one(pool)
    .await?;
    Ok(row.0)
}
