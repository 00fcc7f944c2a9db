use chrono::NaiveTime;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Organization;

pub async fn create<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    name: &str,
    slug: &str,
) -> Result<Organization, sqlx::Error> {
    sqlx::query_as::<_, Organization>(
        "INSERT INTO organizations (name, slug) VALUES ($1, $2) RETURNING *",
    )
    .bind(name)
    .bind(slug)
    .fetch_one(executor)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Organization>, sqlx::Error> {
    sqlx::query_as::<_, Organization>("SELECT * FROM organizations WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    name: &str,
    slug: &str,
) -> Result<Organization, sqlx::Error> {
    sqlx::query_as::<_, Organization>(
        "UPDATE organizations SET name = $2, slug = $3, updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(name)
    .bind(slug)
    .fetch_one(pool)
    .await
}

pub async fn update_booking_hours(
    pool: &PgPool,
    id: Uuid,
    opens_at: NaiveTime,
    closes_at: NaiveTime,
    slot_minutes: i32,
) -> Result<Organization, sqlx::Error> {
    sqlx::query_as::<_, Organization>(
        "UPDATE organizations SET opens_at = $2, closes_at = $3, slot_minutes = $4, updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(opens_at)
    .bind(closes_at)
    .bind(slot_minutes)
    .fetch_one(pool)
    .await
}
