use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Employee;

pub async fn list_by_organization(
    pool: &PgPool,
    organization_id: Uuid,
) -> Result<Vec<Employee>, sqlx::Error> {
    sqlx::query_as::<_, Employee>(
        "SELECT * FROM employees WHERE organization_id = $1 ORDER BY name",
    )
    .bind(organization_id)
    .fetch_all(pool)
    .await
}

pub async fn find_by_id_scoped(
    pool: &PgPool,
    id: Uuid,
    organization_id: Uuid,
) -> Result<Option<Employee>, sqlx::Error> {
    sqlx::query_as::<_, Employee>(
        "SELECT * FROM employees WHERE id = $1 AND organization_id = $2",
    )
    .bind(id)
    .bind(organization_id)
    .fetch_optional(pool)
    .await
}

/// Loaded inside the sync transaction so the merge sees a locked snapshot.
pub async fn list_for_sync<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    organization_id: Uuid,
) -> Result<Vec<Employee>, sqlx::Error> {
    sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE organization_id = $1")
        .bind(organization_id)
        .fetch_all(executor)
        .await
}

pub async fn set_enabled(
    pool: &PgPool,
    id: Uuid,
    organization_id: Uuid,
    enabled: bool,
) -> Result<Employee, sqlx::Error> {
    sqlx::query_as::<_, Employee>(
        "UPDATE employees SET enabled = $3, updated_at = now()
         WHERE id = $1 AND organization_id = $2 RETURNING *",
    )
    .bind(id)
    .bind(organization_id)
    .bind(enabled)
    .fetch_one(pool)
    .await
}

pub async fn insert_from_roster<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    organization_id: Uuid,
    provider_employee_id: i64,
    name: &str,
    email: Option<&str>,
) -> Result<Employee, sqlx::Error> {
    sqlx::query_as::<_, Employee>(
        "INSERT INTO employees (organization_id, provider_employee_id, name, email, enabled, removed, last_sync_at)
         VALUES ($1, $2, $3, $4, false, false, now()) RETURNING *",
    )
    .bind(organization_id)
    .bind(provider_employee_id)
    .bind(name)
    .bind(email)
    .fetch_one(executor)
    .await
}

/// Refresh cached provider fields and clear removal. Never touches `enabled`.
pub async fn refresh_from_roster<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    organization_id: Uuid,
    provider_employee_id: i64,
    name: &str,
    email: Option<&str>,
) -> Result<Employee, sqlx::Error> {
    sqlx::query_as::<_, Employee>(
        "UPDATE employees SET name = $3, email = $4, removed = false,
             last_sync_at = now(), updated_at = now()
         WHERE organization_id = $1 AND provider_employee_id = $2 RETURNING *",
    )
    .bind(organization_id)
    .bind(provider_employee_id)
    .bind(name)
    .bind(email)
    .fetch_one(executor)
    .await
}

/// Removal always forces the booking preference off.
pub async fn mark_removed<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    organization_id: Uuid,
    provider_employee_id: i64,
) -> Result<Employee, sqlx::Error> {
    sqlx::query_as::<_, Employee>(
        "UPDATE employees SET removed = true, enabled = false,
             last_sync_at = now(), updated_at = now()
         WHERE organization_id = $1 AND provider_employee_id = $2 RETURNING *",
    )
    .bind(organization_id)
    .bind(provider_employee_id)
    .fetch_one(executor)
    .await
}
