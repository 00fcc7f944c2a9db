use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::availability::{free_slots, Slot};
use crate::db;
use crate::error::AppError;
use crate::middleware::audit;
use crate::models::Employee;
use crate::providers::{ProviderClient, ProviderContext, ProviderKind};
use crate::state::SharedState;
use crate::sync;
use crate::sync::SyncedEmployee;

#[derive(Serialize)]
pub struct EmployeeList {
    pub employees: Vec<Employee>,
}

#[derive(Serialize)]
pub struct SyncResponse {
    pub employees: Vec<SyncedEmployee>,
    pub synced_at: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct SetEnabled {
    pub enabled: bool,
}

#[derive(Serialize)]
pub struct ToggleResponse {
    pub success: bool,
    pub employee_id: Uuid,
    pub enabled: bool,
}

#[derive(Deserialize)]
pub struct AvailabilityQuery {
    pub date: NaiveDate,
}

#[derive(Serialize)]
pub struct AvailabilityResponse {
    pub date: NaiveDate,
    pub slots: Vec<Slot>,
}

/// Resolve the organization's provider connection into a ready-to-call
/// client and decrypted context. A missing or misconfigured connection
/// is a client-visible invalid state, not an integration failure.
pub(super) async fn load_provider(
    state: &SharedState,
    organization_id: Uuid,
) -> Result<(Arc<dyn ProviderClient>, ProviderContext), AppError> {
    let conn = db::provider_connections::find_by_organization(&state.pool, organization_id)
        .await?
        .ok_or_else(|| AppError::BadRequest("No provider connected".to_string()))?;

    let kind = ProviderKind::parse(&conn.provider).ok_or_else(|| {
        AppError::BadRequest(format!("Stored provider tag is unknown: {}", conn.provider))
    })?;

    let client = state
        .providers
        .get(kind)
        .cloned()
        .ok_or_else(|| AppError::Internal(format!("Provider {} not registered", kind.as_str())))?;

    let cx = super::provider::decrypt_context(state, &conn)?;
    Ok((client, cx))
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<EmployeeList>, AppError> {
    let employees =
        db::employees::list_by_organization(&state.pool, auth.organization_id()).await?;
    Ok(Json(EmployeeList { employees }))
}

/// Pull the provider roster and merge it into local records. The fetch
/// happens entirely before the merge, so a provider failure leaves local
/// state untouched.
pub async fn sync(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<SyncResponse>, AppError> {
    let (client, cx) = load_provider(&state, auth.organization_id()).await?;

    let fetch = client.fetch_employees(&cx).await?;

    if let Some(rotated) = &fetch.rotated {
        super::provider::persist_rotated_tokens(&state, auth.organization_id(), rotated).await?;
    }

    let outcome = sync::run(&state.pool, auth.organization_id(), &fetch.employees).await?;

    let added = outcome.employees.iter().filter(|e| e.was_just_added).count();
    let removed = outcome
        .employees
        .iter()
        .filter(|e| e.was_just_removed)
        .count();
    audit::log_event(
        &state.pool,
        auth.organization_id(),
        Some(auth.user_id),
        "employees.synced",
        "organization",
        Some(auth.organization_id()),
        Some(serde_json::json!({
            "roster_size": fetch.employees.len(),
            "added": added,
            "removed": removed,
        })),
    )
    .await;

    Ok(Json(SyncResponse {
        employees: outcome.employees,
        synced_at: outcome.synced_at,
    }))
}

pub async fn set_enabled(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SetEnabled>,
) -> Result<Json<ToggleResponse>, AppError> {
    let employee = db::employees::find_by_id_scoped(&state.pool, id, auth.organization_id())
        .await?
        .ok_or_else(|| AppError::NotFound("Employee not found".to_string()))?;

    // Removed employees can never be enabled for booking.
    if req.enabled && employee.removed {
        return Err(AppError::Conflict(
            "Employee is no longer in the provider roster and cannot be enabled".to_string(),
        ));
    }

    let updated =
        db::employees::set_enabled(&state.pool, id, auth.organization_id(), req.enabled).await?;

    audit::log_event(
        &state.pool,
        auth.organization_id(),
        Some(auth.user_id),
        "employee.enabled_toggled",
        "employee",
        Some(id),
        Some(serde_json::json!({ "enabled": req.enabled })),
    )
    .await;

    Ok(Json(ToggleResponse {
        success: true,
        employee_id: updated.id,
        enabled: updated.enabled,
    }))
}

pub async fn availability(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    let employee = db::employees::find_by_id_scoped(&state.pool, id, auth.organization_id())
        .await?
        .ok_or_else(|| AppError::NotFound("Employee not found".to_string()))?;

    if employee.removed || !employee.enabled {
        return Err(AppError::Conflict(
            "Employee is not bookable".to_string(),
        ));
    }

    let organization = db::organizations::find_by_id(&state.pool, auth.organization_id())
        .await?
        .ok_or_else(|| AppError::NotFound("Organization not found".to_string()))?;

    let day_start = query.date.and_time(organization.opens_at).and_utc();
    let day_end = query.date.and_time(organization.closes_at).and_utc();
    let busy: Vec<(DateTime<Utc>, DateTime<Utc>)> =
        db::bookings::list_for_employee_between(&state.pool, employee.id, day_start, day_end)
            .await?
            .into_iter()
            .map(|b| (b.starts_at, b.ends_at))
            .collect();

    let slots = free_slots(
        query.date,
        organization.opens_at,
        organization.closes_at,
        organization.slot_minutes,
        &busy,
    );

    Ok(Json(AvailabilityResponse {
        date: query.date,
        slots,
    }))
}
