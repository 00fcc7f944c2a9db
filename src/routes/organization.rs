use axum::extract::{Path, State};
use axum::Json;
use chrono::NaiveTime;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::auth::password;
use crate::db;
use crate::error::AppError;
use crate::middleware::audit;
use crate::models::{Organization, User};
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct UpdateOrganization {
    pub name: String,
    pub slug: String,
}

#[derive(Deserialize)]
pub struct UpdateBookingHours {
    pub opens_at: NaiveTime,
    pub closes_at: NaiveTime,
    pub slot_minutes: i32,
}

#[derive(Deserialize)]
pub struct AddMember {
    pub email: String,
    pub password: String,
    pub name: String,
    pub role: Option<String>,
}

pub async fn get_organization(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<Organization>, AppError> {
    let organization = db::organizations::find_by_id(&state.pool, auth.organization_id())
        .await?
        .ok_or_else(|| AppError::NotFound("Organization not found".to_string()))?;
    Ok(Json(organization))
}

pub async fn update_organization(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<UpdateOrganization>,
) -> Result<Json<Organization>, AppError> {
    auth.require_owner()?;

    let organization =
        db::organizations::update(&state.pool, auth.organization_id(), &req.name, &req.slug)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                    AppError::Conflict("An organization with this slug already exists".to_string())
                }
                _ => AppError::Database(e),
            })?;

    audit::log_event(
        &state.pool,
        auth.organization_id(),
        Some(auth.user_id),
        "organization.updated",
        "organization",
        Some(organization.id),
        None,
    )
    .await;

    Ok(Json(organization))
}

pub async fn update_booking_hours(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<UpdateBookingHours>,
) -> Result<Json<Organization>, AppError> {
    auth.require_owner()?;

    if req.closes_at <= req.opens_at {
        return Err(AppError::BadRequest(
            "Closing time must be after opening time".to_string(),
        ));
    }
    if req.slot_minutes < 5 || req.slot_minutes > 480 {
        return Err(AppError::BadRequest(
            "Slot length must be between 5 and 480 minutes".to_string(),
        ));
    }

    let organization = db::organizations::update_booking_hours(
        &state.pool,
        auth.organization_id(),
        req.opens_at,
        req.closes_at,
        req.slot_minutes,
    )
    .await?;

    audit::log_event(
        &state.pool,
        auth.organization_id(),
        Some(auth.user_id),
        "organization.booking_hours_updated",
        "organization",
        Some(organization.id),
        None,
    )
    .await;

    Ok(Json(organization))
}

pub async fn list_members(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<Vec<User>>, AppError> {
    let members = db::users::list_by_organization(&state.pool, auth.organization_id()).await?;
    Ok(Json(members))
}

pub async fn add_member(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<AddMember>,
) -> Result<Json<User>, AppError> {
    auth.require_owner()?;

    if req.password.len() < 8 {
        return Err(AppError::BadRequest(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    let pw_hash = password::hash(&req.password).map_err(AppError::Internal)?;
    let role = req.role.as_deref().unwrap_or("member");

    if role != "owner" && role != "member" {
        return Err(AppError::BadRequest("Unknown role".to_string()));
    }

    let user = db::users::create(
        &state.pool,
        auth.organization_id(),
        &req.email,
        &pw_hash,
        &req.name,
        role,
        false,
    )
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            AppError::Conflict("A user with this email already exists".to_string())
        }
        _ => AppError::Database(e),
    })?;

    audit::log_event(
        &state.pool,
        auth.organization_id(),
        Some(auth.user_id),
        "member.added",
        "user",
        Some(user.id),
        None,
    )
    .await;

    Ok(Json(user))
}

pub async fn remove_member(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    auth.require_owner()?;

    // Verify member belongs to this organization
    let user = db::users::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if user.organization_id != auth.organization_id() {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    // Don't allow removing yourself
    if id == auth.user_id {
        return Err(AppError::BadRequest("Cannot remove yourself".to_string()));
    }

    db::users::delete(&state.pool, id).await?;

    audit::log_event(
        &state.pool,
        auth.organization_id(),
        Some(auth.user_id),
        "member.removed",
        "user",
        Some(id),
        None,
    )
    .await;

    Ok(Json(serde_json::json!({ "message": "Member removed" })))
}
