use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::middleware::audit;
use crate::models::Booking;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct CreateBooking {
    pub employee_id: Uuid,
    pub customer_name: String,
    pub customer_email: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct BookingList {
    pub bookings: Vec<Booking>,
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<BookingList>, AppError> {
    let bookings = db::bookings::list_by_organization(&state.pool, auth.organization_id()).await?;
    Ok(Json(BookingList { bookings }))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<CreateBooking>,
) -> Result<Json<Booking>, AppError> {
    if req.customer_name.is_empty() || req.customer_email.is_empty() {
        return Err(AppError::BadRequest(
            "Customer name and email are required".to_string(),
        ));
    }
    if req.ends_at <= req.starts_at {
        return Err(AppError::BadRequest(
            "Booking must end after it starts".to_string(),
        ));
    }

    let employee =
        db::employees::find_by_id_scoped(&state.pool, req.employee_id, auth.organization_id())
            .await?
            .ok_or_else(|| AppError::NotFound("Employee not found".to_string()))?;

    if employee.removed || !employee.enabled {
        return Err(AppError::Conflict(
            "Employee is not enabled for bookings".to_string(),
        ));
    }

    if db::bookings::overlap_exists(&state.pool, employee.id, req.starts_at, req.ends_at).await? {
        return Err(AppError::Conflict(
            "Employee already has a booking in this time range".to_string(),
        ));
    }

    let booking = db::bookings::create(
        &state.pool,
        auth.organization_id(),
        employee.id,
        &req.customer_name,
        &req.customer_email,
        req.starts_at,
        req.ends_at,
    )
    .await?;

    audit::log_event(
        &state.pool,
        auth.organization_id(),
        Some(auth.user_id),
        "booking.created",
        "booking",
        Some(booking.id),
        None,
    )
    .await;

    Ok(Json(booking))
}
