use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::extractor::AuthUser;
use crate::crypto;
use crate::db;
use crate::error::AppError;
use crate::middleware::audit;
use crate::providers::{ProviderContext, ProviderKind, RotatedTokens};
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct ConnectProvider {
    pub provider: String,
    pub subdomain: String,
    pub domain: String,
    pub access_token: String,
    pub refresh_token: String,
}

/// Connection status without credentials.
#[derive(Serialize)]
pub struct ConnectionStatus {
    pub provider: String,
    pub subdomain: String,
    pub domain: String,
    pub connected_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct TestResult {
    pub provider: String,
    pub employee_count: usize,
}

pub async fn get_connection(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<ConnectionStatus>, AppError> {
    let conn = db::provider_connections::find_by_organization(&state.pool, auth.organization_id())
        .await?
        .ok_or_else(|| AppError::NotFound("No provider connected".to_string()))?;

    Ok(Json(ConnectionStatus {
        provider: conn.provider,
        subdomain: conn.subdomain,
        domain: conn.domain,
        connected_at: conn.created_at,
        updated_at: conn.updated_at,
    }))
}

pub async fn connect(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<ConnectProvider>,
) -> Result<Json<ConnectionStatus>, AppError> {
    auth.require_owner()?;

    let kind = ProviderKind::parse(&req.provider)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown provider: {}", req.provider)))?;
    if state.providers.get(kind).is_none() {
        return Err(AppError::BadRequest(format!(
            "Provider {} is not available",
            req.provider
        )));
    }

    if req.subdomain.is_empty() || req.domain.is_empty() {
        return Err(AppError::BadRequest(
            "Subdomain and domain are required".to_string(),
        ));
    }
    if req.access_token.is_empty() || req.refresh_token.is_empty() {
        return Err(AppError::BadRequest(
            "Access and refresh tokens are required".to_string(),
        ));
    }

    let access_enc = crypto::encrypt(&req.access_token, &state.config.encryption_key)
        .map_err(AppError::Internal)?;
    let refresh_enc = crypto::encrypt(&req.refresh_token, &state.config.encryption_key)
        .map_err(AppError::Internal)?;

    let conn = db::provider_connections::upsert(
        &state.pool,
        auth.organization_id(),
        kind.as_str(),
        &req.subdomain,
        &req.domain,
        &access_enc,
        &refresh_enc,
    )
    .await?;

    audit::log_event(
        &state.pool,
        auth.organization_id(),
        Some(auth.user_id),
        "provider.connected",
        "provider_connection",
        Some(conn.id),
        Some(serde_json::json!({ "provider": kind.as_str() })),
    )
    .await;

    Ok(Json(ConnectionStatus {
        provider: conn.provider,
        subdomain: conn.subdomain,
        domain: conn.domain,
        connected_at: conn.created_at,
        updated_at: conn.updated_at,
    }))
}

pub async fn disconnect(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<serde_json::Value>, AppError> {
    auth.require_owner()?;

    db::provider_connections::delete(&state.pool, auth.organization_id()).await?;

    audit::log_event(
        &state.pool,
        auth.organization_id(),
        Some(auth.user_id),
        "provider.disconnected",
        "provider_connection",
        None,
        None,
    )
    .await;

    Ok(Json(serde_json::json!({ "message": "Provider disconnected" })))
}

/// Fetch the roster without touching local records, as a connectivity check.
pub async fn test_connection(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<TestResult>, AppError> {
    let (client, cx) = super::employees::load_provider(&state, auth.organization_id()).await?;

    let fetch = client.fetch_employees(&cx).await?;

    if let Some(rotated) = &fetch.rotated {
        persist_rotated_tokens(&state, auth.organization_id(), rotated).await?;
    }

    Ok(Json(TestResult {
        provider: client.name().to_string(),
        employee_count: fetch.employees.len(),
    }))
}

/// Re-encrypt and store tokens a client rotated mid-call. Losing these
/// would strand the connection on a dead refresh token.
pub async fn persist_rotated_tokens(
    state: &SharedState,
    organization_id: uuid::Uuid,
    rotated: &RotatedTokens,
) -> Result<(), AppError> {
    let access_enc = crypto::encrypt(&rotated.access_token, &state.config.encryption_key)
        .map_err(AppError::Internal)?;
    let refresh_enc = crypto::encrypt(&rotated.refresh_token, &state.config.encryption_key)
        .map_err(AppError::Internal)?;
    db::provider_connections::update_tokens(&state.pool, organization_id, &access_enc, &refresh_enc)
        .await?;
    tracing::info!(organization_id = %organization_id, "provider tokens rotated");
    Ok(())
}

pub(super) fn decrypt_context(
    state: &SharedState,
    conn: &crate::models::ProviderConnection,
) -> Result<ProviderContext, AppError> {
    let access_token = crypto::decrypt(&conn.access_token_enc, &state.config.encryption_key)
        .map_err(|e| AppError::Internal(format!("Stored access token unreadable: {e}")))?;
    let refresh_token = crypto::decrypt(&conn.refresh_token_enc, &state.config.encryption_key)
        .map_err(|e| AppError::Internal(format!("Stored refresh token unreadable: {e}")))?;

    Ok(ProviderContext {
        subdomain: conn.subdomain.clone(),
        domain: conn.domain.clone(),
        access_token,
        refresh_token,
    })
}
