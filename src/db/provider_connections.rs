use sqlx::PgPool;
use uuid::Uuid;

use crate::models::ProviderConnection;

pub async fn find_by_organization(
    pool: &PgPool,
    organization_id: Uuid,
) -> Result<Option<ProviderConnection>, sqlx::Error> {
    sqlx::query_as::<_, ProviderConnection>(
        "SELECT * FROM provider_connections WHERE organization_id = $1",
    )
    .bind(organization_id)
    .fetch_optional(pool)
    .await
}

pub async fn upsert(
    pool: &PgPool,
    organization_id: Uuid,
    provider: &str,
    subdomain: &str,
    domain: &str,
    access_token_enc: &[u8],
    refresh_token_enc: &[u8],
) -> Result<ProviderConnection, sqlx::Error> {
    sqlx::query_as::<_, ProviderConnection>(
        "INSERT INTO provider_connections (organization_id, provider, subdomain, domain, access_token_enc, refresh_token_enc)
         VALUES ($1, $2, $3, $4, $5, $6)
         ON CONFLICT (organization_id) DO UPDATE SET
           provider = EXCLUDED.provider,
           subdomain = EXCLUDED.subdomain,
           domain = EXCLUDED.domain,
           access_token_enc = EXCLUDED.access_token_enc,
           refresh_token_enc = EXCLUDED.refresh_token_enc,
           updated_at = now()
         RETURNING *",
    )
    .bind(organization_id)
    .bind(provider)
    .bind(subdomain)
    .bind(domain)
    .bind(access_token_enc)
    .bind(refresh_token_enc)
    .fetch_one(pool)
    .await
}

/// Persist tokens rotated by a provider refresh grant.
pub async fn update_tokens(
    pool: &PgPool,
    organization_id: Uuid,
    access_token_enc: &[u8],
    refresh_token_enc: &[u8],
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE provider_connections SET access_token_enc = $2, refresh_token_enc = $3, updated_at = now()
         WHERE organization_id = $1",
    )
    .bind(organization_id)
    .bind(access_token_enc)
    .bind(refresh_token_enc)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn delete(pool: &PgPool, organization_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM provider_connections WHERE organization_id = $1")
        .bind(organization_id)
        .execute(pool)
        .await?;
    Ok(())
}
