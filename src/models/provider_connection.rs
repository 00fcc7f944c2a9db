use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct ProviderConnection {
    pub id: Uuid,
    pub organization_id: Uuid,
    /// Provider tag, parsed into `ProviderKind` at the API boundary.
    pub provider: String,
    pub subdomain: String,
    pub domain: String,
    #[serde(skip_serializing)]
    pub access_token_enc: Vec<u8>,
    #[serde(skip_serializing)]
    pub refresh_token_enc: Vec<u8>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
