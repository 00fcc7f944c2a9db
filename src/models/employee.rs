use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A provider employee mirrored into local storage.
///
/// `enabled` is the local-only booking preference and is never written by
/// sync except when a removal forces it off. `removed` tracks absence from
/// the provider roster and is reversible; rows are never hard-deleted.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Employee {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub provider_employee_id: i64,
    pub name: String,
    pub email: Option<String>,
    pub enabled: bool,
    pub removed: bool,
    pub last_sync_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
