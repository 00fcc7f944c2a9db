pub mod crewhub;
pub mod fieldline;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One employee as reported by a provider roster endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEmployee {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
}

/// Per-organization connection details handed to a client for one call.
/// Tokens arrive decrypted; the client never touches storage.
#[derive(Debug, Clone)]
pub struct ProviderContext {
    pub subdomain: String,
    pub domain: String,
    pub access_token: String,
    pub refresh_token: String,
}

/// Token pair returned by a refresh grant. The caller persists it.
#[derive(Debug, Clone)]
pub struct RotatedTokens {
    pub access_token: String,
    pub refresh_token: String,
}

/// Result of a roster fetch: the complete current roster (never a delta),
/// plus rotated tokens if the client had to refresh mid-call.
#[derive(Debug)]
pub struct RosterFetch {
    pub employees: Vec<RosterEmployee>,
    pub rotated: Option<RotatedTokens>,
}

#[derive(Debug)]
pub enum ProviderError {
    /// Credentials rejected, including a failed refresh grant.
    Auth(String),
    /// Network failure, timeout, or a non-auth error status.
    Transport(String),
    /// Payload did not match the provider's documented shape.
    InvalidResponse(String),
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderError::Auth(msg) => write!(f, "provider auth failed: {msg}"),
            ProviderError::Transport(msg) => write!(f, "provider request failed: {msg}"),
            ProviderError::InvalidResponse(msg) => write!(f, "provider response invalid: {msg}"),
        }
    }
}

/// Supported provider tags. Parsed once from the stored connection row;
/// everything below the API boundary works with the enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    CrewHub,
    FieldLine,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::CrewHub => "crewhub",
            ProviderKind::FieldLine => "fieldline",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "crewhub" => Some(ProviderKind::CrewHub),
            "fieldline" => Some(ProviderKind::FieldLine),
            _ => None,
        }
    }
}

/// The one capability the reconciliation core needs from a provider.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    fn kind(&self) -> ProviderKind;
    fn name(&self) -> &str;
    async fn fetch_employees(&self, cx: &ProviderContext) -> Result<RosterFetch, ProviderError>;
}

pub struct ProviderRegistry {
    providers: HashMap<ProviderKind, Arc<dyn ProviderClient>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
        }
    }

    pub fn register(&mut self, provider: Arc<dyn ProviderClient>) {
        self.providers.insert(provider.kind(), provider);
    }

    pub fn get(&self, kind: ProviderKind) -> Option<&Arc<dyn ProviderClient>> {
        self.providers.get(&kind)
    }

    pub fn list(&self) -> Vec<&Arc<dyn ProviderClient>> {
        self.providers.values().collect()
    }
}
