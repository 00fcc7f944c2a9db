use async_trait::async_trait;
use serde::Deserialize;

use super::{
    ProviderClient, ProviderContext, ProviderError, ProviderKind, RosterEmployee, RosterFetch,
    RotatedTokens,
};

/// FieldLine dispatch platform. Unpaginated technician roster at
/// `https://{subdomain}.{domain}/v1/technicians`; refresh grant on the
/// same host.
pub struct FieldLineClient {
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct TechniciansResponse {
    technicians: Vec<Technician>,
}

#[derive(Deserialize)]
struct Technician {
    id: i64,
    display_name: String,
    contact_email: Option<String>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
}

impl FieldLineClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to build reqwest client"),
        }
    }

    fn base_url(cx: &ProviderContext) -> String {
        format!("https://{}.{}", cx.subdomain, cx.domain)
    }

    async fn fetch_roster(
        &self,
        cx: &ProviderContext,
        access_token: &str,
    ) -> Result<reqwest::Response, ProviderError> {
        self.client
            .get(format!("{}/v1/technicians", Self::base_url(cx)))
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(format!("technicians request failed: {e}")))
    }

    async fn refresh_tokens(&self, cx: &ProviderContext) -> Result<RotatedTokens, ProviderError> {
        let resp = self
            .client
            .post(format!("{}/v1/oauth/refresh", Self::base_url(cx)))
            .json(&serde_json::json!({ "refresh_token": cx.refresh_token }))
            .send()
            .await
            .map_err(|e| ProviderError::Transport(format!("token refresh failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(ProviderError::Auth(format!(
                "token refresh rejected with status {}",
                resp.status().as_u16()
            )));
        }

        let tokens: TokenResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("token response: {e}")))?;

        Ok(RotatedTokens {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        })
    }
}

#[async_trait]
impl ProviderClient for FieldLineClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::FieldLine
    }

    fn name(&self) -> &str {
        "FieldLine"
    }

    async fn fetch_employees(&self, cx: &ProviderContext) -> Result<RosterFetch, ProviderError> {
        let mut resp = self.fetch_roster(cx, &cx.access_token).await?;
        let mut rotated = None;

        if resp.status() == reqwest::StatusCode::UNAUTHORIZED {
            let tokens = self.refresh_tokens(cx).await?;
            resp = self.fetch_roster(cx, &tokens.access_token).await?;
            rotated = Some(tokens);
        }

        if resp.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ProviderError::Auth(
                "access token rejected after refresh".to_string(),
            ));
        }

        if !resp.status().is_success() {
            return Err(ProviderError::Transport(format!(
                "technicians request returned status {}",
                resp.status().as_u16()
            )));
        }

        let body: TechniciansResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("technicians payload: {e}")))?;

        let employees = body
            .technicians
            .into_iter()
            .map(|t| RosterEmployee {
                id: t.id,
                name: t.display_name,
                email: t.contact_email.filter(|s| !s.is_empty()),
            })
            .collect();

        Ok(RosterFetch { employees, rotated })
    }
}
