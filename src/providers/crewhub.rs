use async_trait::async_trait;
use serde::Deserialize;

use super::{
    ProviderClient, ProviderContext, ProviderError, ProviderKind, RosterEmployee, RosterFetch,
    RotatedTokens,
};

/// CrewHub field-service API. Roster lives at
/// `https://{subdomain}.{domain}/api/v2/employees`, paginated; auth is a
/// bearer access token with a standard refresh-token grant on 401.
pub struct CrewHubClient {
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct EmployeesPage {
    employees: Vec<CrewHubEmployee>,
    next_page: Option<u32>,
}

#[derive(Deserialize)]
struct CrewHubEmployee {
    id: i64,
    first_name: String,
    last_name: String,
    email: Option<String>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
}

impl CrewHubClient {
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

    async fn fetch_page(
        &self,
        cx: &ProviderContext,
        access_token: &str,
        page: u32,
    ) -> Result<reqwest::Response, ProviderError> {
        self.client
            .get(format!("{}/api/v2/employees", Self::base_url(cx)))
            .query(&[("page", page)])
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(format!("employees request failed: {e}")))
    }

    async fn refresh_tokens(&self, cx: &ProviderContext) -> Result<RotatedTokens, ProviderError> {
        let resp = self
            .client
            .post(format!("https://auth.{}/oauth/token", cx.domain))
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", cx.refresh_token.as_str()),
            ])
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
impl ProviderClient for CrewHubClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::CrewHub
    }

    fn name(&self) -> &str {
        "CrewHub"
    }

    async fn fetch_employees(&self, cx: &ProviderContext) -> Result<RosterFetch, ProviderError> {
        let mut access_token = cx.access_token.clone();
        let mut rotated: Option<RotatedTokens> = None;
        let mut employees = Vec::new();
        let mut page = 1u32;

        loop {
            let mut resp = self.fetch_page(cx, &access_token, page).await?;

            // One refresh attempt per call; a second 401 is a real rejection.
            if resp.status() == reqwest::StatusCode::UNAUTHORIZED && rotated.is_none() {
                let tokens = self.refresh_tokens(cx).await?;
                access_token = tokens.access_token.clone();
                rotated = Some(tokens);
                resp = self.fetch_page(cx, &access_token, page).await?;
            }

            if resp.status() == reqwest::StatusCode::UNAUTHORIZED {
                return Err(ProviderError::Auth(
                    "access token rejected after refresh".to_string(),
                ));
            }

            if !resp.status().is_success() {
                return Err(ProviderError::Transport(format!(
                    "employees request returned status {}",
                    resp.status().as_u16()
                )));
            }

            let body: EmployeesPage = resp
                .json()
                .await
                .map_err(|e| ProviderError::InvalidResponse(format!("employees page: {e}")))?;

            employees.extend(body.employees.into_iter().map(|e| RosterEmployee {
                id: e.id,
                name: format!("{} {}", e.first_name, e.last_name).trim().to_string(),
                email: e.email.filter(|s| !s.is_empty()),
            }));

            match body.next_page {
                Some(next) => page = next,
                None => break,
            }
        }

        Ok(RosterFetch { employees, rotated })
    }
}
