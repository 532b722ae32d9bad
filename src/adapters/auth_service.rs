use crate::common::error::{AppError, ServiceResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::warn;

static CLIENT: LazyLock<reqwest::Client> = LazyLock::new(reqwest::Client::new);

/// Decides whether a scorer may submit events for a match
#[async_trait]
pub trait ScorerAuthorizer: Send + Sync {
    async fn authorize(&self, token: Option<&str>, match_id: &str) -> ServiceResult<()>;
}

#[derive(Serialize)]
struct AuthorizeRequest<'a> {
    token: &'a str,
    match_id: &'a str,
}

#[derive(Deserialize)]
struct AuthorizeResponse {
    authorized: bool,
}

/// Delegates the decision to the external session service
pub struct AuthService {
    base_url: String,
}

impl AuthService {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn make_url(&self, endpoint: &str) -> String {
        format!("{}{endpoint}", self.base_url)
    }
}

#[async_trait]
impl ScorerAuthorizer for AuthService {
    async fn authorize(&self, token: Option<&str>, match_id: &str) -> ServiceResult<()> {
        let token = token.ok_or(AppError::Unauthorized)?;
        let url = self.make_url("/api/v1/authorize");
        let response = CLIENT
            .post(url)
            .json(&AuthorizeRequest { token, match_id })
            .send()
            .await?;
        if !response.status().is_success() {
            warn!(match_id, status = %response.status(), "Scorer authorization rejected");
            return Err(AppError::Unauthorized);
        }
        let result: AuthorizeResponse = response.json().await?;
        match result.authorized {
            true => Ok(()),
            false => Err(AppError::Unauthorized),
        }
    }
}

/// Accepts every scorer, used when no session service is configured
pub struct AllowAllScorers;

#[async_trait]
impl ScorerAuthorizer for AllowAllScorers {
    async fn authorize(&self, _token: Option<&str>, _match_id: &str) -> ServiceResult<()> {
        Ok(())
    }
}
