use axum::extract::{FromRequestParts, Query};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use serde::Deserialize;
use std::convert::Infallible;

/// Bearer token of a scorer, read from the `Authorization` header
/// or the `token` query parameter (browsers cannot set headers on websockets)
pub struct ScorerToken(pub Option<String>);

#[derive(Deserialize)]
struct TokenArgs {
    token: Option<String>,
}

impl ScorerToken {
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

fn get_token(parts: &Parts) -> Option<String> {
    if let Some(header) = parts.headers.get(AUTHORIZATION) {
        let value = header.to_str().ok()?;
        let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();
        return (!token.is_empty()).then(|| token.to_string());
    }
    Query::<TokenArgs>::try_from_uri(&parts.uri)
        .ok()
        .and_then(|Query(args)| args.token)
        .filter(|token| !token.is_empty())
}

impl<S: Sync + Send> FromRequestParts<S> for ScorerToken {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(get_token(parts)))
    }
}
