//! Principal resolution
//!
//! Credential issuance and verification live in an external auth service;
//! the gateway only exchanges a bearer token for an authenticated user id
//! and attaches it to the request. The transfer handler later enforces that
//! this identity matches the declared sender.

use async_trait::async_trait;
use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::AuthConfig;

use super::state::AppState;
use super::types::{error_codes, ApiError};

/// Identity resolved from a bearer credential
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser {
    pub user_id: i64,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid token")]
    InvalidToken,

    #[error("Auth service unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait PrincipalResolver: Send + Sync {
    async fn resolve(&self, token: &str) -> Result<AuthenticatedUser, AuthError>;
}

#[derive(Deserialize)]
struct CheckResponse {
    valid: bool,
    user_id: i64,
}

/// Resolver backed by the external auth service's `GET /check` endpoint
pub struct HttpPrincipalResolver {
    client: reqwest::Client,
    url: String,
}

impl HttpPrincipalResolver {
    pub fn new(config: &AuthConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            client,
            url: format!("{}/check", config.url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl PrincipalResolver for HttpPrincipalResolver {
    async fn resolve(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let response = self
            .client
            .get(&self.url)
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .send()
            .await
            .map_err(|e| AuthError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::InvalidToken);
        }

        let body: CheckResponse = response
            .json()
            .await
            .map_err(|_| AuthError::InvalidToken)?;

        if !body.valid {
            return Err(AuthError::InvalidToken);
        }

        Ok(AuthenticatedUser {
            user_id: body.user_id,
        })
    }
}

/// Fixed-identity resolver for tests
pub struct StaticResolver {
    pub user_id: i64,
}

#[async_trait]
impl PrincipalResolver for StaticResolver {
    async fn resolve(&self, _token: &str) -> Result<AuthenticatedUser, AuthError> {
        Ok(AuthenticatedUser {
            user_id: self.user_id,
        })
    }
}

/// Middleware for routes that require an authenticated principal
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match bearer_token(&request) {
        Some(token) => token.to_string(),
        None => {
            return ApiError::new(
                axum::http::StatusCode::UNAUTHORIZED,
                error_codes::MISSING_AUTH,
                "Missing or invalid Authorization header",
            )
            .into_response();
        }
    };

    match state.auth.resolve(&token).await {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(AuthError::InvalidToken) => {
            ApiError::unauthorized("Invalid token").into_response()
        }
        Err(AuthError::Unavailable(reason)) => {
            tracing::error!(%reason, "Auth service unavailable");
            ApiError::service_unavailable("Auth service unavailable").into_response()
        }
    }
}

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_resolver_returns_fixed_identity() {
        let resolver = StaticResolver { user_id: 7 };
        let user = resolver.resolve("anything").await.expect("resolves");
        assert_eq!(user.user_id, 7);
    }

    #[test]
    fn test_check_response_shape() {
        let body: CheckResponse =
            serde_json::from_str(r#"{"valid": true, "user_id": 42}"#).unwrap();
        assert!(body.valid);
        assert_eq!(body.user_id, 42);
    }
}
