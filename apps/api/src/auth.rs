//! Bearer-token authentication against the hosted auth provider.

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::user::AuthUser;
use crate::state::AppState;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token rejected")]
    Rejected,

    #[error("auth provider unreachable: {0}")]
    Unreachable(#[from] reqwest::Error),

    #[error("auth provider returned status {0}")]
    Provider(u16),
}

/// Resolves a bearer token to the user it belongs to.
#[async_trait]
pub trait AuthVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<AuthUser, AuthError>;
}

/// Asks the hosted auth service who owns the token (`GET /auth/v1/user`).
#[derive(Clone)]
pub struct SupabaseAuth {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseAuth {
    pub fn new(client: Client, base_url: &str, anon_key: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProviderUser {
    id: Uuid,
    email: Option<String>,
}

#[async_trait]
impl AuthVerifier for SupabaseAuth {
    async fn verify(&self, token: &str) -> Result<AuthUser, AuthError> {
        let response = self
            .client
            .get(format!("{}/auth/v1/user", self.base_url))
            .bearer_auth(token)
            .header("apikey", &self.anon_key)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {
                let user: ProviderUser = response.json().await?;
                Ok(AuthUser {
                    id: user.id,
                    email: user.email,
                })
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(AuthError::Rejected),
            status => Err(AuthError::Provider(status.as_u16())),
        }
    }
}

/// An authenticated caller, with the raw token kept for delegated backend calls.
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub user: AuthUser,
    pub token: String,
}

/// Pulls the token out of `Authorization: Bearer <token>`.
///
/// A missing header means the caller never tried to authenticate; anything
/// else that is not a usable bearer token is invalid authentication.
pub fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let value = parts
        .headers
        .get(header::AUTHORIZATION)
        .ok_or(AppError::AuthenticationRequired)?;
    let value = value.to_str().map_err(|_| AppError::InvalidAuthentication)?;
    match value.strip_prefix("Bearer ").map(str::trim) {
        Some(token) if !token.is_empty() => Ok(token),
        _ => Err(AppError::InvalidAuthentication),
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Authenticated {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let token = bearer_token(parts)?.to_string();

        let user = state.auth.verify(&token).await.map_err(|e| {
            debug!(error = %e, "Token verification failed");
            match e {
                AuthError::Unreachable(inner) => AppError::Network(inner.to_string()),
                AuthError::Rejected | AuthError::Provider(_) => AppError::InvalidAuthentication,
            }
        })?;

        debug!(user_id = %user.id, "User authenticated");
        Ok(Self { user, token })
    }
}
