//! Bearer-token session extraction.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::domain::models::Identity;
use crate::domain::{SessionController, TrackerError, TrackerResult};
use crate::storage::Connection;
use crate::AppState;

/// The session behind the request's `Authorization: Bearer <token>` header
pub struct AuthSession {
    pub token: String,
    pub controller: SessionController,
}

impl AuthSession {
    pub fn require_admin(&self) -> TrackerResult<&Identity> {
        self.controller.require_admin()
    }

    pub fn require_parent(&self) -> TrackerResult<&Identity> {
        self.controller.require_parent()
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[async_trait]
impl<C: Connection> FromRequestParts<AppState<C>> for AuthSession {
    type Rejection = TrackerError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState<C>) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(TrackerError::Unauthorized)?.to_string();
        let controller = state.sessions.get(&token).await?;
        Ok(Self { token, controller })
    }
}
