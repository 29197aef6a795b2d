//! # REST API for Login Sessions

use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use tracing::info;

use crate::domain::{TrackerError, TrackerResult};
use crate::io::rest::auth_session::AuthSession;
use crate::io::rest::mappers::SessionMapper;
use crate::storage::Connection;
use crate::AppState;
use shared::{LoginRequest, LoginResponse, LogoutResponse, SessionResponse};

/// Log in as an admin or a parent and receive a bearer token
pub async fn login<C: Connection>(
    State(state): State<AppState<C>>,
    Json(request): Json<LoginRequest>,
) -> TrackerResult<Json<LoginResponse>> {
    info!("POST /api/login - user: {}", request.username);

    let (token, identity) = state
        .sessions
        .login(&state.credential_service, &request.username, &request.password)
        .await?;
    Ok(Json(SessionMapper::to_login_response(token, &identity)))
}

pub async fn logout<C: Connection>(
    State(state): State<AppState<C>>,
    session: AuthSession,
) -> TrackerResult<Json<LogoutResponse>> {
    info!("POST /api/logout");

    let identity = state.sessions.logout(&session.token).await?;
    Ok(Json(LogoutResponse {
        success_message: format!("Goodbye, {}", identity.username()),
    }))
}

/// Who the current token belongs to
pub async fn current_session(session: AuthSession) -> TrackerResult<Json<SessionResponse>> {
    let identity = session.controller.identity().ok_or(TrackerError::Unauthorized)?;
    Ok(Json(SessionMapper::to_session_response(identity)))
}

pub fn router<C: Connection>() -> Router<AppState<C>> {
    Router::new()
        .route("/login", post(login::<C>))
        .route("/logout", post(logout::<C>))
        .route("/session", get(current_session))
}
