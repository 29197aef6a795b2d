use axum::{extract::State, response::Json, routing::get, Router};

use crate::domain::TrackerResult;
use crate::io::rest::auth_session::AuthSession;
use crate::io::rest::mappers::SessionMapper;
use crate::storage::Connection;
use crate::AppState;
use shared::ParentDashboardResponse;

/// The logged-in parent's children, their last payments and the school's last notices
pub async fn dashboard<C: Connection>(
    State(state): State<AppState<C>>,
    session: AuthSession,
) -> TrackerResult<Json<ParentDashboardResponse>> {
    let identity = session.require_parent()?;
    let dashboard = state.parent_service.dashboard(identity).await?;
    Ok(Json(SessionMapper::to_dashboard_response(dashboard)))
}

pub fn router<C: Connection>() -> Router<AppState<C>> {
    Router::new().route("/parent/dashboard", get(dashboard::<C>))
}
