//! # REST API for School Notifications

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use tracing::info;

use crate::domain::commands::notifications::PostNotificationCommand;
use crate::domain::TrackerResult;
use crate::io::rest::auth_session::AuthSession;
use crate::io::rest::mappers::NotificationMapper;
use crate::storage::Connection;
use crate::AppState;
use shared::{HistoryQuery, NotificationListResponse, NotificationResponse, PostNotificationRequest};

pub async fn post_notification<C: Connection>(
    State(state): State<AppState<C>>,
    Path(school): Path<String>,
    session: AuthSession,
    Json(request): Json<PostNotificationRequest>,
) -> TrackerResult<(StatusCode, Json<NotificationResponse>)> {
    session.require_admin()?;
    info!("POST /api/schools/{}/notifications", school);

    let notification = state
        .notification_service
        .post(PostNotificationCommand {
            school: school.clone(),
            message: request.message,
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(NotificationMapper::to_post_response(notification, &school)),
    ))
}

pub async fn list_notifications<C: Connection>(
    State(state): State<AppState<C>>,
    Path(school): Path<String>,
    Query(query): Query<HistoryQuery>,
    session: AuthSession,
) -> TrackerResult<Json<NotificationListResponse>> {
    session.require_admin()?;

    let notifications = state.notification_service.history(&school, query.limit).await?;
    Ok(Json(NotificationMapper::to_list_response(school, notifications)))
}

pub fn router<C: Connection>() -> Router<AppState<C>> {
    Router::new().route(
        "/schools/:school/notifications",
        get(list_notifications::<C>).post(post_notification::<C>),
    )
}
