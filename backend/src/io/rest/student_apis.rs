//! # REST API for School Rosters
//!
//! Admin-only endpoints for listing schools, reading a roster and adding
//! students.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use tracing::info;

use crate::domain::TrackerResult;
use crate::io::rest::auth_session::AuthSession;
use crate::io::rest::mappers::StudentMapper;
use crate::storage::Connection;
use crate::AppState;
use shared::{CreateStudentRequest, RosterResponse, SchoolListResponse, StudentResponse};

pub async fn list_schools<C: Connection>(
    State(state): State<AppState<C>>,
    session: AuthSession,
) -> TrackerResult<Json<SchoolListResponse>> {
    session.require_admin()?;
    Ok(Json(SchoolListResponse {
        schools: state.roster_service.schools().names().to_vec(),
    }))
}

pub async fn list_students<C: Connection>(
    State(state): State<AppState<C>>,
    Path(school): Path<String>,
    session: AuthSession,
) -> TrackerResult<Json<RosterResponse>> {
    session.require_admin()?;
    info!("GET /api/schools/{}/students", school);

    let roster = state.roster_service.list_roster(&school).await?;
    Ok(Json(StudentMapper::to_roster_response(roster)))
}

pub async fn add_student<C: Connection>(
    State(state): State<AppState<C>>,
    Path(school): Path<String>,
    session: AuthSession,
    Json(request): Json<CreateStudentRequest>,
) -> TrackerResult<(StatusCode, Json<StudentResponse>)> {
    session.require_admin()?;
    info!("POST /api/schools/{}/students - name: {}", school, request.name);

    let student = state
        .roster_service
        .add_student(StudentMapper::to_add_command(school, request))
        .await?;
    Ok((StatusCode::CREATED, Json(StudentMapper::to_student_response(student))))
}

pub fn router<C: Connection>() -> Router<AppState<C>> {
    Router::new()
        .route("/schools", get(list_schools::<C>))
        .route(
            "/schools/:school/students",
            get(list_students::<C>).post(add_student::<C>),
        )
}
