//! HTTP translation of domain errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use tracing::error;

use crate::domain::TrackerError;
use shared::ErrorResponse;

impl TrackerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            TrackerError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            TrackerError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            TrackerError::StudentNotFound { .. } => StatusCode::NOT_FOUND,
            TrackerError::Validation(_) => StatusCode::BAD_REQUEST,
            TrackerError::ConcurrentModification { .. } => StatusCode::CONFLICT,
            TrackerError::UnknownSchool(_) => StatusCode::NOT_FOUND,
            TrackerError::Unauthorized => StatusCode::UNAUTHORIZED,
            TrackerError::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for TrackerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }
        (status, Json(ErrorResponse { error: self.to_string() })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_error_body_shape() {
        let response = TrackerError::StudentNotFound {
            school: "School A".to_string(),
            student_id: "S0042".to_string(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let error: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(error.error, "Student S0042 not found in School A");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(TrackerError::InvalidCredentials.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            TrackerError::StorageUnavailable("down".to_string()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(TrackerError::validation("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            TrackerError::ConcurrentModification { school: "A".to_string() }.status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(TrackerError::UnknownSchool("Z".to_string()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(TrackerError::Forbidden("no".to_string()).status_code(), StatusCode::FORBIDDEN);
    }
}
