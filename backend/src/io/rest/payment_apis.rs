//! # REST API for Fee Payments

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use tracing::info;

use crate::domain::TrackerResult;
use crate::io::rest::auth_session::AuthSession;
use crate::io::rest::mappers::LedgerMapper;
use crate::storage::Connection;
use crate::AppState;
use shared::{HistoryQuery, PaymentListResponse, RecordPaymentRequest, RecordPaymentResponse};

/// Apply a payment to a student's balance and log it
pub async fn record_payment<C: Connection>(
    State(state): State<AppState<C>>,
    Path(school): Path<String>,
    session: AuthSession,
    Json(request): Json<RecordPaymentRequest>,
) -> TrackerResult<(StatusCode, Json<RecordPaymentResponse>)> {
    session.require_admin()?;
    info!(
        "POST /api/schools/{}/payments - student: {}, amount: {}",
        school, request.student_id, request.amount
    );

    let result = state
        .ledger_service
        .record_payment(LedgerMapper::to_command(school, request))
        .await?;
    Ok((StatusCode::CREATED, Json(LedgerMapper::to_record_response(result))))
}

pub async fn list_payments<C: Connection>(
    State(state): State<AppState<C>>,
    Path(school): Path<String>,
    Query(query): Query<HistoryQuery>,
    session: AuthSession,
) -> TrackerResult<Json<PaymentListResponse>> {
    session.require_admin()?;
    info!("GET /api/schools/{}/payments", school);

    let payments = state.ledger_service.payment_history(&school, query.limit).await?;
    Ok(Json(LedgerMapper::to_list_response(school, payments)))
}

pub fn router<C: Connection>() -> Router<AppState<C>> {
    Router::new().route(
        "/schools/:school/payments",
        get(list_payments::<C>).post(record_payment::<C>),
    )
}
