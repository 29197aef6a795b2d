//! # REST API Interface Layer
//!
//! HTTP endpoints of the van tracker, nested under `/api` by
//! [`crate::create_router`]. This layer only translates: JSON DTOs from the
//! `shared` crate in and out, bearer tokens to sessions, and domain errors to
//! status codes with a `{ "error": ... }` body.
//!
//! | Route | Role |
//! |-------|------|
//! | `POST /login`, `POST /logout`, `GET /session` | any |
//! | `GET /schools` | admin |
//! | `GET/POST /schools/:school/students` | admin |
//! | `GET/POST /schools/:school/payments` | admin |
//! | `GET/POST /schools/:school/notifications` | admin |
//! | `GET /parent/dashboard` | parent |

pub mod auth_apis;
pub mod auth_session;
pub mod error;
pub mod mappers;
pub mod notification_apis;
pub mod parent_apis;
pub mod payment_apis;
pub mod student_apis;

use axum::Router;

use crate::storage::Connection;
use crate::AppState;

pub use auth_session::AuthSession;

/// All API routes, without the `/api` prefix
pub fn api_router<C: Connection>() -> Router<AppState<C>> {
    Router::new()
        .merge(auth_apis::router())
        .merge(student_apis::router())
        .merge(payment_apis::router())
        .merge(notification_apis::router())
        .merge(parent_apis::router())
}
