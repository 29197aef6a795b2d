//! Hosted realtime-database backend reached over its REST API.
pub mod connection;
pub mod repositories;

pub use connection::RemoteTreeConnection;
pub use repositories::{RemoteNotificationRepository, RemotePaymentRepository, RemoteStudentRepository};
