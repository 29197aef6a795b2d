//! Flat-file backend: one directory per school holding CSV tables.

pub mod connection;
pub mod notification_repository;
pub mod payment_repository;
pub mod student_repository;
#[cfg(test)]
pub mod test_utils;

pub use connection::{
    CsvConnection, NOTIFICATIONS_FILE, PAYMENTS_FILE, ROSTER_META_FILE, STUDENTS_FILE, SYNCED_FILES,
};
pub use notification_repository::NotificationRepository;
pub use payment_repository::PaymentRepository;
pub use student_repository::StudentRepository;
