//! # Storage Traits
//!
//! This module defines the storage abstraction traits that allow different
//! storage backends to be used interchangeably in the domain layer.
//!
//! Every table is scoped to one school. A school that has never been written
//! reads as an empty table; a backend failure is always an error and is never
//! reported as "no data".

use async_trait::async_trait;

use super::error::StorageResult;
use crate::domain::models::{Notification, Payment, Roster, RosterVersion};

/// Trait defining the interface for roster storage operations
#[async_trait]
pub trait StudentStorage: Send + Sync {
    /// Load the full student table for a school, together with its version
    async fn load_students(&self, school: &str) -> StorageResult<Roster>;

    /// Replace the school's student table with `roster.students`.
    ///
    /// Fails with `StorageError::Conflict` when the persisted version is no
    /// longer `roster.version`. Returns the version of the newly saved table.
    async fn save_students(&self, roster: &Roster) -> StorageResult<RosterVersion>;
}

/// Trait defining the interface for the append-only payment log
#[async_trait]
pub trait PaymentStorage: Send + Sync {
    /// Append one entry to the school's payment log and return it as stored.
    ///
    /// The log assigns `timestamp` while it holds its append ordering, so
    /// entries are in timestamp order; any timestamp passed in is replaced.
    async fn append_payment(&self, school: &str, payment: Payment) -> StorageResult<Payment>;

    /// Load the school's payment log in append order (oldest first)
    async fn load_payments(&self, school: &str) -> StorageResult<Vec<Payment>>;
}

/// Trait defining the interface for the append-only notification log
#[async_trait]
pub trait NotificationStorage: Send + Sync {
    /// Append one entry to the school's notification log and return it as
    /// stored, with `timestamp` assigned the same way as payments
    async fn append_notification(&self, school: &str, notification: Notification) -> StorageResult<Notification>;

    /// Load the school's notification log in append order (oldest first)
    async fn load_notifications(&self, school: &str) -> StorageResult<Vec<Notification>>;
}

/// Trait defining the interface for storage connections
///
/// This trait abstracts away the specific connection type (flat files, remote
/// tree, etc.) and provides factory methods for creating repositories.
pub trait Connection: Send + Sync + Clone + 'static {
    type StudentRepository: StudentStorage + Clone + 'static;
    type PaymentRepository: PaymentStorage + Clone + 'static;
    type NotificationRepository: NotificationStorage + Clone + 'static;

    fn create_student_repository(&self) -> Self::StudentRepository;
    fn create_payment_repository(&self) -> Self::PaymentRepository;
    fn create_notification_repository(&self) -> Self::NotificationRepository;
}
