use std::sync::Arc;
use tracing::info;

use crate::domain::commands::parent::ParentDashboard;
use crate::domain::error::{TrackerError, TrackerResult};
use crate::domain::ledger_service::LedgerService;
use crate::domain::models::Identity;
use crate::domain::notification_service::{NotificationService, RECENT_NOTIFICATIONS};
use crate::domain::school_directory::SchoolDirectory;
use crate::storage::{Connection, StudentStorage};

/// Number of payments shown to parents
pub const RECENT_PAYMENTS: usize = 5;

/// Read-only view of a parent's own children
#[derive(Clone)]
pub struct ParentService<C: Connection> {
    student_repository: C::StudentRepository,
    ledger_service: LedgerService<C>,
    notification_service: NotificationService<C>,
    schools: SchoolDirectory,
}

impl<C: Connection> ParentService<C> {
    pub fn new(
        connection: Arc<C>,
        schools: SchoolDirectory,
        ledger_service: LedgerService<C>,
        notification_service: NotificationService<C>,
    ) -> Self {
        Self {
            student_repository: connection.create_student_repository(),
            ledger_service,
            notification_service,
            schools,
        }
    }

    /// Rows matching the parent, their latest payments and the school's latest notices
    pub async fn dashboard(&self, identity: &Identity) -> TrackerResult<ParentDashboard> {
        let Identity::Parent { name, contact, school } = identity else {
            return Err(TrackerError::Forbidden("Only parents have a dashboard".to_string()));
        };
        let school = self.schools.resolve(school)?;

        let roster = self.student_repository.load_students(school).await?;
        let students = roster.children_of(name, contact);
        let recent_payments = self
            .ledger_service
            .recent_payments_for(school, &students, RECENT_PAYMENTS)
            .await?;
        let notifications = self.notification_service.recent(school, RECENT_NOTIFICATIONS).await?;

        info!("Built dashboard for {} with {} students", name, students.len());

        Ok(ParentDashboard {
            school: school.to_string(),
            students,
            recent_payments,
            notifications,
        })
    }
}
