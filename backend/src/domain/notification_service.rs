use std::sync::Arc;
use tracing::info;

use crate::domain::commands::notifications::PostNotificationCommand;
use crate::domain::error::{TrackerError, TrackerResult};
use crate::domain::ledger_service::tail;
use crate::domain::models::Notification;
use crate::domain::school_directory::SchoolDirectory;
use crate::storage::{Connection, NotificationStorage};

/// Number of notices shown to parents
pub const RECENT_NOTIFICATIONS: usize = 5;

#[derive(Clone)]
pub struct NotificationService<C: Connection> {
    notification_repository: C::NotificationRepository,
    schools: SchoolDirectory,
}

impl<C: Connection> NotificationService<C> {
    pub fn new(connection: Arc<C>, schools: SchoolDirectory) -> Self {
        Self {
            notification_repository: connection.create_notification_repository(),
            schools,
        }
    }

    /// Append a notice to a school's log; the log stamps it on append
    pub async fn post(&self, command: PostNotificationCommand) -> TrackerResult<Notification> {
        let school = self.schools.resolve(&command.school)?;
        let message = command.message.trim();
        if message.is_empty() {
            return Err(TrackerError::validation("Notification message is required"));
        }

        let draft = Notification {
            message: message.to_string(),
            timestamp: String::new(),
        };
        let notification = self.notification_repository.append_notification(school, draft).await?;

        info!("Posted notification to {}", school);
        Ok(notification)
    }

    /// The last `count` notices in insertion order, newest last
    pub async fn recent(&self, school: &str, count: usize) -> TrackerResult<Vec<Notification>> {
        self.history(school, Some(count)).await
    }

    pub async fn history(&self, school: &str, limit: Option<usize>) -> TrackerResult<Vec<Notification>> {
        let school = self.schools.resolve(school)?;
        let notifications = self.notification_repository.load_notifications(school).await?;
        Ok(tail(notifications, limit))
    }
}
