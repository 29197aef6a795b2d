use async_trait::async_trait;
use tracing::info;

use super::connection::{CsvConnection, NOTIFICATIONS_FILE};
use crate::domain::models::{Notification, NOTIFICATION_COLUMNS};
use crate::storage::append_timestamp;
use crate::storage::error::StorageResult;
use crate::storage::traits::NotificationStorage;

/// CSV-based notification log repository
#[derive(Clone)]
pub struct NotificationRepository {
    connection: CsvConnection,
}

impl NotificationRepository {
    /// Create a new CSV notification repository
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl NotificationStorage for NotificationRepository {
    async fn append_notification(&self, school: &str, mut notification: Notification) -> StorageResult<Notification> {
        {
            let _guard = self.connection.lock();
            self.connection.ensure_school_directory(school)?;
            let path = self.connection.get_school_file_path(school, NOTIFICATIONS_FILE);
            self.connection.migrate_columns::<Notification>(&path, &NOTIFICATION_COLUMNS)?;
            notification.timestamp = append_timestamp();
            CsvConnection::append_row(&path, &NOTIFICATION_COLUMNS, &notification)?;
        }

        info!("Posted notification for {} ({} chars)", school, notification.message.len());
        self.connection
            .after_write(school, NOTIFICATIONS_FILE, "Posted notification")
            .await;
        Ok(notification)
    }

    async fn load_notifications(&self, school: &str) -> StorageResult<Vec<Notification>> {
        let path = self.connection.get_school_file_path(school, NOTIFICATIONS_FILE);
        let _guard = self.connection.lock();
        self.connection.read_table(&path)
    }
}
