//! Domain model for a school notice.
use serde::{Deserialize, Serialize};

/// Canonical notification-log columns, in storage order
pub const NOTIFICATION_COLUMNS: [&str; 2] = ["message", "timestamp"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub timestamp: String,
}
