use crate::domain::models::Notification as DomainNotification;
use shared::{Notification as SharedNotification, NotificationListResponse, NotificationResponse};

pub struct NotificationMapper;

impl NotificationMapper {
    pub fn to_dto(domain: DomainNotification) -> SharedNotification {
        SharedNotification {
            message: domain.message,
            timestamp: domain.timestamp,
        }
    }

    pub fn to_dtos(notifications: Vec<DomainNotification>) -> Vec<SharedNotification> {
        notifications.into_iter().map(Self::to_dto).collect()
    }

    pub fn to_post_response(notification: DomainNotification, school: &str) -> NotificationResponse {
        NotificationResponse {
            notification: Self::to_dto(notification),
            success_message: format!("Notification sent to {}", school),
        }
    }

    pub fn to_list_response(school: String, notifications: Vec<DomainNotification>) -> NotificationListResponse {
        NotificationListResponse {
            school,
            notifications: Self::to_dtos(notifications),
        }
    }
}
