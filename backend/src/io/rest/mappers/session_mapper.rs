use crate::domain::commands::parent::ParentDashboard;
use crate::domain::models::Identity;
use crate::io::rest::mappers::{LedgerMapper, NotificationMapper, StudentMapper};
use shared::{LoginResponse, ParentDashboardResponse, SessionResponse, SessionUser};

pub struct SessionMapper;

impl SessionMapper {
    pub fn to_session_user(identity: &Identity) -> SessionUser {
        match identity {
            Identity::Admin { username } => SessionUser::Admin(username.clone()),
            Identity::Parent { name, contact, school } => SessionUser::Parent {
                name: name.clone(),
                contact: contact.clone(),
                school: school.clone(),
            },
        }
    }

    pub fn to_login_response(token: String, identity: &Identity) -> LoginResponse {
        LoginResponse {
            token,
            role: identity.role(),
            user: Self::to_session_user(identity),
        }
    }

    pub fn to_session_response(identity: &Identity) -> SessionResponse {
        SessionResponse {
            role: identity.role(),
            user: Self::to_session_user(identity),
        }
    }

    pub fn to_dashboard_response(dashboard: ParentDashboard) -> ParentDashboardResponse {
        ParentDashboardResponse {
            school: dashboard.school,
            students: StudentMapper::to_dtos(dashboard.students),
            recent_payments: LedgerMapper::to_dtos(dashboard.recent_payments),
            notifications: NotificationMapper::to_dtos(dashboard.notifications),
        }
    }
}
