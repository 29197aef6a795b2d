use serde::{Deserialize, Serialize};
use std::fmt;

/// A student on a school's van roster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    /// Roster identifier in format "S0001", unique within one school
    pub student_id: String,
    pub name: String,
    pub school_name: String,
    /// Total fee owed for the term
    pub fee: u64,
    /// Fee still outstanding after payments
    pub remaining_fee: u64,
    pub parent_name: String,
    /// Parent phone number (or similar token), compared as text at login
    pub parent_contact: String,
}

/// One entry in a school's payment history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub student_id: String,
    pub name: String,
    pub amount_paid: u64,
    /// RFC 3339 timestamp captured when the payment was recorded
    pub timestamp: String,
}

/// A notice broadcast to every parent of one school
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub message: String,
    /// RFC 3339 timestamp captured when the notice was posted
    pub timestamp: String,
}

/// Role held by an authenticated session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Parent,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Parent => write!(f, "parent"),
        }
    }
}

/// Who is logged in: an admin username, or the parent match that opened the session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SessionUser {
    Admin(String),
    Parent {
        name: String,
        contact: String,
        school: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Bearer token for subsequent requests
    pub token: String,
    pub role: Role,
    pub user: SessionUser,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionResponse {
    pub role: Role,
    pub user: SessionUser,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogoutResponse {
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchoolListResponse {
    pub schools: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterResponse {
    pub school: String,
    pub students: Vec<Student>,
    /// Opaque version token of the roster as loaded
    pub version: String,
}

/// Add-Student form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateStudentRequest {
    pub name: String,
    pub fee: i64,
    /// Defaults to `fee` when omitted
    #[serde(default)]
    pub remaining_fee: Option<i64>,
    pub parent_name: String,
    pub parent_contact: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentResponse {
    pub student: Student,
    pub success_message: String,
}

/// Submit-payment form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordPaymentRequest {
    pub student_id: String,
    pub amount: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordPaymentResponse {
    pub student: Student,
    pub payment: Payment,
    pub success_message: String,
    pub formatted_amount: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentListResponse {
    pub school: String,
    pub payments: Vec<Payment>,
}

/// Send-notification form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostNotificationRequest {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationResponse {
    pub notification: Notification,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationListResponse {
    pub school: String,
    /// Oldest first; the last element is the most recent notice
    pub notifications: Vec<Notification>,
}

/// Query string for history listings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

/// Everything a parent sees after logging in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParentDashboardResponse {
    pub school: String,
    /// Roster rows matching the parent's name and contact
    pub students: Vec<Student>,
    /// Newest first
    pub recent_payments: Vec<Payment>,
    /// Oldest first
    pub notifications: Vec<Notification>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
