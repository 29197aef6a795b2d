//! Domain-level command and result types.
//!
//! These are used by services inside the domain layer and are not exposed
//! over the public API. The REST layer maps the DTOs from the `shared`
//! crate to and from these types.

pub mod students {
    /// Input for adding a student to a school's roster
    #[derive(Debug, Clone)]
    pub struct AddStudentCommand {
        pub school: String,
        pub name: String,
        pub fee: i64,
        /// Defaults to `fee` when absent
        pub remaining_fee: Option<i64>,
        pub parent_name: String,
        pub parent_contact: String,
    }
}

pub mod ledger {
    use crate::domain::models::{Payment, Student};

    #[derive(Debug, Clone)]
    pub struct RecordPaymentCommand {
        pub school: String,
        pub student_id: String,
        pub amount: i64,
    }

    /// The updated roster row and the log entry written for it
    #[derive(Debug, Clone)]
    pub struct RecordPaymentResult {
        pub student: Student,
        pub payment: Payment,
        /// Portion of the amount that exceeded the outstanding balance
        pub overpaid: u64,
    }
}

pub mod notifications {
    #[derive(Debug, Clone)]
    pub struct PostNotificationCommand {
        pub school: String,
        pub message: String,
    }
}

pub mod parent {
    use crate::domain::models::{Notification, Payment, Student};

    /// Everything a logged-in parent sees
    #[derive(Debug, Clone)]
    pub struct ParentDashboard {
        pub school: String,
        pub students: Vec<Student>,
        /// Newest first
        pub recent_payments: Vec<Payment>,
        /// Insertion order, newest last
        pub notifications: Vec<Notification>,
    }
}
