pub mod coerce;
pub mod identity;
pub mod notification;
pub mod payment;
pub mod student;

pub use identity::Identity;
pub use notification::{Notification, NOTIFICATION_COLUMNS};
pub use payment::{Payment, PAYMENT_COLUMNS};
pub use student::{Roster, RosterVersion, Student, STUDENT_COLUMNS};
