//! Domain model for a fee payment.
use serde::{Deserialize, Serialize};

use super::coerce;
use super::student::Student;

/// Canonical payment-log columns, in storage order
pub const PAYMENT_COLUMNS: [&str; 4] = ["student_id", "name", "amount_paid", "timestamp"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    /// Empty on rows written before payments were keyed by id
    #[serde(default)]
    pub student_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "coerce::non_negative")]
    pub amount_paid: u64,
    #[serde(default)]
    pub timestamp: String,
}

impl Payment {
    /// Whether this log entry belongs to the given student.
    /// Legacy entries without an id are attributed by name.
    pub fn belongs_to(&self, student: &Student) -> bool {
        if self.student_id.is_empty() {
            !self.name.is_empty() && self.name == student.name
        } else {
            self.student_id == student.student_id
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_belongs_to_by_id_and_legacy_name() {
        let student = Student {
            student_id: "S0002".to_string(),
            name: "Omkar".to_string(),
            school_name: "Sunshine School".to_string(),
            fee: 1000,
            remaining_fee: 1000,
            parent_name: "Mr. Kotamire".to_string(),
            parent_contact: "98765".to_string(),
        };

        let keyed = Payment {
            student_id: "S0002".to_string(),
            name: "Someone Else".to_string(),
            amount_paid: 100,
            timestamp: "2025-06-01T10:00:00Z".to_string(),
        };
        let legacy = Payment {
            student_id: String::new(),
            name: "Omkar".to_string(),
            amount_paid: 100,
            timestamp: "2025-05-01T10:00:00Z".to_string(),
        };
        let other = Payment {
            student_id: "S0003".to_string(),
            name: "Omkar".to_string(),
            amount_paid: 100,
            timestamp: "2025-06-02T10:00:00Z".to_string(),
        };

        assert!(keyed.belongs_to(&student));
        assert!(legacy.belongs_to(&student));
        assert!(!other.belongs_to(&student));
    }
}
