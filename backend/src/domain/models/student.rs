//! Domain model for a student on a school's van roster.
use serde::{Deserialize, Serialize};
use std::fmt;

use super::coerce;

/// Canonical roster columns, in storage order
pub const STUDENT_COLUMNS: [&str; 7] = [
    "student_id",
    "name",
    "school_name",
    "fee",
    "remaining_fee",
    "parent_name",
    "parent_contact",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    #[serde(default)]
    pub student_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "school")]
    pub school_name: String,
    #[serde(default, deserialize_with = "coerce::non_negative")]
    pub fee: u64,
    #[serde(default, deserialize_with = "coerce::non_negative")]
    pub remaining_fee: u64,
    #[serde(default, alias = "parent")]
    pub parent_name: String,
    #[serde(default, deserialize_with = "coerce::contact")]
    pub parent_contact: String,
}

impl Student {
    /// Parent login check: name is case-insensitive, contact must match as text
    pub fn parent_matches(&self, parent_name: &str, parent_contact: &str) -> bool {
        let name = parent_name.trim();
        let contact = parent_contact.trim();
        !name.is_empty()
            && !contact.is_empty()
            && self.parent_name.trim().to_lowercase() == name.to_lowercase()
            && self.parent_contact == contact
    }

    /// Deduct a payment from the outstanding balance, never going below zero.
    /// Returns the portion of `amount` that exceeded the balance.
    pub fn apply_payment(&mut self, amount: u64) -> u64 {
        let overpaid = amount.saturating_sub(self.remaining_fee);
        self.remaining_fee = self.remaining_fee.saturating_sub(amount);
        overpaid
    }
}

/// Opaque token identifying one persisted state of a roster
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RosterVersion(String);

impl RosterVersion {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Version of a roster that has never been written
    pub fn initial() -> Self {
        Self("0".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RosterVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A school's full student table as loaded from storage
#[derive(Debug, Clone, PartialEq)]
pub struct Roster {
    pub school: String,
    pub students: Vec<Student>,
    /// Version the table was loaded at; saves are rejected once it is stale
    pub version: RosterVersion,
}

impl Roster {
    pub fn empty(school: &str) -> Self {
        Self {
            school: school.to_string(),
            students: Vec::new(),
            version: RosterVersion::initial(),
        }
    }

    pub fn columns(&self) -> &'static [&'static str] {
        &STUDENT_COLUMNS
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }

    pub fn find(&self, student_id: &str) -> Option<&Student> {
        self.students.iter().find(|s| s.student_id == student_id)
    }

    pub fn find_mut(&mut self, student_id: &str) -> Option<&mut Student> {
        self.students.iter_mut().find(|s| s.student_id == student_id)
    }

    /// Rows belonging to the given parent
    pub fn children_of(&self, parent_name: &str, parent_contact: &str) -> Vec<Student> {
        self.students
            .iter()
            .filter(|s| s.parent_matches(parent_name, parent_contact))
            .cloned()
            .collect()
    }
}
