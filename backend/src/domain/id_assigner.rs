//! Student id assignment.

use crate::domain::models::Student;

pub const STUDENT_ID_PREFIX: char = 'S';

/// Next id for a roster: `S` plus a 4-digit, 1-based sequence number.
///
/// The sequence continues after both the row count and the highest existing
/// numeric id, so a hand-edited roster with gaps never reuses an id.
pub fn next_student_id(students: &[Student]) -> String {
    let highest = students
        .iter()
        .filter_map(|s| s.student_id.strip_prefix(STUDENT_ID_PREFIX))
        .filter_map(|digits| digits.parse::<usize>().ok())
        .max()
        .unwrap_or(0);

    let next = highest.max(students.len()) + 1;
    format!("{}{:04}", STUDENT_ID_PREFIX, next)
}
