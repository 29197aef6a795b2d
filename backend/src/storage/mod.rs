//! # Storage Module
//!
//! Handles all data persistence for the van tracker.
//!
//! Each school is an independent partition holding three tables: the student
//! roster, the payment log and the notification log. Two backends implement
//! the same traits:
//!
//! - **csv**: one directory per school with flat CSV files, versioned with a
//!   local git repository and optionally mirrored to a GitHub repository
//! - **remote**: a hosted realtime-database JSON tree reached over REST
//!
//! The roster is saved as a whole table guarded by a version token, so a
//! save based on a stale load is rejected instead of silently overwriting a
//! concurrent change. The two logs are append-only.

pub mod csv;
pub mod error;
pub mod git;
pub mod remote;
pub mod sync;
pub mod traits;

pub use error::{StorageError, StorageResult};
pub use git::GitManager;
pub use traits::{Connection, NotificationStorage, PaymentStorage, StudentStorage};

use chrono::{SecondsFormat, Utc};

/// Timestamp stamped on a log entry at the moment it is appended
pub(crate) fn append_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Generate a storage-safe key from a school name
/// Converts "Sunshine School" -> "sunshine_school", "São Tomé" -> "sao_tome", etc.
pub fn school_key(school_name: &str) -> String {
    let mapped: String = school_name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                match c {
                    'á' | 'à' | 'ä' | 'â' | 'ã' | 'Á' | 'À' | 'Ä' | 'Â' | 'Ã' => 'a',
                    'é' | 'è' | 'ë' | 'ê' | 'É' | 'È' | 'Ë' | 'Ê' => 'e',
                    'í' | 'ì' | 'ï' | 'î' | 'Í' | 'Ì' | 'Ï' | 'Î' => 'i',
                    'ó' | 'ò' | 'ö' | 'ô' | 'õ' | 'Ó' | 'Ò' | 'Ö' | 'Ô' | 'Õ' => 'o',
                    'ú' | 'ù' | 'ü' | 'û' | 'Ú' | 'Ù' | 'Ü' | 'Û' => 'u',
                    'ñ' | 'Ñ' => 'n',
                    'ç' | 'Ç' => 'c',
                    _ => '_',
                }
            }
        })
        .collect();

    // Collapse runs of separators so "St. Mary's  School" -> "st_mary_s_school"
    let mut key = String::with_capacity(mapped.len());
    for c in mapped.chars() {
        if c == '_' && key.ends_with('_') {
            continue;
        }
        key.push(c);
    }
    key.trim_matches('_').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_school_key() {
        assert_eq!(school_key("Sunshine School"), "sunshine_school");
        assert_eq!(school_key("School B"), "school_b");
        assert_eq!(school_key("São Tomé Academy"), "sao_tome_academy");
        assert_eq!(school_key("St. Mary's  School"), "st_mary_s_school");
        assert_eq!(school_key("  Vidya-Mandir #2 "), "vidya_mandir_2");
    }
}
