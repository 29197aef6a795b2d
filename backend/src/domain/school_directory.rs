use std::sync::Arc;

use crate::domain::error::{TrackerError, TrackerResult};
use crate::storage::school_key;

/// The configured schools, in credential scan order
#[derive(Debug, Clone)]
pub struct SchoolDirectory {
    schools: Arc<Vec<String>>,
}

impl SchoolDirectory {
    pub fn new(schools: Vec<String>) -> Self {
        Self {
            schools: Arc::new(schools),
        }
    }

    pub fn names(&self) -> &[String] {
        &self.schools
    }

    /// Canonical name of a school given either its name or its storage key
    pub fn resolve(&self, school: &str) -> TrackerResult<&str> {
        let key = school_key(school);
        self.schools
            .iter()
            .find(|name| !key.is_empty() && school_key(name) == key)
            .map(String::as_str)
            .ok_or_else(|| TrackerError::UnknownSchool(school.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_by_name_or_key() {
        let directory = SchoolDirectory::new(vec!["School A".to_string(), "School B".to_string()]);
        assert_eq!(directory.resolve("School B").unwrap(), "School B");
        assert_eq!(directory.resolve("school_b").unwrap(), "School B");
        assert_eq!(directory.resolve(" school a ").unwrap(), "School A");
        assert!(matches!(directory.resolve("School C"), Err(TrackerError::UnknownSchool(_))));
        assert!(matches!(directory.resolve(""), Err(TrackerError::UnknownSchool(_))));
    }
}
