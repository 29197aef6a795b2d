use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use tracing::{info, warn};

use super::connection::{CsvConnection, ROSTER_META_FILE, STUDENTS_FILE};
use crate::domain::models::coerce::parse_non_negative;
use crate::domain::models::{Roster, RosterVersion, Student, STUDENT_COLUMNS};
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::traits::StudentStorage;

/// Version bookkeeping kept next to students.csv
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RosterMeta {
    school: String,
    version: u64,
    updated_at: String,
}

/// CSV-based roster repository
#[derive(Clone)]
pub struct StudentRepository {
    connection: CsvConnection,
}

impl StudentRepository {
    /// Create a new CSV student repository
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    /// Read the persisted roster version; a roster never saved is at version 0
    fn read_version(&self, school: &str) -> StorageResult<u64> {
        let meta_path = self.connection.get_school_file_path(school, ROSTER_META_FILE);
        if !meta_path.exists() {
            return Ok(0);
        }

        let yaml_content = fs::read_to_string(&meta_path)?;
        let meta: RosterMeta = serde_yaml::from_str(&yaml_content)?;
        Ok(meta.version)
    }

    fn write_version(&self, school: &str, version: u64) -> StorageResult<()> {
        let meta = RosterMeta {
            school: school.to_string(),
            version,
            updated_at: Utc::now().to_rfc3339(),
        };
        let yaml_content = serde_yaml::to_string(&meta)?;
        let meta_path = self.connection.get_school_file_path(school, ROSTER_META_FILE);
        CsvConnection::write_atomically(&meta_path, yaml_content.as_bytes())
    }
}

#[async_trait]
impl StudentStorage for StudentRepository {
    async fn load_students(&self, school: &str) -> StorageResult<Roster> {
        let path = self.connection.get_school_file_path(school, STUDENTS_FILE);

        let (students, version) = {
            let _guard = self.connection.lock();
            let students: Vec<Student> = self.connection.read_table(&path)?;
            let version = self.read_version(school)?;
            (students, version)
        };

        Ok(Roster {
            school: school.to_string(),
            students,
            version: RosterVersion::new(version.to_string()),
        })
    }

    async fn save_students(&self, roster: &Roster) -> StorageResult<RosterVersion> {
        let school = roster.school.as_str();
        let expected = parse_non_negative(roster.version.as_str());

        let new_version = {
            let _guard = self.connection.lock();

            let current = self.read_version(school)?;
            if current != expected {
                warn!(
                    "Rejected stale roster save for {}: loaded at version {}, now at {}",
                    school, expected, current
                );
                return Err(StorageError::Conflict {
                    school: school.to_string(),
                    expected: roster.version.to_string(),
                    actual: current.to_string(),
                });
            }

            self.connection.ensure_school_directory(school)?;
            let encoded = CsvConnection::encode_table(&STUDENT_COLUMNS, &roster.students)?;
            let path = self.connection.get_school_file_path(school, STUDENTS_FILE);
            CsvConnection::write_atomically(&path, &encoded)?;

            let new_version = current + 1;
            self.write_version(school, new_version)?;
            new_version
        };

        info!(
            "Saved roster for {} with {} students (version {})",
            school,
            roster.students.len(),
            new_version
        );

        let action_description = format!("Saved roster with {} students", roster.students.len());
        self.connection.after_write(school, STUDENTS_FILE, &action_description).await;
        self.connection.mirror(school, ROSTER_META_FILE).await;

        Ok(RosterVersion::new(new_version.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::csv::test_utils::{sample_student, MemoryBlobSync, TestEnvironment};
    use std::sync::Arc;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_never_written_school_loads_empty_roster() {
        let env = TestEnvironment::new().unwrap();
        let repo = StudentRepository::new(env.connection.clone());

        let roster = repo.load_students("Sunshine School").await.unwrap();
        assert!(roster.is_empty());
        assert_eq!(roster.school, "Sunshine School");
        assert_eq!(roster.version, RosterVersion::initial());
        assert_eq!(roster.columns(), &STUDENT_COLUMNS);
    }

    #[tokio::test]
    async fn test_save_then_load_round_trip() {
        let env = TestEnvironment::new().unwrap();
        let repo = StudentRepository::new(env.connection.clone());

        let mut roster = repo.load_students("Sunshine School").await.unwrap();
        roster.students.push(sample_student("S0001", "Omkar", "Mr. Kotamire", "9876543210"));
        roster.students.push(sample_student("S0002", "Riya, Jr.", "Mrs. Patil", "0222333444"));

        let version = repo.save_students(&roster).await.unwrap();
        assert_eq!(version.as_str(), "1");

        let loaded = repo.load_students("Sunshine School").await.unwrap();
        assert_eq!(loaded.students, roster.students);
        assert_eq!(loaded.version, version);

        let header = fs::read_to_string(env.connection.get_school_file_path("Sunshine School", STUDENTS_FILE))
            .unwrap()
            .lines()
            .next()
            .map(str::to_string);
        assert_eq!(header.as_deref(), Some("student_id,name,school_name,fee,remaining_fee,parent_name,parent_contact"));
    }

    #[tokio::test]
    async fn test_stale_save_is_rejected() {
        let env = TestEnvironment::new().unwrap();
        let repo = StudentRepository::new(env.connection.clone());

        // Two sessions load the same version
        let mut first = repo.load_students("School A").await.unwrap();
        let mut second = repo.load_students("School A").await.unwrap();

        first.students.push(sample_student("S0001", "Omkar", "Mr. Kotamire", "111"));
        second.students.push(sample_student("S0001", "Riya", "Mrs. Patil", "222"));

        repo.save_students(&first).await.unwrap();
        let result = repo.save_students(&second).await;
        assert!(matches!(result, Err(StorageError::Conflict { .. })));

        // The first writer's row survives
        let loaded = repo.load_students("School A").await.unwrap();
        assert_eq!(loaded.students.len(), 1);
        assert_eq!(loaded.students[0].name, "Omkar");
    }

    #[tokio::test]
    async fn test_legacy_rows_are_coerced() {
        let env = TestEnvironment::new().unwrap();
        let repo = StudentRepository::new(env.connection.clone());
        env.connection.ensure_school_directory("School A").unwrap();
        fs::write(
            env.connection.get_school_file_path("School A", STUDENTS_FILE),
            "student_id,name,school_name,fee,remaining_fee,parent_name,parent_contact\n\
             S0001,Omkar,School A,1200.0,-50,Mr. Kotamire,9876543210.0\n\
             S0002,Riya,School A,abc,,Mrs. Patil,0222\n",
        )
        .unwrap();

        let roster = repo.load_students("School A").await.unwrap();
        assert_eq!(roster.len(), 2);
        assert_eq!(roster.students[0].fee, 1200);
        assert_eq!(roster.students[0].remaining_fee, 0);
        assert_eq!(roster.students[0].parent_contact, "9876543210");
        assert_eq!(roster.students[1].fee, 0);
        assert_eq!(roster.students[1].remaining_fee, 0);
        assert_eq!(roster.students[1].parent_contact, "0222");
    }

    #[tokio::test]
    async fn test_corrupt_version_file_is_an_error_not_empty() {
        let env = TestEnvironment::new().unwrap();
        let repo = StudentRepository::new(env.connection.clone());
        env.connection.ensure_school_directory("School A").unwrap();
        fs::write(
            env.connection.get_school_file_path("School A", ROSTER_META_FILE),
            "version: [not, a, number",
        )
        .unwrap();

        let result = repo.load_students("School A").await;
        assert!(matches!(result, Err(StorageError::Malformed { .. })));
    }

    #[tokio::test]
    async fn test_mirrored_roster_restores_with_its_version() {
        let sync = Arc::new(MemoryBlobSync::default());
        let first_dir = TempDir::new().unwrap();
        let connection = CsvConnection::new(first_dir.path()).unwrap().with_blob_sync(sync.clone());
        let repo = StudentRepository::new(connection);

        let mut roster = repo.load_students("School A").await.unwrap();
        roster.students.push(sample_student("S0001", "Omkar", "Mr. Kotamire", "9876543210"));
        repo.save_students(&roster).await.unwrap();

        assert_eq!(
            sync.remote_paths(),
            vec!["school_a/roster.yaml".to_string(), "school_a/students.csv".to_string()]
        );

        // A fresh machine pulls both files back and keeps the version counter
        let second_dir = TempDir::new().unwrap();
        let restored = CsvConnection::new(second_dir.path()).unwrap().with_blob_sync(sync.clone());
        assert_eq!(restored.restore_missing_files(&["School A".to_string()]).await, 2);

        let reloaded = StudentRepository::new(restored).load_students("School A").await.unwrap();
        assert_eq!(reloaded.students, roster.students);
        assert_eq!(reloaded.version.as_str(), "1");
    }
}
