//! Test utilities for CSV storage with automatic cleanup
//!
//! The temporary directory is removed when the environment is dropped, even
//! if the test panics.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

use super::connection::CsvConnection;
use super::notification_repository::NotificationRepository;
use super::payment_repository::PaymentRepository;
use super::student_repository::StudentRepository;
use crate::domain::models::Student;
use crate::storage::error::StorageResult;
use crate::storage::sync::BlobSync;
use crate::storage::traits::StudentStorage;

/// RAII test environment owning a temporary data directory
pub struct TestEnvironment {
    /// Kept alive so the directory survives until drop
    _temp_dir: TempDir,
    pub connection: CsvConnection,
    pub base_path: PathBuf,
}

impl TestEnvironment {
    pub fn new() -> StorageResult<Self> {
        let temp_dir = TempDir::new()?;
        let base_path = temp_dir.path().to_path_buf();
        let connection = CsvConnection::new(&base_path)?;

        Ok(TestEnvironment {
            _temp_dir: temp_dir,
            connection,
            base_path,
        })
    }

    pub fn base_directory(&self) -> &Path {
        &self.base_path
    }
}

/// All CSV repositories over one test environment
pub struct RepositoryTestHelper {
    pub env: TestEnvironment,
    pub student_repo: StudentRepository,
    pub payment_repo: PaymentRepository,
    pub notification_repo: NotificationRepository,
}

impl RepositoryTestHelper {
    pub fn new() -> StorageResult<Self> {
        let env = TestEnvironment::new()?;
        let student_repo = StudentRepository::new(env.connection.clone());
        let payment_repo = PaymentRepository::new(env.connection.clone());
        let notification_repo = NotificationRepository::new(env.connection.clone());

        Ok(RepositoryTestHelper {
            env,
            student_repo,
            payment_repo,
            notification_repo,
        })
    }

    /// Append students to a school's roster and save it
    pub async fn seed_students(&self, school: &str, students: Vec<Student>) -> StorageResult<()> {
        let mut roster = self.student_repo.load_students(school).await?;
        roster.students.extend(students);
        self.student_repo.save_students(&roster).await?;
        Ok(())
    }
}

/// In-memory mirror keeping the last pushed contents of every remote path
#[derive(Default)]
pub struct MemoryBlobSync {
    files: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryBlobSync {
    pub fn remote_paths(&self) -> Vec<String> {
        self.files.lock().unwrap().keys().cloned().collect()
    }
}

#[async_trait]
impl BlobSync for MemoryBlobSync {
    async fn push(&self, local_path: &Path, remote_path: &str) -> Result<bool> {
        let contents = std::fs::read(local_path)?;
        self.files.lock().unwrap().insert(remote_path.to_string(), contents);
        Ok(true)
    }

    async fn restore(&self, remote_path: &str, local_path: &Path) -> Result<bool> {
        let contents = self.files.lock().unwrap().get(remote_path).cloned();
        match contents {
            Some(contents) => {
                if let Some(parent) = local_path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(local_path, contents)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

pub fn sample_student(student_id: &str, name: &str, parent_name: &str, parent_contact: &str) -> Student {
    Student {
        student_id: student_id.to_string(),
        name: name.to_string(),
        school_name: "Sunshine School".to_string(),
        fee: 1200,
        remaining_fee: 1200,
        parent_name: parent_name.to_string(),
        parent_contact: parent_contact.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_cleanup() {
        let base_path;
        {
            let env = TestEnvironment::new().unwrap();
            base_path = env.base_directory().to_path_buf();
            assert!(base_path.exists());
            std::fs::write(base_path.join("scratch.txt"), "test data").unwrap();
        }
        assert!(!base_path.exists());
    }

    #[tokio::test]
    async fn test_repository_helper_seeds_roster() {
        let helper = RepositoryTestHelper::new().unwrap();
        helper
            .seed_students("School A", vec![sample_student("S0001", "Omkar", "Mr. Kotamire", "98765")])
            .await
            .unwrap();

        let roster = helper.student_repo.load_students("School A").await.unwrap();
        assert_eq!(roster.len(), 1);
        assert_eq!(roster.version.as_str(), "1");
    }
}
