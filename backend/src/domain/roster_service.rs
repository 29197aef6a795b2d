use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::commands::students::AddStudentCommand;
use crate::domain::error::{TrackerError, TrackerResult};
use crate::domain::id_assigner::next_student_id;
use crate::domain::models::{Roster, Student};
use crate::domain::school_directory::SchoolDirectory;
use crate::storage::{Connection, StorageError, StudentStorage};

/// Attempts made by a read-modify-write before giving up on a busy roster
pub const MAX_SAVE_ATTEMPTS: usize = 3;

/// Load a roster, apply `mutate`, and save it back guarded by the loaded
/// version. A conflicting save reloads and reapplies `mutate`. Errors from
/// `mutate` abort without writing anything.
pub(crate) async fn modify_roster<S, T, F>(storage: &S, school: &str, mut mutate: F) -> TrackerResult<T>
where
    S: StudentStorage + ?Sized,
    T: Send,
    F: FnMut(&mut Roster) -> TrackerResult<T> + Send,
{
    for attempt in 1..=MAX_SAVE_ATTEMPTS {
        let mut roster = storage.load_students(school).await?;
        let outcome = mutate(&mut roster)?;

        match storage.save_students(&roster).await {
            Ok(_) => return Ok(outcome),
            Err(StorageError::Conflict { .. }) => {
                warn!(
                    "Roster for {} changed during update (attempt {}/{})",
                    school, attempt, MAX_SAVE_ATTEMPTS
                );
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(TrackerError::ConcurrentModification {
        school: school.to_string(),
    })
}

/// Service for managing school rosters
#[derive(Clone)]
pub struct RosterService<C: Connection> {
    student_repository: C::StudentRepository,
    schools: SchoolDirectory,
}

impl<C: Connection> RosterService<C> {
    pub fn new(connection: Arc<C>, schools: SchoolDirectory) -> Self {
        Self {
            student_repository: connection.create_student_repository(),
            schools,
        }
    }

    pub fn schools(&self) -> &SchoolDirectory {
        &self.schools
    }

    /// Full roster of a school, in storage order
    pub async fn list_roster(&self, school: &str) -> TrackerResult<Roster> {
        let school = self.schools.resolve(school)?;
        let roster = self.student_repository.load_students(school).await?;
        info!("Loaded {} students for {}", roster.len(), school);
        Ok(roster)
    }

    /// Add a student with the next free id
    pub async fn add_student(&self, command: AddStudentCommand) -> TrackerResult<Student> {
        let school = self.schools.resolve(&command.school)?.to_string();
        Self::validate_add_command(&command)?;

        let fee = command.fee as u64;
        let remaining_fee = command.remaining_fee.map_or(fee, |r| r as u64);

        let student = modify_roster(&self.student_repository, &school, |roster| {
            let student = Student {
                student_id: next_student_id(&roster.students),
                name: command.name.trim().to_string(),
                school_name: school.clone(),
                fee,
                remaining_fee,
                parent_name: command.parent_name.trim().to_string(),
                parent_contact: command.parent_contact.trim().to_string(),
            };
            roster.students.push(student.clone());
            Ok(student)
        })
        .await?;

        info!("Added student {} ({}) to {}", student.student_id, student.name, school);
        Ok(student)
    }

    fn validate_add_command(command: &AddStudentCommand) -> TrackerResult<()> {
        if command.name.trim().is_empty() {
            return Err(TrackerError::validation("Student name is required"));
        }
        if command.parent_name.trim().is_empty() {
            return Err(TrackerError::validation("Parent name is required"));
        }
        if command.parent_contact.trim().is_empty() {
            return Err(TrackerError::validation("Parent contact is required"));
        }
        if command.fee < 0 {
            return Err(TrackerError::validation("Fee cannot be negative"));
        }
        if command.remaining_fee.is_some_and(|r| r < 0) {
            return Err(TrackerError::validation("Remaining fee cannot be negative"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::RosterVersion;
    use crate::storage::csv::test_utils::{sample_student, TestEnvironment};
    use crate::storage::csv::CsvConnection;
    use crate::storage::StorageResult;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn setup_test() -> (RosterService<CsvConnection>, TestEnvironment) {
        let env = TestEnvironment::new().unwrap();
        let schools = SchoolDirectory::new(vec!["School A".to_string(), "School B".to_string()]);
        let service = RosterService::new(Arc::new(env.connection.clone()), schools);
        (service, env)
    }

    fn command(name: &str, fee: i64) -> AddStudentCommand {
        AddStudentCommand {
            school: "School A".to_string(),
            name: name.to_string(),
            fee,
            remaining_fee: None,
            parent_name: "Mr. Kotamire".to_string(),
            parent_contact: "9876543210".to_string(),
        }
    }

    #[tokio::test]
    async fn test_add_student_assigns_sequential_ids() {
        let (service, _env) = setup_test();

        let first = service.add_student(command("Omkar", 1200)).await.unwrap();
        let second = service.add_student(command("Riya", 900)).await.unwrap();

        assert_eq!(first.student_id, "S0001");
        assert_eq!(first.remaining_fee, 1200);
        assert_eq!(first.school_name, "School A");
        assert_eq!(second.student_id, "S0002");

        let roster = service.list_roster("School A").await.unwrap();
        assert_eq!(roster.len(), 2);
        assert_eq!(roster.version.as_str(), "2");
        assert!(service.list_roster("School B").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_student_with_explicit_remaining_fee() {
        let (service, _env) = setup_test();
        let mut cmd = command("Omkar", 1200);
        cmd.remaining_fee = Some(300);

        let student = service.add_student(cmd).await.unwrap();
        assert_eq!(student.fee, 1200);
        assert_eq!(student.remaining_fee, 300);
    }

    #[tokio::test]
    async fn test_add_student_validation() {
        let (service, _env) = setup_test();

        let mut cmd = command("  ", 100);
        assert!(matches!(service.add_student(cmd.clone()).await, Err(TrackerError::Validation(_))));

        cmd = command("Omkar", 100);
        cmd.parent_name = String::new();
        assert!(matches!(service.add_student(cmd.clone()).await, Err(TrackerError::Validation(_))));

        cmd = command("Omkar", 100);
        cmd.parent_contact = " ".to_string();
        assert!(matches!(service.add_student(cmd.clone()).await, Err(TrackerError::Validation(_))));

        assert!(matches!(service.add_student(command("Omkar", -1)).await, Err(TrackerError::Validation(_))));

        // Nothing was written
        assert!(service.list_roster("School A").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_school_is_rejected() {
        let (service, _env) = setup_test();
        let mut cmd = command("Omkar", 100);
        cmd.school = "School Z".to_string();

        assert!(matches!(service.add_student(cmd).await, Err(TrackerError::UnknownSchool(_))));
        assert!(matches!(service.list_roster("School Z").await, Err(TrackerError::UnknownSchool(_))));
    }

    #[tokio::test]
    async fn test_add_after_concurrent_save_gets_next_id() {
        let (service, env) = setup_test();
        let repo = env.connection.create_student_repository();

        // Another session loads, then this service adds, then the other session saves
        let mut stale = repo.load_students("School A").await.unwrap();
        service.add_student(command("Omkar", 1200)).await.unwrap();
        stale.students.push(sample_student("S0001", "Riya", "Mrs. Patil", "222"));
        assert!(matches!(repo.save_students(&stale).await, Err(StorageError::Conflict { .. })));

        let next = service.add_student(command("Riya", 900)).await.unwrap();
        assert_eq!(next.student_id, "S0002");
    }

    /// Roster storage whose saves always lose the race
    struct AlwaysConflicting {
        saves: AtomicUsize,
    }

    #[async_trait]
    impl StudentStorage for AlwaysConflicting {
        async fn load_students(&self, school: &str) -> StorageResult<Roster> {
            Ok(Roster::empty(school))
        }

        async fn save_students(&self, roster: &Roster) -> StorageResult<RosterVersion> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            Err(StorageError::Conflict {
                school: roster.school.clone(),
                expected: roster.version.to_string(),
                actual: "99".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let storage = AlwaysConflicting {
            saves: AtomicUsize::new(0),
        };

        let result = modify_roster(&storage, "School A", |roster| {
            roster.students.push(sample_student("S0001", "Omkar", "Mr. Kotamire", "1"));
            Ok(())
        })
        .await;

        assert!(matches!(result, Err(TrackerError::ConcurrentModification { .. })));
        assert_eq!(storage.saves.load(Ordering::SeqCst), MAX_SAVE_ATTEMPTS);
    }
}
