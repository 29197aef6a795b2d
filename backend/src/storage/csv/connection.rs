use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use csv::{ReaderBuilder, WriterBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::storage::error::StorageResult;
use crate::storage::git::GitManager;
use crate::storage::school_key;
use crate::storage::sync::BlobSync;
use crate::storage::traits::Connection;

pub const STUDENTS_FILE: &str = "students.csv";
pub const PAYMENTS_FILE: &str = "payments.csv";
pub const NOTIFICATIONS_FILE: &str = "notifications.csv";
pub const ROSTER_META_FILE: &str = "roster.yaml";

/// Files mirrored to the remote blob store for each school
pub const SYNCED_FILES: [&str; 4] = [STUDENTS_FILE, PAYMENTS_FILE, NOTIFICATIONS_FILE, ROSTER_META_FILE];

/// CsvConnection manages the per-school directories and serializes writes
#[derive(Clone)]
pub struct CsvConnection {
    base_directory: Arc<PathBuf>,
    write_lock: Arc<Mutex<()>>,
    git_manager: Option<GitManager>,
    blob_sync: Option<Arc<dyn BlobSync>>,
}

impl CsvConnection {
    /// Create a new CSV connection rooted at `base_directory`
    pub fn new<P: AsRef<Path>>(base_directory: P) -> StorageResult<Self> {
        let base_path = base_directory.as_ref().to_path_buf();

        if !base_path.exists() {
            fs::create_dir_all(&base_path)?;
            info!("Created data directory: {}", base_path.display());
        }

        Ok(Self {
            base_directory: Arc::new(base_path),
            write_lock: Arc::new(Mutex::new(())),
            git_manager: None,
            blob_sync: None,
        })
    }

    /// Commit every write to a git repository inside the school directory
    pub fn with_git_versioning(mut self, git_manager: GitManager) -> Self {
        self.git_manager = Some(git_manager);
        self
    }

    /// Mirror every write to a remote blob store
    pub fn with_blob_sync(mut self, blob_sync: Arc<dyn BlobSync>) -> Self {
        self.blob_sync = Some(blob_sync);
        self
    }

    pub fn base_directory(&self) -> &Path {
        &self.base_directory
    }

    /// Directory holding one school's tables
    pub fn get_school_directory(&self, school: &str) -> PathBuf {
        self.base_directory.join(school_key(school))
    }

    pub fn get_school_file_path(&self, school: &str, file_name: &str) -> PathBuf {
        self.get_school_directory(school).join(file_name)
    }

    /// Path of a school file inside the remote mirror
    pub fn remote_path(&self, school: &str, file_name: &str) -> String {
        format!("{}/{}", school_key(school), file_name)
    }

    pub fn ensure_school_directory(&self, school: &str) -> StorageResult<PathBuf> {
        let school_dir = self.get_school_directory(school);
        if !school_dir.exists() {
            fs::create_dir_all(&school_dir)?;
            info!("Created school directory: {}", school_dir.display());
        }
        Ok(school_dir)
    }

    /// Hold the connection-wide write lock.
    /// Guards are released before any await point.
    pub(crate) fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Read every row of a CSV table; a missing file is an empty table
    pub(crate) fn read_table<T: DeserializeOwned>(&self, path: &Path) -> StorageResult<Vec<T>> {
        if !path.exists() {
            debug!("Table {} does not exist yet, reading as empty", path.display());
            return Ok(Vec::new());
        }

        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_path(path)?;

        let mut rows = Vec::new();
        for record in reader.deserialize() {
            rows.push(record?);
        }
        Ok(rows)
    }

    /// Encode a full table, header included, to CSV bytes
    pub(crate) fn encode_table<T: Serialize>(columns: &[&str], rows: &[T]) -> StorageResult<Vec<u8>> {
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(Vec::new());
        writer.write_record(columns)?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer
            .into_inner()
            .map_err(|e| crate::storage::StorageError::Unavailable(e.to_string()))
    }

    /// Replace a file by writing a temp file next to it and renaming it over
    pub(crate) fn write_atomically(path: &Path, contents: &[u8]) -> StorageResult<()> {
        let temp_path = path.with_extension("tmp");
        {
            let mut file = File::create(&temp_path)?;
            file.write_all(contents)?;
            file.sync_all()?;
        }
        fs::rename(&temp_path, path)?;
        Ok(())
    }

    /// Append one row to a CSV log, writing the header first if the log is new.
    /// The row is encoded up front and written with a single call.
    pub(crate) fn append_row<T: Serialize>(path: &Path, columns: &[&str], row: &T) -> StorageResult<()> {
        let mut encoded = Vec::new();

        let needs_header = !path.exists() || fs::metadata(path)?.len() == 0;
        if !needs_header && !Self::ends_with_newline(path)? {
            encoded.push(b'\n');
        }

        {
            let mut writer = WriterBuilder::new().has_headers(false).from_writer(&mut encoded);
            if needs_header {
                writer.write_record(columns)?;
            }
            writer.serialize(row)?;
            writer.flush()?;
        }

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(&encoded)?;
        file.flush()?;
        Ok(())
    }

    /// Rewrite a log whose header differs from `columns` so appends line up.
    /// Rows are read by their old header names; columns it lacks take defaults.
    /// Returns whether the log was rewritten.
    pub(crate) fn migrate_columns<T>(&self, path: &Path, columns: &[&str]) -> StorageResult<bool>
    where
        T: Serialize + DeserializeOwned,
    {
        if !path.exists() || fs::metadata(path)?.len() == 0 {
            return Ok(false);
        }

        let mut reader = ReaderBuilder::new().trim(csv::Trim::Headers).from_path(path)?;
        if reader.headers()?.iter().eq(columns.iter().copied()) {
            return Ok(false);
        }

        let rows: Vec<T> = self.read_table(path)?;
        let encoded = Self::encode_table(columns, &rows)?;
        Self::write_atomically(path, &encoded)?;
        info!("Migrated {} to columns {} ({} rows)", path.display(), columns.join(","), rows.len());
        Ok(true)
    }

    fn ends_with_newline(path: &Path) -> StorageResult<bool> {
        let mut file = File::open(path)?;
        file.seek(SeekFrom::End(-1))?;
        let mut last = [0u8; 1];
        file.read_exact(&mut last)?;
        Ok(last[0] == b'\n')
    }

    /// Version and mirror a school file after it was written.
    /// Git and sync failures are logged and never fail the write itself.
    pub(crate) async fn after_write(&self, school: &str, file_name: &str, action_description: &str) {
        let school_dir = self.get_school_directory(school);

        if let Some(git_manager) = &self.git_manager {
            let _ = git_manager
                .commit_file_change(&school_dir, file_name, action_description)
                .await;
        }

        self.mirror(school, file_name).await;
    }

    /// Push one school file to the remote mirror, if one is configured
    pub(crate) async fn mirror(&self, school: &str, file_name: &str) {
        let Some(blob_sync) = &self.blob_sync else {
            return;
        };

        let local_path = self.get_school_file_path(school, file_name);
        let remote_path = self.remote_path(school, file_name);
        match blob_sync.push(&local_path, &remote_path).await {
            Ok(true) => debug!("Mirrored {} to {}", local_path.display(), remote_path),
            Ok(false) => warn!("Remote mirror rejected {}", remote_path),
            Err(e) => warn!("Failed to mirror {}: {}", remote_path, e),
        }
    }

    /// Pull school files that are missing locally from the remote mirror
    pub async fn restore_missing_files(&self, schools: &[String]) -> usize {
        let Some(blob_sync) = &self.blob_sync else {
            return 0;
        };

        let mut restored = 0;
        for school in schools {
            let school_dir = self.get_school_directory(school);
            for file_name in SYNCED_FILES {
                let local_path = school_dir.join(file_name);
                if local_path.exists() {
                    continue;
                }
                let remote_path = self.remote_path(school, file_name);
                match blob_sync.restore(&remote_path, &local_path).await {
                    Ok(true) => {
                        info!("Restored {} from remote mirror", local_path.display());
                        restored += 1;
                    }
                    Ok(false) => debug!("No remote copy of {}", remote_path),
                    Err(e) => warn!("Failed to restore {}: {}", remote_path, e),
                }
            }
        }
        restored
    }
}

impl Connection for CsvConnection {
    type StudentRepository = super::student_repository::StudentRepository;
    type PaymentRepository = super::payment_repository::PaymentRepository;
    type NotificationRepository = super::notification_repository::NotificationRepository;

    fn create_student_repository(&self) -> Self::StudentRepository {
        super::student_repository::StudentRepository::new(self.clone())
    }

    fn create_payment_repository(&self) -> Self::PaymentRepository {
        super::payment_repository::PaymentRepository::new(self.clone())
    }

    fn create_notification_repository(&self) -> Self::NotificationRepository {
        super::notification_repository::NotificationRepository::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Row {
        message: String,
        timestamp: String,
    }

    fn row(message: &str) -> Row {
        Row {
            message: message.to_string(),
            timestamp: "2025-06-01T08:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_school_paths_use_safe_keys() {
        let temp_dir = TempDir::new().unwrap();
        let connection = CsvConnection::new(temp_dir.path()).unwrap();

        assert_eq!(
            connection.get_school_file_path("Sunshine School", STUDENTS_FILE),
            temp_dir.path().join("sunshine_school").join("students.csv")
        );
        assert_eq!(connection.remote_path("School B", PAYMENTS_FILE), "school_b/payments.csv");
    }

    #[test]
    fn test_missing_table_reads_empty_without_creating_files() {
        let temp_dir = TempDir::new().unwrap();
        let connection = CsvConnection::new(temp_dir.path()).unwrap();
        let path = connection.get_school_file_path("School A", NOTIFICATIONS_FILE);

        let rows: Vec<Row> = connection.read_table(&path).unwrap();
        assert!(rows.is_empty());
        assert!(!connection.get_school_directory("School A").exists());
    }

    #[test]
    fn test_append_row_writes_header_once() {
        let temp_dir = TempDir::new().unwrap();
        let connection = CsvConnection::new(temp_dir.path()).unwrap();
        connection.ensure_school_directory("School A").unwrap();
        let path = connection.get_school_file_path("School A", NOTIFICATIONS_FILE);

        CsvConnection::append_row(&path, &["message", "timestamp"], &row("first")).unwrap();
        CsvConnection::append_row(&path, &["message", "timestamp"], &row("second, with comma")).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().next(), Some("message,timestamp"));
        assert_eq!(contents.matches("message,timestamp").count(), 1);

        let rows: Vec<Row> = connection.read_table(&path).unwrap();
        assert_eq!(rows, vec![row("first"), row("second, with comma")]);
    }

    #[test]
    fn test_append_row_repairs_missing_trailing_newline() {
        let temp_dir = TempDir::new().unwrap();
        let connection = CsvConnection::new(temp_dir.path()).unwrap();
        connection.ensure_school_directory("School A").unwrap();
        let path = connection.get_school_file_path("School A", NOTIFICATIONS_FILE);
        fs::write(&path, "message,timestamp\nlegacy,2025-01-01T00:00:00Z").unwrap();

        CsvConnection::append_row(&path, &["message", "timestamp"], &row("fresh")).unwrap();

        let rows: Vec<Row> = connection.read_table(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].message, "legacy");
        assert_eq!(rows[1], row("fresh"));
    }

    #[test]
    fn test_write_atomically_replaces_contents() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("students.csv");

        CsvConnection::write_atomically(&path, b"old").unwrap();
        CsvConnection::write_atomically(&path, b"new").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_encode_empty_table_keeps_header() {
        let bytes = CsvConnection::encode_table::<Row>(&["message", "timestamp"], &[]).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "message,timestamp\n");
    }
}
