use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rusqlite::{params, Connection};

use super::StoreError;
use crate::db::sqlite::open_database;

/// Durable storage for named, opaque model artifacts.
///
/// Concurrent saves of the same name are not coordinated: last writer wins.
pub trait ModelStore: Send + Sync {
    /// `Ok(None)` when no artifact with this name exists yet.
    fn load(&self, name: &str) -> Result<Option<String>, StoreError>;

    fn save(&self, name: &str, payload: &str) -> Result<(), StoreError>;
}

// ═══════════════════════════════════════════
// File-backed store
// ═══════════════════════════════════════════

/// One `<name>.json` file per artifact in a directory.
pub struct FileModelStore {
    dir: PathBuf,
}

impl FileModelStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn artifact_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }
}

impl ModelStore for FileModelStore {
    fn load(&self, name: &str) -> Result<Option<String>, StoreError> {
        match std::fs::read_to_string(self.artifact_path(name)) {
            Ok(payload) => Ok(Some(payload)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    /// Write to a temp file in the same directory, then rename over the
    /// target so readers never see a partial artifact.
    fn save(&self, name: &str, payload: &str) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(payload.as_bytes())?;
        tmp.flush()?;
        tmp.persist(self.artifact_path(name))
            .map_err(|e| StoreError::Io(e.error))?;

        tracing::debug!(artifact = name, dir = %self.dir.display(), "Model artifact saved");
        Ok(())
    }
}

// ═══════════════════════════════════════════
// SQLite-backed store
// ═══════════════════════════════════════════

/// Artifacts as rows of the `model_artifacts` table.
pub struct SqliteModelStore {
    conn: Mutex<Connection>,
}

impl SqliteModelStore {
    /// Wrap a connection that has already been migrated.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Open (or create) the artifact database at `path`.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(Self::new(open_database(path)?))
    }
}

impl ModelStore for SqliteModelStore {
    fn load(&self, name: &str) -> Result<Option<String>, StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::LockFailed)?;
        let result = conn.query_row(
            "SELECT payload FROM model_artifacts WHERE name = ?1",
            params![name],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(payload) => Ok(Some(payload)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StoreError::from(e)),
        }
    }

    fn save(&self, name: &str, payload: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::LockFailed)?;
        conn.execute(
            "INSERT INTO model_artifacts (name, payload, updated_at)
             VALUES (?1, ?2, datetime('now'))
             ON CONFLICT(name) DO UPDATE SET
                payload = excluded.payload,
                updated_at = excluded.updated_at",
            params![name, payload],
        )?;

        tracing::debug!(artifact = name, "Model artifact saved to database");
        Ok(())
    }
}
