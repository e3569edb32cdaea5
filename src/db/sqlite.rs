use std::path::Path;
use std::time::Duration;

use rusqlite::{Connection, OptionalExtension};

use super::DatabaseError;

/// Ordered schema steps for the artifact database.
const MIGRATIONS: &[(i64, &str)] = &[(
    1,
    include_str!("../../resources/migrations/001_model_artifacts.sql"),
)];

/// Another process may be saving an artifact; wait this long for its lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open (or create) the artifact database at `path` and bring it up to date.
pub fn open_database(path: &Path) -> Result<Connection, DatabaseError> {
    let conn = Connection::open(path)?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    run_migrations(&conn)?;
    tracing::debug!(path = %path.display(), version = schema_version(&conn)?, "Artifact database ready");
    Ok(conn)
}

/// Migrated in-memory database (tests, throwaway stores).
pub fn open_memory_database() -> Result<Connection, DatabaseError> {
    let conn = Connection::open_in_memory()?;
    run_migrations(&conn)?;
    Ok(conn)
}

/// Apply every migration newer than the recorded schema version.
pub fn run_migrations(conn: &Connection) -> Result<(), DatabaseError> {
    let current = schema_version(conn)?;

    for &(version, sql) in MIGRATIONS.iter().filter(|(v, _)| *v > current) {
        tracing::info!(version, "Running artifact database migration");
        conn.execute_batch(sql)
            .map_err(|e| DatabaseError::MigrationFailed {
                version,
                reason: e.to_string(),
            })?;
    }

    Ok(())
}

/// Highest applied migration, 0 for a fresh database.
pub fn schema_version(conn: &Connection) -> Result<i64, DatabaseError> {
    let has_table = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'schema_version'",
            [],
            |_| Ok(()),
        )
        .optional()?
        .is_some();
    if !has_table {
        return Ok(0);
    }

    let version: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(version.unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_database_has_artifact_schema() {
        let conn = open_memory_database().unwrap();
        let mut stmt = conn
            .prepare(
                "SELECT name FROM sqlite_master
                 WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
                 ORDER BY name",
            )
            .unwrap();
        let tables: Vec<String> = stmt
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(tables, vec!["model_artifacts", "schema_version"]);
        assert_eq!(schema_version(&conn).unwrap(), 1);
    }

    #[test]
    fn unmigrated_database_reports_version_zero() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(schema_version(&conn).unwrap(), 0);
    }

    #[test]
    fn rerunning_migrations_is_a_no_op() {
        let conn = open_memory_database().unwrap();
        run_migrations(&conn).unwrap();
        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn file_database_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("artifacts.db");
        {
            let conn = open_database(&path).unwrap();
            conn.execute(
                "INSERT INTO model_artifacts (name, payload) VALUES ('m', '{}')",
                [],
            )
            .unwrap();
        }
        let conn = open_database(&path).unwrap();
        let payload: String = conn
            .query_row("SELECT payload FROM model_artifacts WHERE name = 'm'", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(payload, "{}");
        assert_eq!(schema_version(&conn).unwrap(), 1);
    }

    #[test]
    fn updated_at_is_filled_by_default() {
        let conn = open_memory_database().unwrap();
        conn.execute(
            "INSERT INTO model_artifacts (name, payload) VALUES ('m', 'x')",
            [],
        )
        .unwrap();
        let stamp: String = conn
            .query_row("SELECT updated_at FROM model_artifacts WHERE name = 'm'", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert!(!stamp.is_empty());
    }
}
