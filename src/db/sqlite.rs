use std::path::Path;

use rusqlite::Connection;

use super::DatabaseError;

/// Migration v1: the `patients` table, one row per site-assigned `same_id`.
///
/// Columns the miner never writes (convenio, telefone, setor, endereco,
/// birth_date, age) are filled in by other site tooling that shares this
/// database, so the schema keeps them.
const MIGRATION_V1: &str = "
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY
);

CREATE TABLE IF NOT EXISTS patients (
    same_id TEXT PRIMARY KEY,
    patient_name TEXT,
    birth_date TEXT,
    age TEXT,
    last_exam_date TEXT,
    last_file TEXT,
    context TEXT,
    full_text TEXT,
    ai_analysis TEXT,
    ai_model TEXT,
    is_eligible INTEGER DEFAULT 0,
    convenio TEXT,
    telefone TEXT,
    setor TEXT,
    endereco TEXT,
    exam_title TEXT,
    exam_modality TEXT,
    medical_specialty TEXT,
    tumor_findings TEXT,
    tumor_location TEXT,
    tumor_characteristics TEXT,
    malignancy_score INTEGER DEFAULT 0,
    urgency_level TEXT DEFAULT 'BAIXA',
    urgency_reason TEXT,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);

CREATE TRIGGER IF NOT EXISTS update_patients_timestamp
AFTER UPDATE ON patients
BEGIN
    UPDATE patients SET updated_at = CURRENT_TIMESTAMP
    WHERE same_id = NEW.same_id;
END;

INSERT INTO schema_version (version) VALUES (1);
";

/// Open a SQLite connection to the given path and run migrations
pub fn open_database(path: &Path) -> Result<Connection, DatabaseError> {
    let conn = Connection::open(path)?;
    configure_pragmas(&conn)?;
    run_migrations(&conn)?;
    Ok(conn)
}

/// Open an existing database without migrating it (dashboard read path,
/// uploaded-file validation).
pub fn open_database_readonly_schema(path: &Path) -> Result<Connection, DatabaseError> {
    let conn = Connection::open(path)?;
    configure_pragmas(&conn)?;
    Ok(conn)
}

/// Open an in-memory database (for testing)
pub fn open_memory_database() -> Result<Connection, DatabaseError> {
    let conn = Connection::open_in_memory()?;
    configure_pragmas(&conn)?;
    run_migrations(&conn)?;
    Ok(conn)
}

fn configure_pragmas(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute_batch(
        "PRAGMA journal_mode=DELETE;
         PRAGMA foreign_keys=ON;",
    )?;
    Ok(())
}

/// Run all pending migrations
pub fn run_migrations(conn: &Connection) -> Result<(), DatabaseError> {
    let current_version = get_current_version(conn);

    let migrations: Vec<(i64, &str)> = vec![(1, MIGRATION_V1)];

    for (version, sql) in migrations {
        if version > current_version {
            tracing::info!("Running migration v{version}");
            conn.execute_batch(sql)
                .map_err(|e| DatabaseError::MigrationFailed {
                    version,
                    reason: e.to_string(),
                })?;
        }
    }

    Ok(())
}

/// Get the current schema version (0 if no schema exists yet)
fn get_current_version(conn: &Connection) -> i64 {
    conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| {
        row.get::<_, i64>(0)
    })
    .unwrap_or(0)
}

/// Verify that a database file carries the `patients` table.
///
/// Used before swapping in an uploaded database file; the upload is rejected
/// when the table is missing.
pub fn validate_patients_table(path: &Path) -> Result<(), DatabaseError> {
    let conn = open_database_readonly_schema(path)?;
    let found: Option<String> = conn
        .query_row(
            "SELECT name FROM sqlite_master WHERE type='table' AND name='patients'",
            [],
            |row| row.get(0),
        )
        .ok();
    match found {
        Some(_) => Ok(()),
        None => Err(DatabaseError::InvalidDatabase(
            "table 'patients' not found".into(),
        )),
    }
}

/// Count tables in the database (for verification)
pub fn count_tables(conn: &Connection) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |row| row.get::<_, i64>(0),
    )?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_initializes_tables() {
        let conn = open_memory_database().unwrap();
        // patients + schema_version
        let count = count_tables(&conn).unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn schema_version_is_current() {
        let conn = open_memory_database().unwrap();
        let version: i64 = conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(version, 1);
    }

    #[test]
    fn migration_idempotent() {
        let conn = open_memory_database().unwrap();
        // Run migrations again — should not error
        let result = run_migrations(&conn);
        assert!(result.is_ok());
    }

    #[test]
    fn update_trigger_refreshes_timestamp() {
        let conn = open_memory_database().unwrap();
        conn.execute(
            "INSERT INTO patients (same_id, patient_name, updated_at)
             VALUES ('S-1', 'A', '2000-01-01 00:00:00')",
            [],
        )
        .unwrap();
        conn.execute(
            "UPDATE patients SET patient_name = 'B' WHERE same_id = 'S-1'",
            [],
        )
        .unwrap();
        let updated: String = conn
            .query_row(
                "SELECT updated_at FROM patients WHERE same_id = 'S-1'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_ne!(updated, "2000-01-01 00:00:00");
    }

    #[test]
    fn validate_accepts_migrated_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("good.db");
        open_database(&path).unwrap();
        assert!(validate_patients_table(&path).is_ok());
    }

    #[test]
    fn validate_rejects_file_without_patients_table() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("other.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute("CREATE TABLE notes (id INTEGER PRIMARY KEY)", [])
            .unwrap();
        drop(conn);
        assert!(matches!(
            validate_patients_table(&path),
            Err(DatabaseError::InvalidDatabase(_))
        ));
    }
}
