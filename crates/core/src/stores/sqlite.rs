//! SQLite-backed primary store.
//!
//! One table, `user_queries`, with the canonical record id as primary key. Timestamps are stored
//! as RFC 3339 UTC text with fixed microsecond precision so lexical order is chronological order.

use super::{QueryRecord, QueryStore};
use crate::error::StoreError;
use crate::intake::Intake;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use quackhub_uuid::RecordId;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const MIGRATIONS: [(i64, &str); 1] = [(1, include_str!("../../migrations/001_user_queries.sql"))];

const ID_ALLOCATION_ATTEMPTS: usize = 5;

const SELECT_COLUMNS: &str = "SELECT id, symptoms, age, sex, weight, height, duration, severity,
        created_at, is_emergency
     FROM user_queries";

/// Primary store over a single SQLite connection.
pub struct SqliteQueryStore {
    conn: Mutex<Connection>,
}

impl std::fmt::Debug for SqliteQueryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteQueryStore").finish_non_exhaustive()
    }
}

impl SqliteQueryStore {
    /// Opens (creating if needed) the database at `path` and runs pending migrations.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if:
    /// - the parent directory cannot be created,
    /// - the database cannot be opened,
    /// - a migration fails.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(StoreError::StorageDirCreation)?;
        }

        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Highest applied schema version.
    pub fn schema_version(&self) -> Result<i64, StoreError> {
        Ok(current_version(&*self.lock()?))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }
}

/// Runs every migration newer than the recorded schema version.
pub fn run_migrations(conn: &Connection) -> Result<(), StoreError> {
    let current = current_version(conn);

    for (version, sql) in MIGRATIONS {
        if version > current {
            tracing::info!("Running primary store migration v{version}");
            conn.execute_batch(sql)
                .map_err(|e| StoreError::MigrationFailed {
                    version,
                    reason: e.to_string(),
                })?;
        }
    }

    Ok(())
}

/// 0 when the schema has not been created yet.
fn current_version(conn: &Connection) -> i64 {
    conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| {
        row.get::<_, i64>(0)
    })
    .unwrap_or(0)
}

fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::InvalidRow(format!("bad created_at '{}': {}", raw, e)))
}

type RawRow = (
    String,
    String,
    Option<i64>,
    Option<String>,
    Option<f64>,
    Option<f64>,
    Option<String>,
    Option<i64>,
    String,
    bool,
);

fn read_row(row: &Row<'_>) -> rusqlite::Result<RawRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
        row.get(9)?,
    ))
}

fn into_record(raw: RawRow) -> Result<QueryRecord, StoreError> {
    let (id, symptoms, age, sex, weight, height, duration, severity, created_at, is_emergency) =
        raw;

    Ok(QueryRecord {
        id: RecordId::parse(&id).map_err(|e| StoreError::InvalidRow(e.to_string()))?,
        symptoms,
        age,
        sex,
        weight,
        height,
        duration,
        severity,
        created_at: parse_timestamp(&created_at)?,
        is_emergency,
    })
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

impl QueryStore for SqliteQueryStore {
    fn insert(&self, intake: &Intake, created_at: DateTime<Utc>) -> Result<QueryRecord, StoreError> {
        let created_at = created_at.trunc_subsecs(6);
        let conn = self.lock()?;

        // Bounded retries on id collision.
        for _attempt in 0..ID_ALLOCATION_ATTEMPTS {
            let id = RecordId::new();
            let exists: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM user_queries WHERE id = ?1",
                    params![id.to_string()],
                    |row| row.get(0),
                )
                .optional()?;
            if exists.is_some() {
                continue;
            }

            let inserted = conn.execute(
                "INSERT INTO user_queries
                 (id, symptoms, age, sex, weight, height, duration, severity, created_at, is_emergency)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 0)",
                params![
                    id.to_string(),
                    intake.symptoms.as_str(),
                    intake.age,
                    intake.sex,
                    intake.weight,
                    intake.height,
                    intake.duration,
                    intake.severity,
                    format_timestamp(&created_at),
                ],
            );

            match inserted {
                Ok(_) => {
                    return Ok(QueryRecord {
                        id,
                        symptoms: intake.symptoms.as_str().to_string(),
                        age: intake.age,
                        sex: intake.sex.clone(),
                        weight: intake.weight,
                        height: intake.height,
                        duration: intake.duration.clone(),
                        severity: intake.severity,
                        created_at,
                        is_emergency: false,
                    })
                }
                Err(e) if is_constraint_violation(&e) => {
                    // Only a primary-key clash is worth another attempt.
                    let clash: Option<i64> = conn
                        .query_row(
                            "SELECT 1 FROM user_queries WHERE id = ?1",
                            params![id.to_string()],
                            |row| row.get(0),
                        )
                        .optional()?;
                    if clash.is_none() {
                        return Err(StoreError::Sqlite(e));
                    }
                }
                Err(e) => return Err(StoreError::Sqlite(e)),
            }
        }

        Err(StoreError::IdAllocation(ID_ALLOCATION_ATTEMPTS))
    }

    fn set_emergency(&self, id: &RecordId, is_emergency: bool) -> Result<(), StoreError> {
        let changed = self.lock()?.execute(
            "UPDATE user_queries SET is_emergency = ?1 WHERE id = ?2",
            params![is_emergency, id.to_string()],
        )?;

        if changed == 0 {
            return Err(StoreError::NotFound(*id));
        }
        Ok(())
    }

    fn get(&self, id: &RecordId) -> Result<Option<QueryRecord>, StoreError> {
        let conn = self.lock()?;
        let raw = conn
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE id = ?1"),
                params![id.to_string()],
                read_row,
            )
            .optional()?;

        raw.map(into_record).transpose()
    }

    fn recent(&self, limit: usize) -> Result<Vec<QueryRecord>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "{SELECT_COLUMNS} ORDER BY created_at DESC, rowid DESC LIMIT ?1"
        ))?;

        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt.query_map(params![limit], read_row)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(into_record(row?)?);
        }
        Ok(records)
    }

    fn count(&self) -> Result<u64, StoreError> {
        let count: i64 = self
            .lock()?
            .query_row("SELECT COUNT(*) FROM user_queries", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_emergencies(&self) -> Result<u64, StoreError> {
        let count: i64 = self.lock()?.query_row(
            "SELECT COUNT(*) FROM user_queries WHERE is_emergency = 1",
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}
