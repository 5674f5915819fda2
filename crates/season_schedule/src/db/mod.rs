/// Database module for stored practice sessions

mod types;

pub use types::DbSession;

use crate::schedule::SessionRecord;
use rusqlite::{Connection, OptionalExtension, Result, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

const SCHEMA_SQL: &str = include_str!("../../../../sql/init_sessions.sql");

const SELECT_COLUMNS: &str = "SELECT session_id, program, startdate, enddate, starttime, endtime,
        daysofweek, timezone, created_at
 FROM sessions";

pub struct SessionDbManager {
    db: Mutex<Connection>,
}

impl SessionDbManager {
    /// Opens (or creates) the database at `db_path` and applies the schema
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        Self::with_connection(conn)
    }

    /// Creates a manager backed by a private in-memory database
    pub fn in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            db: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.db.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Inserts a session, replacing any existing row with the same id
    pub fn insert_session(&self, session: &DbSession) -> Result<()> {
        let db = self.conn();
        let record = &session.record;

        db.execute(
            "INSERT INTO sessions (
                session_id, program, startdate, enddate, starttime, endtime,
                daysofweek, timezone, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, datetime('now'))
            ON CONFLICT(session_id) DO UPDATE SET
                program = excluded.program,
                startdate = excluded.startdate,
                enddate = excluded.enddate,
                starttime = excluded.starttime,
                endtime = excluded.endtime,
                daysofweek = excluded.daysofweek,
                timezone = excluded.timezone",
            (
                &session.session_id,
                &session.program,
                &record.start_date,
                &record.end_date,
                &record.start_time,
                &record.end_time,
                &record.days_of_week,
                &record.timezone,
            ),
        )?;

        debug!(session_id = %session.session_id, "Stored session");
        Ok(())
    }

    /// Gets one session by id
    pub fn get_session(&self, session_id: &str) -> Result<Option<DbSession>> {
        let db = self.conn();
        let mut stmt = db.prepare(&format!("{SELECT_COLUMNS} WHERE session_id = ?"))?;
        stmt.query_row([session_id], map_session).optional()
    }

    /// Gets every stored session, ordered by start date
    pub fn get_all_sessions(&self) -> Result<Vec<DbSession>> {
        let db = self.conn();
        let mut stmt = db.prepare(&format!("{SELECT_COLUMNS} ORDER BY startdate, session_id"))?;
        let sessions = stmt.query_map([], map_session)?;
        sessions.collect()
    }

    /// Gets all sessions belonging to a program
    pub fn get_sessions_for_program(&self, program: &str) -> Result<Vec<DbSession>> {
        let db = self.conn();
        let mut stmt = db.prepare(&format!(
            "{SELECT_COLUMNS} WHERE program = ? ORDER BY startdate, session_id"
        ))?;
        let sessions = stmt.query_map([program], map_session)?;
        sessions.collect()
    }

    /// Deletes a session. Returns false if there was nothing to delete
    pub fn delete_session(&self, session_id: &str) -> Result<bool> {
        let db = self.conn();
        let removed = db.execute("DELETE FROM sessions WHERE session_id = ?", [session_id])?;
        Ok(removed > 0)
    }
}

fn map_session(row: &Row<'_>) -> Result<DbSession> {
    Ok(DbSession {
        session_id: row.get(0)?,
        program: row.get(1)?,
        record: SessionRecord {
            start_date: row.get(2)?,
            end_date: row.get(3)?,
            start_time: row.get(4)?,
            end_time: row.get(5)?,
            days_of_week: row.get(6)?,
            timezone: row.get(7)?,
        },
        created_at: row.get(8)?,
    })
}
