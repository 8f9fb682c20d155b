use std::path::Path;

use chrono::{NaiveDate, NaiveTime};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;

use crate::error::StoreError;
use crate::models::{format_date, format_time, Category, Status, Task, DATE_FORMAT, TIME_FORMAT};
use crate::storage::Mirror;

pub const CREATE_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS tasks (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    category TEXT NOT NULL DEFAULT 'general',
    priority INTEGER NOT NULL DEFAULT 3,
    deadline TEXT NOT NULL DEFAULT '',
    start_time TEXT NOT NULL DEFAULT '',
    duration INTEGER NOT NULL DEFAULT 30,
    status INTEGER NOT NULL DEFAULT 0
);
"#;

pub const PRAGMAS: &str = r#"
PRAGMA journal_mode = WAL;
PRAGMA busy_timeout = 5000;
PRAGMA synchronous = NORMAL;
"#;

const SELECT_COLUMNS: &str =
    "SELECT id, name, category, priority, deadline, start_time, duration, status FROM tasks";

/// Task rows in a SQLite `tasks` table.
///
/// Dates and times are stored as zero-padded text (`''` when unset), so
/// `ORDER BY` on them is chronological.
pub struct SqliteMirror {
    conn: Connection,
}

impl SqliteMirror {
    /// Open or create a database at the given path.
    pub fn open(path: &Path) -> Result<SqliteMirror, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StoreError::Io(format!("create dir: {e}")))?;
            }
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(PRAGMAS)
            .map_err(|e| StoreError::Database(format!("pragmas: {e}")))?;
        conn.execute_batch(CREATE_TABLES)
            .map_err(|e| StoreError::Database(format!("schema: {e}")))?;
        info!(path = %path.display(), "database opened");
        Ok(SqliteMirror { conn })
    }

    /// Open an in-memory database (for testing).
    pub fn in_memory() -> Result<SqliteMirror, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(CREATE_TABLES)
            .map_err(|e| StoreError::Database(format!("schema: {e}")))?;
        Ok(SqliteMirror { conn })
    }
}

/// The SQLite key for `id`. Ids past `i64::MAX` cannot be stored.
fn row_id(id: u64) -> Result<i64, StoreError> {
    i64::try_from(id).map_err(|_| StoreError::Database(format!("id {id} exceeds the database key range")))
}

/// A row as stored, before the text columns are interpreted.
struct RawRow {
    id: i64,
    name: String,
    category: String,
    priority: i64,
    deadline: String,
    start_time: String,
    duration: i64,
    status: i64,
}

impl RawRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRow> {
        Ok(RawRow {
            id: row.get(0)?,
            name: row.get(1)?,
            category: row.get(2)?,
            priority: row.get(3)?,
            deadline: row.get(4)?,
            start_time: row.get(5)?,
            duration: row.get(6)?,
            status: row.get(7)?,
        })
    }

    fn into_task(self) -> Result<Task, StoreError> {
        let id = self.id;
        let corrupt = |detail: String| StoreError::CorruptRow { id, detail };

        let category: Category = self
            .category
            .parse()
            .map_err(|c| corrupt(format!("unknown category {c}")))?;
        let status = Status::from_code(self.status)
            .ok_or_else(|| corrupt(format!("unknown status {}", self.status)))?;
        let deadline = match self.deadline.trim() {
            "" => None,
            d => Some(
                NaiveDate::parse_from_str(d, DATE_FORMAT)
                    .map_err(|_| corrupt(format!("bad deadline {d}")))?,
            ),
        };
        let start_time = match self.start_time.trim() {
            "" => None,
            t => Some(
                NaiveTime::parse_from_str(t, TIME_FORMAT)
                    .map_err(|_| corrupt(format!("bad start_time {t}")))?,
            ),
        };

        Ok(Task {
            id: u64::try_from(id).map_err(|_| corrupt("negative id".into()))?,
            name: self.name,
            category,
            priority: u8::try_from(self.priority)
                .map_err(|_| corrupt(format!("bad priority {}", self.priority)))?,
            deadline,
            start_time,
            duration: u32::try_from(self.duration)
                .map_err(|_| corrupt(format!("bad duration {}", self.duration)))?,
            status,
        })
    }
}

impl Mirror for SqliteMirror {
    fn list(&self) -> Result<Vec<Task>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "{SELECT_COLUMNS} ORDER BY status ASC, priority ASC, deadline ASC, start_time ASC, id ASC"
        ))?;
        let rows = stmt
            .query_map([], RawRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(RawRow::into_task).collect()
    }

    fn get(&self, id: u64) -> Result<Option<Task>, StoreError> {
        let Ok(key) = i64::try_from(id) else {
            return Ok(None);
        };
        let row = self
            .conn
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE id = ?1"),
                [key],
                RawRow::from_row,
            )
            .optional()?;
        row.map(RawRow::into_task).transpose()
    }

    fn insert(&mut self, task: &Task) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO tasks (id, name, category, priority, deadline, start_time, duration, status) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                row_id(task.id)?,
                task.name,
                task.category.as_str(),
                i64::from(task.priority),
                format_date(task.deadline),
                format_time(task.start_time),
                i64::from(task.duration),
                task.status.code(),
            ],
        )?;
        Ok(())
    }

    fn update(&mut self, task: &Task) -> Result<bool, StoreError> {
        let changed = self.conn.execute(
            "UPDATE tasks SET name = ?2, category = ?3, priority = ?4, deadline = ?5, \
             start_time = ?6, duration = ?7, status = ?8 WHERE id = ?1",
            params![
                row_id(task.id)?,
                task.name,
                task.category.as_str(),
                i64::from(task.priority),
                format_date(task.deadline),
                format_time(task.start_time),
                i64::from(task.duration),
                task.status.code(),
            ],
        )?;
        Ok(changed > 0)
    }

    fn delete(&mut self, id: u64) -> Result<bool, StoreError> {
        let Ok(key) = i64::try_from(id) else {
            return Ok(false);
        };
        let changed = self.conn.execute("DELETE FROM tasks WHERE id = ?1", [key])?;
        Ok(changed > 0)
    }
}
