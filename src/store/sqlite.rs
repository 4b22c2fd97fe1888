//! SQLite-backed store.

use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::types::ValueRef;
use rusqlite::{Connection, ErrorCode};

use super::{RequestContext, Row, Store, StoreError, StoreResult};
use crate::sql::Dialect;
use crate::value::Value;

/// Virtual machine instructions between deadline/cancel checks.
const PROGRESS_INTERVAL: i32 = 1_000;

/// A store over one SQLite connection.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a database file.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Ok(Self::from_connection(Connection::open(path)?))
    }

    /// Open an in-memory database.
    pub fn open_in_memory() -> StoreResult<Self> {
        Ok(Self::from_connection(Connection::open_in_memory()?))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Run statements without results (schema setup, fixtures).
    pub fn execute_batch(&self, sql: &str) -> StoreResult<()> {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        conn.execute_batch(sql)?;
        Ok(())
    }
}

impl Store for SqliteStore {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn query(&self, sql: &str, ctx: &RequestContext) -> StoreResult<Vec<Row>> {
        ctx.check()?;
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;

        let watched = ctx.clone();
        conn.progress_handler(
            PROGRESS_INTERVAL,
            Some(move || watched.is_cancelled() || watched.is_expired()),
        );
        let result = read_rows(&conn, sql);
        conn.progress_handler(0, None::<fn() -> bool>);

        result.map_err(|err| {
            if err.sqlite_error_code() == Some(ErrorCode::OperationInterrupted) {
                ctx.interruption()
            } else {
                StoreError::Sqlite(err)
            }
        })
    }
}

fn read_rows(conn: &Connection, sql: &str) -> rusqlite::Result<Vec<Row>> {
    let mut stmt = conn.prepare(sql)?;
    let columns: Arc<[String]> = stmt
        .column_names()
        .into_iter()
        .map(String::from)
        .collect();
    let width = columns.len();

    let rows = stmt.query_map([], |row| {
        (0..width)
            .map(|i| row.get_ref(i).map(to_value))
            .collect::<rusqlite::Result<Vec<Value>>>()
    })?;

    rows.map(|values| values.map(|values| Row::new(columns.clone(), values)))
        .collect()
}

fn to_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(n) => Value::Int(n),
        ValueRef::Real(f) => Value::Float(f),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Value::Text(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}
