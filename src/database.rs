use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, types::Type};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use crate::models::Todo;
use crate::store::{self, StoreError, TodoStore};
use crate::utils::{self, format_timestamp, parse_timestamp};

const TODO_COLUMNS: &str = "id, title, description, due_date, resolved, created_at, updated_at";

/// SQLite-backed todo store
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Create a new database connection and initialize the schema
    pub fn new(path: &str) -> Result<Self, StoreError> {
        let db_path = PathBuf::from(path);

        // Create parent directory if it doesn't exist
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StoreError::Directory(e.to_string()))?;
            }
        }

        let conn = Connection::open(&db_path)?;
        Self::with_connection(conn)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        initialize_schema(&conn)?;
        Ok(Database {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

/// Initialize the database schema (tables and indexes)
fn initialize_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS todos (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            title           TEXT NOT NULL CHECK (length(title) > 0),
            description     TEXT,
            due_date        TEXT,
            resolved        INTEGER NOT NULL DEFAULT 0,
            created_at      TEXT NOT NULL,
            updated_at      TEXT NOT NULL
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_todos_created_at ON todos(created_at)",
        [],
    )?;
    Ok(())
}

fn timestamp_column(row: &rusqlite::Row, idx: usize) -> Result<DateTime<Utc>, rusqlite::Error> {
    let raw: String = row.get(idx)?;
    parse_timestamp(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Map a row selected with `TODO_COLUMNS` to a Todo
fn row_to_todo(row: &rusqlite::Row) -> Result<Todo, rusqlite::Error> {
    let due_date = match row.get::<_, Option<String>>(3)? {
        Some(raw) => Some(
            parse_timestamp(&raw).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e))
            })?,
        ),
        None => None,
    };

    Ok(Todo {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        due_date,
        resolved: row.get::<_, i64>(4)? != 0,
        created_at: timestamp_column(row, 5)?,
        updated_at: timestamp_column(row, 6)?,
    })
}

fn fetch(conn: &Connection, id: i64) -> Result<Todo, StoreError> {
    let mut stmt = conn.prepare(&format!("SELECT {TODO_COLUMNS} FROM todos WHERE id = ?1"))?;
    stmt.query_row(rusqlite::params![id], row_to_todo)
        .optional()?
        .ok_or(StoreError::NotFound(id))
}

impl TodoStore for Database {
    fn create(
        &self,
        title: &str,
        description: Option<&str>,
        due_date: Option<DateTime<Utc>>,
    ) -> Result<Todo, StoreError> {
        let title = store::validate_title(title)?;
        store::validate_due_date(due_date.as_ref())?;
        let description = store::normalize_description(description);
        let now = utils::now();

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO todos (title, description, due_date, resolved, created_at, updated_at)
             VALUES (?1, ?2, ?3, 0, ?4, ?5)",
            rusqlite::params![
                title,
                description,
                due_date.as_ref().map(format_timestamp),
                format_timestamp(&now),
                format_timestamp(&now)
            ],
        )?;

        Ok(Todo {
            id: conn.last_insert_rowid(),
            title: title.to_string(),
            description,
            due_date,
            resolved: false,
            created_at: now,
            updated_at: now,
        })
    }

    fn get(&self, id: i64) -> Result<Todo, StoreError> {
        let conn = self.lock()?;
        fetch(&conn, id)
    }

    fn update(
        &self,
        id: i64,
        title: &str,
        description: Option<&str>,
        due_date: Option<DateTime<Utc>>,
    ) -> Result<Todo, StoreError> {
        let conn = self.lock()?;
        let mut todo = fetch(&conn, id)?;
        let title = store::validate_title(title)?;
        store::validate_due_date(due_date.as_ref())?;

        todo.title = title.to_string();
        todo.description = store::normalize_description(description);
        todo.due_date = due_date;
        todo.updated_at = store::next_updated_at(todo.updated_at);

        conn.execute(
            "UPDATE todos SET title = ?1, description = ?2, due_date = ?3, updated_at = ?4
             WHERE id = ?5",
            rusqlite::params![
                todo.title,
                todo.description,
                todo.due_date.as_ref().map(format_timestamp),
                format_timestamp(&todo.updated_at),
                id
            ],
        )?;
        Ok(todo)
    }

    fn delete(&self, id: i64) -> Result<(), StoreError> {
        let conn = self.lock()?;
        let removed = conn.execute("DELETE FROM todos WHERE id = ?1", rusqlite::params![id])?;
        if removed == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    fn set_resolved(&self, id: i64, resolved: bool) -> Result<Todo, StoreError> {
        let conn = self.lock()?;
        let mut todo = fetch(&conn, id)?;
        todo.resolved = resolved;
        todo.updated_at = store::next_updated_at(todo.updated_at);

        conn.execute(
            "UPDATE todos SET resolved = ?1, updated_at = ?2 WHERE id = ?3",
            rusqlite::params![
                if resolved { 1 } else { 0 },
                format_timestamp(&todo.updated_at),
                id
            ],
        )?;
        Ok(todo)
    }

    fn list_all(&self) -> Result<Vec<Todo>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {TODO_COLUMNS} FROM todos ORDER BY created_at DESC, id DESC"
        ))?;
        let todos = stmt
            .query_map([], row_to_todo)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(todos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_parent_directories() {
        let dir = std::env::temp_dir().join(format!("todos-db-test-{}", std::process::id()));
        let path = dir.join("nested").join("todos.db");
        let _ = std::fs::remove_dir_all(&dir);

        let db = Database::new(path.to_str().unwrap()).unwrap();
        db.create("Persisted", None, None).unwrap();
        drop(db);

        let reopened = Database::new(path.to_str().unwrap()).unwrap();
        let todos = reopened.list_all().unwrap();
        assert_eq!(todos.len(), 1);
        assert_eq!(todos[0].title, "Persisted");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn rows_round_trip_every_column() {
        let db = Database::open_in_memory().unwrap();
        let due = utils::parse_due_date("2030-01-02T03:04:05.678901Z");
        let created = db.create("Full", Some("All fields"), due).unwrap();

        let fetched = db.get(created.id).unwrap();
        assert_eq!(fetched, created);
    }

    #[test]
    fn schema_rejects_empty_titles() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.lock().unwrap();
        let result = conn.execute(
            "INSERT INTO todos (title, created_at, updated_at) VALUES ('', 'x', 'x')",
            [],
        );
        assert!(result.is_err());
    }
}
