//! Database Connection and Setup
//!
//! Manages the SQLite connection and schema migrations.

use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::{DomainError, DomainResult, DEFAULT_DAYS};

/// Database state wrapper
///
/// One connection shared by all repositories; every request takes the lock
/// for the duration of its work, so a transaction never interleaves with
/// another request.
#[derive(Clone)]
pub struct DbState {
    pub conn: Arc<Mutex<Option<Connection>>>,
}

impl DbState {
    pub fn new() -> Self {
        Self {
            conn: Arc::new(Mutex::new(None)),
        }
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(Some(conn))),
        }
    }

    pub async fn is_ready(&self) -> bool {
        self.conn.lock().await.is_some()
    }
}

impl Default for DbState {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn not_initialized() -> DomainError {
    DomainError::Storage("Database not initialized".to_string())
}

/// Open (or create) the database at `db_path` and bring the schema up to date
///
/// `":memory:"` gives a private in-memory database.
pub async fn init_db(db_path: &Path) -> DomainResult<DbState> {
    let conn = Connection::open(db_path)
        .map_err(|e| DomainError::Storage(format!("Failed to open db: {}", e)))?;

    run_migrations(&conn)?;

    Ok(DbState::from_connection(conn))
}

/// Check if a column exists in a table
fn column_exists(conn: &Connection, table: &str, column: &str) -> DomainResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let names = stmt.query_map([], |row| row.get::<_, String>(1))?;
    for name in names {
        if name? == column {
            return Ok(true);
        }
    }
    Ok(false)
}

fn add_column_if_missing(conn: &Connection, table: &str, column: &str, definition: &str) -> DomainResult<()> {
    if !column_exists(conn, table, column)? {
        conn.execute(&format!("ALTER TABLE {} ADD COLUMN {} {}", table, column, definition), [])
            .map_err(|e| DomainError::Storage(format!("Failed to add {}.{}: {}", table, column, e)))?;
        tracing::info!(table, column, "Added missing column");
    }
    Ok(())
}

/// Run database migrations
fn run_migrations(conn: &Connection) -> DomainResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;

    // Menu tree
    conn.execute(
        "CREATE TABLE IF NOT EXISTS categories (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            is_special INTEGER NOT NULL DEFAULT 0,
            bg_color TEXT NOT NULL DEFAULT '#000000',
            badge_text TEXT NOT NULL DEFAULT 'Special',
            order_index INTEGER NOT NULL DEFAULT 0
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS subcategories (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            category_id INTEGER NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            order_index INTEGER NOT NULL DEFAULT 0
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            category_id INTEGER NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            price REAL NOT NULL CHECK (price >= 0),
            unit TEXT NOT NULL DEFAULT '',
            info TEXT NOT NULL DEFAULT '',
            order_index INTEGER NOT NULL DEFAULT 0
        )",
        [],
    )?;

    // Columns that older databases were created without
    add_column_if_missing(conn, "categories", "badge_text", "TEXT NOT NULL DEFAULT 'Special'")?;
    add_column_if_missing(conn, "items", "allergens", "TEXT NOT NULL DEFAULT ''")?;
    add_column_if_missing(
        conn,
        "items",
        "subcategory_id",
        "INTEGER REFERENCES subcategories(id) ON DELETE CASCADE",
    )?;

    conn.execute("CREATE INDEX IF NOT EXISTS idx_subcategories_category ON subcategories(category_id)", [])?;
    conn.execute("CREATE INDEX IF NOT EXISTS idx_items_category ON items(category_id)", [])?;
    conn.execute("CREATE INDEX IF NOT EXISTS idx_items_subcategory ON items(subcategory_id)", [])?;

    // Reservations
    conn.execute(
        "CREATE TABLE IF NOT EXISTS reservations (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            phone TEXT NOT NULL,
            guests INTEGER NOT NULL,
            date TEXT NOT NULL,
            time TEXT NOT NULL,
            comment TEXT NOT NULL DEFAULT '',
            status TEXT NOT NULL DEFAULT 'pending',
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;
    add_column_if_missing(conn, "reservations", "rejection_reason", "TEXT")?;

    // Website content
    conn.execute(
        "CREATE TABLE IF NOT EXISTS opening_hours (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            day_name TEXT NOT NULL UNIQUE,
            hours TEXT NOT NULL DEFAULT '',
            order_index INTEGER NOT NULL DEFAULT 0
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS website_settings (
            setting_key TEXT PRIMARY KEY,
            setting_value TEXT NOT NULL DEFAULT ''
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS gallery_images (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            src TEXT NOT NULL UNIQUE,
            alt TEXT NOT NULL DEFAULT '',
            description TEXT NOT NULL DEFAULT '',
            span TEXT NOT NULL DEFAULT '',
            order_index INTEGER NOT NULL DEFAULT 0
        )",
        [],
    )?;

    seed_opening_hours(conn)?;

    Ok(())
}

/// Insert one row per weekday the first time the table is created
fn seed_opening_hours(conn: &Connection) -> DomainResult<()> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM opening_hours", [], |row| row.get(0))?;
    if count > 0 {
        return Ok(());
    }

    for (index, day) in DEFAULT_DAYS.iter().enumerate() {
        conn.execute(
            "INSERT INTO opening_hours (day_name, hours, order_index) VALUES (?, '', ?)",
            params![*day, index as i64],
        )?;
    }
    Ok(())
}
