//! Database schema definitions.

use rusqlite::Connection;
use tracing::info;

use crate::error::StoreError;

/// Current schema version for migrations.
pub const SCHEMA_VERSION: i32 = 1;

/// Initialize the database schema, creating or migrating as needed.
pub fn init_schema(conn: &Connection) -> Result<(), StoreError> {
    let current_version = get_schema_version(conn)?;

    if current_version == 0 {
        info!("Creating new database schema v{}", SCHEMA_VERSION);
        conn.execute_batch(TABLES_SCHEMA)?;
        set_schema_version(conn, SCHEMA_VERSION)?;
    } else if current_version < SCHEMA_VERSION {
        info!(
            "Migrating schema from v{} to v{}",
            current_version, SCHEMA_VERSION
        );
        migrate_schema(conn, current_version)?;
    }

    Ok(())
}

/// Get current schema version (0 if not initialized).
fn get_schema_version(conn: &Connection) -> Result<i32, StoreError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)",
        [],
    )?;

    let version: i32 = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .unwrap_or(0);

    Ok(version)
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<(), StoreError> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?)",
        [version],
    )?;
    Ok(())
}

/// Migrate schema from an older version.
fn migrate_schema(conn: &Connection, _from_version: i32) -> Result<(), StoreError> {
    // Migration steps go here as the schema evolves
    set_schema_version(conn, SCHEMA_VERSION)?;
    Ok(())
}

const TABLES_SCHEMA: &str = r#"
-- Accounts; passwords stored as argon2id PHC strings only
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT UNIQUE NOT NULL,
    email TEXT,
    password_hash TEXT NOT NULL,
    created_at INTEGER NOT NULL
);

-- One row per counter; history is a JSON array of ms timestamps
CREATE TABLE IF NOT EXISTS counters (
    id TEXT PRIMARY KEY NOT NULL,
    user_id INTEGER NOT NULL,
    title TEXT NOT NULL,
    category TEXT NOT NULL DEFAULT 'General',
    count INTEGER NOT NULL DEFAULT 0,
    track_time INTEGER NOT NULL DEFAULT 0,
    history TEXT,
    color TEXT,
    created_at INTEGER NOT NULL,
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_counters_user ON counters(user_id);
"#;
