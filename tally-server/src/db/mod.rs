//! SQLite persistence for accounts and counters.
//!
//! One `Mutex<Connection>` guards the database. A sync request runs its
//! upsert and prune inside a single transaction, so a reader never observes
//! a half-replaced collection.

pub mod schema;

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;

use tally_core::Counter;

use crate::error::StoreError;

/// A stored account row.
#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

pub struct Db {
    conn: Mutex<Connection>,
}

impl Db {
    /// Open (or create) the database at `path` and bring the schema up to date.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path.as_ref())?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        schema::init_schema(&conn)?;
        info!(path = %path.as_ref().display(), "database ready");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory database for tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        schema::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Internal(format!("Lock poisoned: {}", e)))
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Insert a new account. Callers check for a taken username first; the
    /// UNIQUE constraint backstops races.
    pub fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<UserRow, StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO users (username, email, password_hash, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                username,
                email,
                password_hash,
                chrono::Utc::now().timestamp_millis()
            ],
        )?;
        Ok(UserRow {
            id: conn.last_insert_rowid(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
        })
    }

    /// Look an account up by exact username.
    pub fn find_user(&self, username: &str) -> Result<Option<UserRow>, StoreError> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT id, username, email, password_hash FROM users WHERE username = ?1",
                params![username],
                |row| {
                    Ok(UserRow {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        email: row.get(2)?,
                        password_hash: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    // =========================================================================
    // Counters
    // =========================================================================

    /// The user's full collection, ordered so repeated loads are deterministic.
    pub fn list_counters(&self, user_id: i64) -> Result<Vec<Counter>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, title, category, count, track_time, history, color, created_at
             FROM counters WHERE user_id = ?1 ORDER BY created_at, id",
        )?;
        let rows = stmt.query_map(params![user_id], row_to_counter)?;

        let mut counters = Vec::new();
        for row in rows {
            counters.push(row?);
        }
        Ok(counters)
    }

    /// Replace the user's collection: upsert every counter in the payload,
    /// then delete every stored id the payload no longer carries. Both phases
    /// share one transaction. An empty payload clears the collection.
    pub fn replace_counters(
        &self,
        user_id: i64,
        counters: &[Counter],
    ) -> Result<usize, StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        for counter in counters {
            let history = serde_json::to_string(&counter.history)?;
            tx.execute(
                "INSERT INTO counters
                     (id, user_id, title, category, count, track_time, history, color, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT(id) DO UPDATE SET
                     user_id = excluded.user_id,
                     title = excluded.title,
                     category = excluded.category,
                     count = excluded.count,
                     track_time = excluded.track_time,
                     history = excluded.history,
                     color = excluded.color,
                     created_at = excluded.created_at",
                params![
                    counter.id,
                    user_id,
                    counter.title,
                    counter.category,
                    counter.count,
                    counter.track_time as i64,
                    history,
                    counter.color,
                    counter.created_at,
                ],
            )?;
        }

        if counters.is_empty() {
            tx.execute("DELETE FROM counters WHERE user_id = ?1", params![user_id])?;
        } else {
            let placeholders = vec!["?"; counters.len()].join(", ");
            let sql = format!(
                "DELETE FROM counters WHERE user_id = ? AND id NOT IN ({})",
                placeholders
            );
            let mut args: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(user_id)];
            for counter in counters {
                args.push(Box::new(counter.id.clone()));
            }
            let arg_refs: Vec<&dyn rusqlite::ToSql> = args.iter().map(|a| a.as_ref()).collect();
            tx.execute(&sql, arg_refs.as_slice())?;
        }

        tx.commit()?;
        Ok(counters.len())
    }
}

fn row_to_counter(row: &rusqlite::Row<'_>) -> rusqlite::Result<Counter> {
    let history_json: Option<String> = row.get(5)?;
    let track_time: i64 = row.get(4)?;
    Ok(Counter {
        id: row.get(0)?,
        title: row.get(1)?,
        category: row.get(2)?,
        count: row.get(3)?,
        track_time: track_time != 0,
        history: history_json
            .and_then(|text| serde_json::from_str(&text).ok())
            .unwrap_or_default(),
        color: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
        created_at: row.get(7)?,
    })
}
