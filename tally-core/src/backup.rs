//! Portable backup envelope: export and additive import.
//!
//! The envelope is `{version, timestamp, counters}`. Import is strict about
//! the envelope (no `counters` array means the whole payload is rejected)
//! but tolerant per entry: anything with a usable `id` and `count` is kept,
//! the rest is dropped. Imported counters are appended by the caller to the
//! existing collection, never merged over it.

use serde_json::Value;
use thiserror::Error;

use crate::counter::{now_ms, Counter, COLORS, DEFAULT_CATEGORY};

/// Envelope format version written by export.
pub const BACKUP_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("backup is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("backup has no counters array")]
    MissingCounters,
}

/// Serialize the collection into the portable envelope.
pub fn export_backup(counters: &[Counter]) -> Result<String, BackupError> {
    let envelope = serde_json::json!({
        "version": BACKUP_VERSION,
        "timestamp": now_ms(),
        "counters": counters,
    });
    Ok(serde_json::to_string_pretty(&envelope)?)
}

/// Parse a backup payload into the counters it carries.
///
/// Fails when the payload is not JSON or lacks a `counters` array; individual
/// malformed entries are silently dropped.
pub fn import_backup(raw: &str) -> Result<Vec<Counter>, BackupError> {
    let value: Value = serde_json::from_str(raw)?;
    let entries = value
        .get("counters")
        .and_then(Value::as_array)
        .ok_or(BackupError::MissingCounters)?;
    Ok(entries.iter().filter_map(entry_to_counter).collect())
}

/// A usable entry needs a non-empty `id` and a non-negative integer `count`;
/// every other field falls back to a default.
fn entry_to_counter(entry: &Value) -> Option<Counter> {
    let id = entry
        .get("id")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())?;
    let count = entry
        .get("count")
        .and_then(Value::as_u64)
        .and_then(|n| u32::try_from(n).ok())?;
    let history = entry
        .get("history")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_i64).collect())
        .unwrap_or_default();
    Some(Counter {
        id: id.to_string(),
        title: string_or(entry, "title", "Untitled"),
        category: string_or(entry, "category", DEFAULT_CATEGORY),
        count,
        track_time: entry
            .get("trackTime")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        history,
        color: string_or(entry, "color", COLORS[0]),
        created_at: entry
            .get("createdAt")
            .and_then(Value::as_i64)
            .unwrap_or_else(now_ms),
    })
}

fn string_or(entry: &Value, key: &str, fallback: &str) -> String {
    entry
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| fallback.to_string())
}
