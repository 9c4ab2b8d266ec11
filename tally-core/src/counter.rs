//! Counter model and its mutation rules.
//!
//! `history` is a stack of millisecond timestamps kept in lockstep with
//! `count` while `track_time` is set: increment pushes, decrement pops.
//! `count` never goes below zero.

use chrono::Utc;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// Well-known categories. Advisory, not closed: `category` stays a plain
/// string on the wire.
pub const CATEGORIES: [&str; 6] = ["General", "Health", "Habits", "Work", "Social", "Fitness"];

/// Category used when the caller does not pick one.
pub const DEFAULT_CATEGORY: &str = "General";

/// Cosmetic color tags; one is assigned at random per new counter.
pub const COLORS: [&str; 8] = [
    "red", "blue", "green", "yellow", "purple", "pink", "indigo", "teal",
];

/// A single tracked counter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Counter {
    /// Client-generated, immutable once created.
    pub id: String,
    pub title: String,
    pub category: String,
    pub count: u32,
    /// When set, every increment logs a timestamp into `history`.
    pub track_time: bool,
    /// Millisecond timestamps, newest last. Empty unless `track_time`.
    #[serde(default)]
    pub history: Vec<i64>,
    pub color: String,
    pub created_at: i64,
}

impl Counter {
    /// Create a counter at zero with a fresh id and a random palette color.
    pub fn new(title: impl Into<String>, category: impl Into<String>, track_time: bool) -> Self {
        let color = COLORS
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(COLORS[0]);
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            category: category.into(),
            count: 0,
            track_time,
            history: Vec::new(),
            color: color.to_string(),
            created_at: now_ms(),
        }
    }

    /// Bump the count, logging the moment when time tracking is on.
    /// A no-op at the `u32` ceiling, so `history` never outruns `count`.
    pub fn increment(&mut self) {
        if self.count == u32::MAX {
            return;
        }
        self.count += 1;
        if self.track_time {
            self.history.push(now_ms());
        }
    }

    /// Undo the most recent increment: pops the newest history entry when
    /// time tracking is on. A no-op at zero.
    pub fn decrement(&mut self) {
        if self.count == 0 {
            return;
        }
        self.count -= 1;
        if self.track_time {
            self.history.pop();
        }
    }

    /// Rename the counter. Titles that trim to empty are ignored.
    pub fn set_title(&mut self, title: &str) {
        let trimmed = title.trim();
        if !trimmed.is_empty() {
            self.title = trimmed.to_string();
        }
    }
}

/// Current wall-clock time in milliseconds since the epoch.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}
