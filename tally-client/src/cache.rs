//! Local cache store: one JSON document per key on disk.
//!
//! The durability floor for the whole client. Reads are tolerant: absent or
//! unparsable content reads as `None` and the caller falls back to defaults.
//! Writes report their failures; the fire-and-forget save path logs and
//! swallows them.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::CacheError;

/// Persisted key: the counter collection snapshot.
pub const KEY_COUNTERS: &str = "counters";
/// Persisted key: the active credential.
pub const KEY_CREDENTIAL: &str = "credential";
/// Persisted key: the active user profile.
pub const KEY_PROFILE: &str = "profile";
/// Persisted key: selected UI language.
pub const KEY_LANGUAGE: &str = "language";
/// Persisted key: the simulated auth registry.
pub const KEY_SIMULATED_USERS: &str = "simulated_users";
/// Persisted key: simulated per-user remote buckets.
pub const KEY_SIMULATED_REMOTE: &str = "simulated_remote";

/// File-backed key-value store, one `<key>.json` per key.
#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: PathBuf,
}

impl CacheStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, CacheError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        debug!(dir = %dir.display(), "cache store open");
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// Read and decode a key. Absent or unparsable content reads as `None`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = fs::read_to_string(self.path_for(key)).ok()?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "unparsable cache entry, treating as absent");
                None
            }
        }
    }

    /// Encode and write a key.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), CacheError> {
        let raw = serde_json::to_string(value)?;
        fs::write(self.path_for(key), raw)?;
        Ok(())
    }

    /// Delete a key. Deleting an absent key is fine.
    pub fn remove(&self, key: &str) -> Result<(), CacheError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Stored UI language preference, if any.
    pub fn language(&self) -> Option<String> {
        self.get(KEY_LANGUAGE)
    }

    /// Persist the UI language preference.
    pub fn set_language(&self, language: &str) -> Result<(), CacheError> {
        self.set(KEY_LANGUAGE, language)
    }
}
