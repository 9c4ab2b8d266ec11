//! Simulated backend: a client-local stand-in for the remote API.
//!
//! Keeps a user registry and per-user counter buckets inside the local cache
//! so authentication and sync keep working, non-destructively, while the
//! real server cannot be reached. Passwords are stored argon2-hashed, the
//! same scheme the real server uses; an artificial latency stands in for the
//! network.

use std::collections::HashMap;
use std::time::Duration;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::info;

use tally_core::{now_ms, Counter, Credential, Session, UserProfile};

use crate::cache::{CacheStore, KEY_SIMULATED_REMOTE, KEY_SIMULATED_USERS};
use crate::config::ClientConfig;
use crate::error::{AuthError, CacheError};

/// Registry entry backing a simulated account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulatedUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// The simulated auth backend and its per-user remote buckets.
#[derive(Debug, Clone)]
pub struct SimulatedBackend {
    cache: CacheStore,
    auth_delay: Duration,
    sync_delay: Duration,
}

impl SimulatedBackend {
    pub fn new(cache: CacheStore, config: &ClientConfig) -> Self {
        Self {
            cache,
            auth_delay: config.simulated_auth_delay,
            sync_delay: config.simulated_sync_delay,
        }
    }

    fn users(&self) -> Vec<SimulatedUser> {
        self.cache.get(KEY_SIMULATED_USERS).unwrap_or_default()
    }

    /// Create a registry user and issue a simulated credential.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        sleep(self.auth_delay).await;

        let mut users = self.users();
        if users.iter().any(|u| u.username == username) {
            return Err(AuthError::UsernameTaken);
        }

        // Synthesized ids are ms timestamps; bump past collisions so two
        // registrations in the same millisecond stay distinct.
        let mut id = now_ms();
        while users.iter().any(|u| u.id == id) {
            id += 1;
        }

        let password_hash = hash_password(password)?;
        users.push(SimulatedUser {
            id,
            username: username.to_string(),
            email: email.to_string(),
            password_hash,
        });
        self.cache.set(KEY_SIMULATED_USERS, &users)?;
        info!(username, id, "registered simulated user");

        Ok(Session {
            user: UserProfile {
                id,
                username: username.to_string(),
                email: email.to_string(),
            },
            credential: Credential::simulated(id),
        })
    }

    /// Authenticate against the registry. Exact username match; the stored
    /// hash is verified, never compared in cleartext.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, AuthError> {
        sleep(self.auth_delay).await;

        let users = self.users();
        let user = users
            .iter()
            .find(|u| u.username == username)
            .ok_or(AuthError::UserNotFound)?;
        if !verify_password(password, &user.password_hash)? {
            return Err(AuthError::InvalidPassword);
        }

        Ok(Session {
            user: UserProfile {
                id: user.id,
                username: user.username.clone(),
                email: user.email.clone(),
            },
            credential: Credential::simulated(user.id),
        })
    }

    /// Counters last synced for a registry user. Missing bucket reads empty.
    pub fn load_bucket(&self, user_id: i64) -> Vec<Counter> {
        let buckets: HashMap<String, Vec<Counter>> =
            self.cache.get(KEY_SIMULATED_REMOTE).unwrap_or_default();
        buckets.get(&user_id.to_string()).cloned().unwrap_or_default()
    }

    /// Overwrite a registry user's bucket, after the stand-in latency.
    pub async fn store_bucket(&self, user_id: i64, counters: &[Counter]) -> Result<(), CacheError> {
        sleep(self.sync_delay).await;

        let mut buckets: HashMap<String, Vec<Counter>> =
            self.cache.get(KEY_SIMULATED_REMOTE).unwrap_or_default();
        buckets.insert(user_id.to_string(), counters.to_vec());
        self.cache.set(KEY_SIMULATED_REMOTE, &buckets)
    }
}

fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hash(format!("failed to hash password: {e}")))
}

fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| AuthError::Hash(format!("stored hash is malformed: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
