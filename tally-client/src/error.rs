//! Client error taxonomy.
//!
//! Transport failures are recoverable (the next store in the chain takes
//! over); rejections are surfaced to the user as-is.

use thiserror::Error;

/// Failures touching the local cache. Reads never produce these (absent or
/// unparsable content reads as empty); writes do.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache io: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache encode: {0}")]
    Json(#[from] serde_json::Error),
}

/// Authentication failures. The rejection variants mean "try again";
/// `Transport` means the real backend produced no response at all and is the
/// only case that permits falling back to the simulated backend.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("username already taken")]
    UsernameTaken,

    #[error("user not found")]
    UserNotFound,

    #[error("invalid password")]
    InvalidPassword,

    #[error("{0}")]
    Rejected(String),

    #[error("server unreachable: {0}")]
    Transport(String),

    #[error("session store: {0}")]
    Store(#[from] CacheError),

    #[error("password hash: {0}")]
    Hash(String),
}
