//! Account and counter sync backend for tally clients.
//!
//! Registration and login issue signed JWTs; `GET /counters` returns the
//! caller's collection and `POST /counters/sync` replaces it atomically
//! (upsert by id plus prune of absent ids, in one SQLite transaction).
//! The whole state a handler needs travels in [`AppState`].

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod routes;

pub use auth::{Claims, TokenSigner};
pub use config::ServerConfig;
pub use db::Db;
pub use error::StoreError;
pub use routes::{build_router, AppState};
