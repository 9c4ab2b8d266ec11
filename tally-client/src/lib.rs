//! Offline-first sync client for tally counters.
//!
//! ```text
//!   UI shell
//!      │ mutations
//!      ▼
//!  SaveScheduler ──(debounced)──▶ SyncOrchestrator ──▶ real server (reqwest)
//!                                     │    │
//!                                     │    └─────────▶ simulated backend
//!                                     ▼                (cache registries)
//!                                 CacheStore ◀── durability floor
//! ```
//!
//! The auth gateway issues the [`tally_core::Credential`] that decides which
//! remote a save addresses; the local cache receives every write first, so a
//! client that never regains connectivity never loses data.
//!
//! Everything is passed explicit context (a [`CacheStore`] plus a
//! [`ClientConfig`]) built once at process start; logout tears the session
//! down, nothing lives in globals.

pub mod auth;
pub mod cache;
pub mod config;
pub mod debounce;
pub mod error;
pub mod remote;
pub mod simulated;
pub mod sync;

pub use auth::{AuthBackend, AuthGateway};
pub use cache::CacheStore;
pub use config::ClientConfig;
pub use debounce::{DelayedTask, SaveScheduler};
pub use error::{AuthError, CacheError};
pub use remote::{RemoteApi, RemoteError};
pub use simulated::{SimulatedBackend, SimulatedUser};
pub use sync::SyncOrchestrator;
