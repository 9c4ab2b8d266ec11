//! Core data model for tally counters.
//!
//! - [`Counter`]: the trackable entity (title, count, optional timestamped
//!   history)
//! - [`UserProfile`] / [`Credential`] / [`Session`]: account identity and the
//!   bearer token that scopes a remote collection
//! - [`backup`]: the portable export/import envelope
//!
//! No I/O lives here; persistence and transport belong to the client and
//! server crates.

pub mod backup;
pub mod counter;
pub mod profile;

pub use backup::{export_backup, import_backup, BackupError, BACKUP_VERSION};
pub use counter::{now_ms, Counter, CATEGORIES, COLORS, DEFAULT_CATEGORY};
pub use profile::{Credential, Session, UserProfile, SIMULATED_TOKEN_PREFIX};
