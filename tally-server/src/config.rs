//! Server configuration from CLI flags and environment variables.

use clap::Parser;
use tracing::warn;

pub const DEFAULT_JWT_SECRET: &str = "change-me-in-production";

#[derive(Debug, Parser)]
#[command(name = "tally-server")]
#[command(about = "Account and counter sync server for tally clients")]
pub struct ServerConfig {
    /// Address to bind
    #[arg(long, env = "TALLY_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "TALLY_PORT", default_value_t = 3001)]
    pub port: u16,

    /// SQLite database path
    #[arg(long, env = "TALLY_DB", default_value = "tally.db")]
    pub db_path: String,

    /// Secret used to sign JWTs
    #[arg(long, env = "TALLY_JWT_SECRET", default_value = DEFAULT_JWT_SECRET)]
    pub jwt_secret: String,

    /// Token lifetime in days
    #[arg(long, env = "TALLY_JWT_EXPIRY_DAYS", default_value_t = 7)]
    pub jwt_expiry_days: i64,

    /// Log filter for this crate (e.g. info, debug)
    #[arg(long, env = "TALLY_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl ServerConfig {
    /// Warn when the signing secret is still the published default.
    pub fn check_secret(&self) {
        if self.jwt_secret == DEFAULT_JWT_SECRET {
            warn!("TALLY_JWT_SECRET is unset; tokens are signed with the default secret");
        }
    }
}
