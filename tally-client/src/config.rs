//! Client-side configuration.

use std::time::Duration;

/// Tunables for the sync client. Defaults match production behavior; tests
/// shrink the latencies.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the real server, e.g. `http://localhost:3001`.
    pub server_url: String,
    /// Quiet period after the last mutation before a save fires.
    pub debounce_window: Duration,
    /// Stand-in latency for simulated auth operations.
    pub simulated_auth_delay: Duration,
    /// Stand-in latency for simulated sync writes.
    pub simulated_sync_delay: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:3001".to_string(),
            debounce_window: Duration::from_millis(1000),
            simulated_auth_delay: Duration::from_millis(800),
            simulated_sync_delay: Duration::from_millis(300),
        }
    }
}

impl ClientConfig {
    /// Config pointed at a given server with zero artificial latency.
    /// Intended for tests and local tooling.
    pub fn for_server(url: impl Into<String>) -> Self {
        Self {
            server_url: url.into(),
            simulated_auth_delay: Duration::ZERO,
            simulated_sync_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}
