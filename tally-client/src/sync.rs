//! Load/save orchestration across the local cache and the active backend.
//!
//! The cache is the durability floor: every save lands there first, and a
//! load that cannot reach the backend falls back to it. Pushes replace the
//! backend's whole copy for the user (last full state wins, no merging).
//! Loading never triggers a save; only mutations do, via the scheduler.

use tracing::{info, warn};

use tally_core::{Counter, Credential};

use crate::cache::{CacheStore, KEY_COUNTERS};
use crate::config::ClientConfig;
use crate::error::CacheError;
use crate::remote::RemoteApi;
use crate::simulated::SimulatedBackend;

/// Routes loads and saves to the cache plus whichever backend the session's
/// credential selects.
#[derive(Debug, Clone)]
pub struct SyncOrchestrator {
    cache: CacheStore,
    remote: RemoteApi,
    simulated: SimulatedBackend,
}

impl SyncOrchestrator {
    pub fn new(cache: CacheStore, config: &ClientConfig) -> Self {
        Self {
            remote: RemoteApi::new(config.server_url.clone()),
            simulated: SimulatedBackend::new(cache.clone(), config),
            cache,
        }
    }

    /// Counters currently persisted in the local cache.
    pub fn cached_counters(&self) -> Vec<Counter> {
        self.cache.get(KEY_COUNTERS).unwrap_or_default()
    }

    /// Load the working set for this credential.
    ///
    /// Without a credential the cached copy is the answer. With one, the
    /// backend's copy replaces the cache on success; if the server never
    /// responds the cached copy stands in.
    pub async fn load(&self, credential: Option<&Credential>) -> Vec<Counter> {
        let Some(credential) = credential else {
            return self.cached_counters();
        };

        let counters = match credential {
            Credential::Real { token } => match self.remote.fetch_counters(token).await {
                Ok(counters) => counters,
                Err(err) => {
                    warn!(%err, "load from server failed, using cached counters");
                    return self.cached_counters();
                }
            },
            Credential::Simulated { user_id, .. } => self.simulated.load_bucket(*user_id),
        };

        if let Err(err) = self.cache.set(KEY_COUNTERS, &counters) {
            warn!(%err, "could not cache loaded counters");
        }
        info!(count = counters.len(), "loaded counters");
        counters
    }

    /// Persist the full counter list.
    ///
    /// The cache write must succeed; a backend push that fails is logged and
    /// swallowed so offline edits never error out.
    pub async fn save(
        &self,
        counters: &[Counter],
        credential: Option<&Credential>,
    ) -> Result<(), CacheError> {
        self.cache.set(KEY_COUNTERS, counters)?;

        match credential {
            None => {}
            Some(Credential::Real { token }) => {
                match self.remote.sync_counters(token, counters).await {
                    Ok(acked) => info!(acked, "pushed counters to server"),
                    Err(err) => warn!(%err, "push to server failed, cache copy kept"),
                }
            }
            Some(Credential::Simulated { user_id, .. }) => {
                match self.simulated.store_bucket(*user_id, counters).await {
                    Ok(()) => info!(count = counters.len(), "pushed counters to simulated backend"),
                    Err(err) => warn!(%err, "simulated push failed, cache copy kept"),
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const DEAD_SERVER: &str = "http://127.0.0.1:9";

    fn orchestrator(dir: &TempDir) -> SyncOrchestrator {
        let cache = CacheStore::open(dir.path()).unwrap();
        SyncOrchestrator::new(cache, &ClientConfig::for_server(DEAD_SERVER))
    }

    fn counters(titles: &[&str]) -> Vec<Counter> {
        titles
            .iter()
            .map(|&t| Counter::new(t, "General", false))
            .collect()
    }

    #[tokio::test]
    async fn anonymous_load_returns_the_cache() {
        let dir = TempDir::new().unwrap();
        let sync = orchestrator(&dir);
        let list = counters(&["water"]);
        sync.save(&list, None).await.unwrap();

        assert_eq!(sync.load(None).await, list);
    }

    #[tokio::test]
    async fn unreachable_server_load_falls_back_to_cache() {
        let dir = TempDir::new().unwrap();
        let sync = orchestrator(&dir);
        let list = counters(&["water", "coffee"]);
        sync.save(&list, None).await.unwrap();

        let credential = Credential::real("jwt");
        assert_eq!(sync.load(Some(&credential)).await, list);
    }

    #[tokio::test]
    async fn unreachable_server_save_still_lands_in_cache() {
        let dir = TempDir::new().unwrap();
        let sync = orchestrator(&dir);
        let credential = Credential::real("jwt");

        let list = counters(&["pushups"]);
        sync.save(&list, Some(&credential)).await.unwrap();
        assert_eq!(sync.cached_counters(), list);
    }

    #[tokio::test]
    async fn simulated_credential_roundtrips_through_its_bucket() {
        let dir = TempDir::new().unwrap();
        let sync = orchestrator(&dir);
        let credential = Credential::simulated(7);

        let list = counters(&["reading", "running"]);
        sync.save(&list, Some(&credential)).await.unwrap();

        // Wipe the cached copy to prove the bucket is the source.
        sync.cache.set(KEY_COUNTERS, &Vec::<Counter>::new()).unwrap();
        assert_eq!(sync.load(Some(&credential)).await, list);
        // And a successful load refreshes the cache.
        assert_eq!(sync.cached_counters(), list);
    }

    #[tokio::test]
    async fn simulated_buckets_are_per_user() {
        let dir = TempDir::new().unwrap();
        let sync = orchestrator(&dir);
        let ana = Credential::simulated(1);
        let bob = Credential::simulated(2);

        sync.save(&counters(&["yoga"]), Some(&ana)).await.unwrap();
        sync.save(&counters(&["chess"]), Some(&bob)).await.unwrap();

        let loaded = sync.load(Some(&ana)).await;
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].title, "yoga");
    }
}
