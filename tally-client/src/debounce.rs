//! Debounced saves.
//!
//! Mutations come in bursts (a user tapping +1 repeatedly), so each one
//! re-arms a single delayed slot instead of pushing immediately. Only the
//! last arming survives the quiet period, and it carries a full snapshot of
//! the state from the moment it was scheduled. In-flight pushes that overlap
//! can still reach the server out of order; the next mutation's push squares
//! the server copy up again.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::warn;

use tally_core::{Counter, Credential};

use crate::config::ClientConfig;
use crate::sync::SyncOrchestrator;

/// One resettable delayed slot. Scheduling replaces whatever is pending, so
/// at most one task ever fires per quiet period.
///
/// Must be used from within a tokio runtime.
#[derive(Debug, Default)]
pub struct DelayedTask {
    slot: Mutex<Option<JoinHandle<()>>>,
}

impl DelayedTask {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `task` after `delay`, aborting any task still waiting in the slot.
    pub fn schedule<F>(&self, delay: Duration, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut slot = self.lock();
        if let Some(previous) = slot.take() {
            previous.abort();
        }
        *slot = Some(tokio::spawn(async move {
            sleep(delay).await;
            task.await;
        }));
    }

    /// Abort the pending task, if any.
    pub fn cancel(&self) {
        if let Some(previous) = self.lock().take() {
            previous.abort();
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        match self.slot.lock() {
            Ok(slot) => slot,
            // The slot only holds a handle; a panic elsewhere does not corrupt it.
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Debounces counter saves behind a [`DelayedTask`] slot.
#[derive(Debug)]
pub struct SaveScheduler {
    sync: Arc<SyncOrchestrator>,
    window: Duration,
    slot: DelayedTask,
}

impl SaveScheduler {
    pub fn new(sync: Arc<SyncOrchestrator>, config: &ClientConfig) -> Self {
        Self {
            sync,
            window: config.debounce_window,
            slot: DelayedTask::new(),
        }
    }

    /// (Re)arm the save timer with a snapshot of the full current state.
    pub fn schedule_save(&self, counters: Vec<Counter>, credential: Option<Credential>) {
        let sync = Arc::clone(&self.sync);
        self.slot.schedule(self.window, async move {
            if let Err(err) = sync.save(&counters, credential.as_ref()).await {
                warn!(%err, "debounced save failed");
            }
        });
    }

    /// Drop a pending save without running it.
    pub fn cancel(&self) {
        self.slot.cancel();
    }
}
