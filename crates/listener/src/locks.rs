//! Per-repository serialisation of pipeline runs.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use pipeline::RepositoryRef;

/// One async mutex per repository, created on demand.
///
/// Entries nobody holds or waits on are pruned on the next acquisition.
#[derive(Clone, Default)]
pub struct RepositoryLocks {
    inner: Arc<DashMap<RepositoryRef, Arc<AsyncMutex<()>>>>,
}

impl RepositoryLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other run for `repository` is in progress.
    pub async fn acquire(&self, repository: &RepositoryRef) -> OwnedMutexGuard<()> {
        self.inner.retain(|_, lock| Arc::strong_count(lock) > 1);
        let lock = Arc::clone(self.inner.entry(repository.clone()).or_default().value());
        lock.lock_owned().await
    }

    /// Number of repositories with a run in progress or queued.
    pub fn active(&self) -> usize {
        self.inner
            .iter()
            .filter(|entry| Arc::strong_count(entry.value()) > 1)
            .count()
    }
}
