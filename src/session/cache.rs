//! Process-wide session cache with single-flight acquisition.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, RwLock};

use crate::core::retry::with_retry;
use crate::core::{NseError, RetryConfig};
use crate::session::{AcquireSession, Session};

/// Holds the one current [`Session`] and coalesces concurrent acquisitions.
///
/// Warm-cache readers take only a read lock. On a miss, callers serialize
/// through a dedicated acquisition mutex and re-check the cache once they
/// hold it, so N concurrent cold-cache callers trigger exactly one browser
/// launch and all observe the same session (or the same failure).
pub struct SessionCache {
    acquirer: Arc<dyn AcquireSession>,
    retry: RetryConfig,
    current: RwLock<Option<Arc<Session>>>,
    acquire_lock: Mutex<()>,
}

impl SessionCache {
    /// Creates a cache around the given session source.
    pub fn new(acquirer: Arc<dyn AcquireSession>, retry: RetryConfig) -> Self {
        Self {
            acquirer,
            retry,
            current: RwLock::new(None),
            acquire_lock: Mutex::new(()),
        }
    }

    /// Returns the cached session while it is fresh; otherwise acquires a new
    /// one (retried per the configured policy) and caches it.
    pub async fn get_or_acquire(&self) -> Result<Arc<Session>, NseError> {
        // Fast path: fresh session under a read lock.
        if let Some(s) = self.current.read().await.as_ref()
            && s.is_fresh(Utc::now())
        {
            return Ok(Arc::clone(s));
        }

        // Slow path: only one task may drive an acquisition.
        let _guard = self.acquire_lock.lock().await;

        // Double-check: another task may have refreshed the cache while this
        // one waited on the lock.
        if let Some(s) = self.current.read().await.as_ref()
            && s.is_fresh(Utc::now())
        {
            return Ok(Arc::clone(s));
        }

        let acquirer = Arc::clone(&self.acquirer);
        let session = with_retry(&self.retry, move |_| {
            let acquirer = Arc::clone(&acquirer);
            async move { acquirer.acquire().await }
        })
        .await?;

        let session = Arc::new(session);
        *self.current.write().await = Some(Arc::clone(&session));
        Ok(session)
    }

    /// Discards the current session, forcing the next caller to acquire a
    /// fresh one. Used after the data endpoint rejects the cookies even
    /// though their TTL has not elapsed.
    pub async fn invalidate(&self) {
        let mut guard = self.current.write().await;
        if guard.take().is_some() {
            tracing::info!("cached session invalidated");
        }
    }

    /// Whether a fresh session is currently cached.
    pub async fn is_warm(&self) -> bool {
        self.current
            .read()
            .await
            .as_ref()
            .is_some_and(|s| s.is_fresh(Utc::now()))
    }
}
