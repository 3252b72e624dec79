//! In-memory fixed-window rate-limit store.
//!
//! Counters live in a `HashMap` behind a `Mutex` and are scoped to the
//! process: they start empty and are lost on restart. Each key gets a window
//! that opens on its first request; inside the window at most `max_requests`
//! are admitted, and the first request after the window closes opens a fresh
//! one. A client can therefore get up to `2 * max_requests` through around a
//! window boundary.
//!
//! Entries are never evicted, so memory grows with the number of distinct
//! keys seen since startup.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::{RateLimitStore, StoreError, DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW, MAX_WINDOW};

/// Counter state for one client key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowEntry {
    /// Requests admitted in the current window.
    pub count: u32,
    /// Instant after which the window is considered expired.
    pub reset_at: Instant,
}

/// A process-local fixed-window counter table.
///
/// Cloning is cheap and clones share the same table.
///
/// # Examples
///
/// ```
/// # use std::time::Duration;
/// # use leadgate_store::{MemoryStore, RateLimitStore};
/// # #[tokio::main]
/// # async fn main() {
/// let store = MemoryStore::new(2, Duration::from_secs(60));
/// assert!(store.check_and_increment("10.0.0.1").await.unwrap());
/// assert!(store.check_and_increment("10.0.0.1").await.unwrap());
/// assert!(!store.check_and_increment("10.0.0.1").await.unwrap());
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MemoryStore {
    max_requests: u32,
    window: Duration,
    entries: Arc<Mutex<HashMap<String, WindowEntry>>>,
}

impl MemoryStore {
    /// Create an empty store admitting `max_requests` per `window`.
    ///
    /// Windows longer than [`MAX_WINDOW`] are capped to it.
    #[must_use]
    pub fn new(max_requests: u32, window: Duration) -> Self {
        if window > MAX_WINDOW {
            tracing::warn!(
                requested_secs = window.as_secs(),
                max_secs = MAX_WINDOW.as_secs(),
                "rate-limit window capped"
            );
        }
        Self {
            max_requests,
            window: window.min(MAX_WINDOW),
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Effective window length.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Current counter state for `key`, if one exists.
    pub async fn entry(&self, key: &str) -> Option<WindowEntry> {
        self.entries.lock().await.get(key).copied()
    }

    /// Number of distinct keys tracked.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Whether no key has been seen yet.
    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW)
    }
}

#[async_trait::async_trait]
impl RateLimitStore for MemoryStore {
    async fn check_and_increment(&self, key: &str) -> Result<bool, StoreError> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;

        match entries.get_mut(key) {
            Some(entry) if now <= entry.reset_at => {
                if entry.count >= self.max_requests {
                    tracing::debug!(key, count = entry.count, "rate limit window exhausted");
                    return Ok(false);
                }
                entry.count = entry.count.saturating_add(1);
                Ok(true)
            }
            _ => {
                entries.insert(
                    key.to_owned(),
                    WindowEntry {
                        count: 1,
                        reset_at: now.checked_add(self.window).unwrap_or(now),
                    },
                );
                Ok(true)
            }
        }
    }

    async fn reset(&self) -> Result<(), StoreError> {
        self.entries.lock().await.clear();
        Ok(())
    }
}
