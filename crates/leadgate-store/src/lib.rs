//! Rate-limit counter storage for `leadgate`.
//!
//! This crate defines the [`RateLimitStore`] trait — a keyed admission
//! counter that knows nothing about HTTP, origins or form submissions. The
//! gatekeeper in `leadgate-server` derives a client key from the request and
//! asks the store whether one more submission is admitted.
//!
//! One implementation is provided:
//!
//! - [`MemoryStore`] — process-local fixed-window counters, reset on restart
//!
//! Deployments that need accuracy across several instances can plug a shared
//! counter (for example a key-value server with `INCR` + TTL) in behind the
//! same trait.

mod error;
mod memory;

use std::time::Duration;

pub use error::StoreError;
pub use memory::{MemoryStore, WindowEntry};

/// Default number of admitted requests per client per window.
pub const DEFAULT_MAX_REQUESTS: u32 = 5;

/// Default fixed window length (15 minutes).
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(15 * 60);

/// Longest accepted window; longer configured windows are capped.
pub const MAX_WINDOW: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// A keyed fixed-window admission counter.
///
/// Implementations must be safe to share across async tasks (`Send + Sync`).
#[async_trait::async_trait]
pub trait RateLimitStore: Send + Sync + 'static {
    /// Record one request for `key` and report whether it is admitted.
    ///
    /// Returns `Ok(false)` once the key has used up its allowance for the
    /// current window. A rejected request does not consume allowance.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the backing store fails.
    async fn check_and_increment(&self, key: &str) -> Result<bool, StoreError>;

    /// Forget every counter.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the backing store fails.
    async fn reset(&self) -> Result<(), StoreError>;
}
