//! Rate-limit store error types.

/// Errors that can occur while consulting a rate-limit store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing store could not be reached or refused the update.
    #[error("rate-limit store unavailable: {reason}")]
    Unavailable { reason: String },
}
