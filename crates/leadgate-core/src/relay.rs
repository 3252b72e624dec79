//! Downstream collaborators of the gatekeeper.
//!
//! The webhook receiver and the CAPTCHA provider are remote services. The
//! server crate ships `reqwest` implementations; tests substitute recording
//! fakes.

use crate::error::{CaptchaError, RelayError};
use crate::payload::WebhookPayload;

/// Delivers an accepted submission to the automation webhook.
///
/// Implementations make exactly one attempt per call and never retry.
#[async_trait::async_trait]
pub trait WebhookRelay: Send + Sync + 'static {
    /// Post `payload` to the webhook.
    ///
    /// # Errors
    ///
    /// - [`RelayError::Status`] if the webhook answers with a non-2xx status
    /// - [`RelayError::Timeout`] if it does not answer in time
    /// - [`RelayError::Transport`] if the request cannot be delivered
    async fn relay(&self, payload: &WebhookPayload) -> Result<(), RelayError>;
}

/// Checks a CAPTCHA token with the verification provider.
#[async_trait::async_trait]
pub trait CaptchaVerifier: Send + Sync + 'static {
    /// Verify `token`, optionally bound to the client's address.
    ///
    /// # Errors
    ///
    /// - [`CaptchaError::Rejected`] if the provider reports `success: false`
    /// - [`CaptchaError::Provider`] if the provider cannot be reached or its
    ///   answer cannot be decoded
    async fn verify(&self, token: &str, remote_ip: Option<&str>) -> Result<(), CaptchaError>;
}
