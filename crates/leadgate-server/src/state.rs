//! Shared application state for the `leadgate` server.
//!
//! A single [`AppState`] is built at startup and shared across handlers via
//! `Arc`. The rate-limit store, webhook relay and CAPTCHA verifier sit behind
//! trait objects so tests and alternative deployments can swap them.

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use leadgate_core::agent::AgentFilter;
use leadgate_core::origin::OriginPolicy;
use leadgate_core::relay::{CaptchaVerifier, WebhookRelay};
use leadgate_core::submission::SubmissionValidator;
use leadgate_store::{MemoryStore, RateLimitStore};

use crate::captcha::HCaptchaVerifier;
use crate::config::{RelayErrorMode, ServerConfig};
use crate::relay::HttpWebhookRelay;

/// CAPTCHA stage configuration as seen by the pipeline.
#[derive(Clone)]
pub enum CaptchaGate {
    /// No CAPTCHA stage.
    Disabled,
    /// CAPTCHA is required but no secret is configured.
    Misconfigured,
    /// Tokens are checked with this verifier.
    Enabled(Arc<dyn CaptchaVerifier>),
}

/// Shared application state passed to all HTTP handlers.
pub struct AppState {
    /// Browser origins allowed to submit.
    pub origins: OriginPolicy,
    /// User-agent denylist.
    pub agents: AgentFilter,
    /// Form content checks.
    pub validator: SubmissionValidator,
    /// Per-client submission counters.
    pub rate_limits: Arc<dyn RateLimitStore>,
    /// Webhook relay (`None` if the webhook is not configured).
    pub relay: Option<Arc<dyn WebhookRelay>>,
    /// How relay failures are reported.
    pub relay_error_mode: RelayErrorMode,
    /// CAPTCHA stage.
    pub captcha: CaptchaGate,
}

impl AppState {
    /// Build production state from configuration.
    ///
    /// An incomplete webhook or CAPTCHA configuration does not fail startup;
    /// it is logged here and rejected per request with a configuration error.
    ///
    /// # Errors
    ///
    /// Returns an error if the preview origin or email pattern does not
    /// compile or an HTTP client cannot be built.
    pub fn from_config(config: &ServerConfig) -> anyhow::Result<Self> {
        let origins = OriginPolicy::new(
            config.allowed_origins.iter().cloned(),
            config.preview_origin_pattern.as_deref(),
        )
        .context("invalid LEADGATE_PREVIEW_ORIGIN_PATTERN")?;

        let agents = AgentFilter::new(&config.blocked_agents);
        let validator = SubmissionValidator::new().context("invalid email pattern")?;

        let rate_limits: Arc<dyn RateLimitStore> = Arc::new(MemoryStore::new(
            config.rate_limit_max,
            config.rate_limit_window,
        ));
        info!(
            max = config.rate_limit_max,
            window_secs = config.rate_limit_window.as_secs(),
            "in-memory rate limiting enabled"
        );

        let relay: Option<Arc<dyn WebhookRelay>> = match config.webhook.target() {
            Ok(target) => {
                info!(
                    auth = ?target.auth,
                    timeout_secs = target.timeout.as_secs(),
                    "webhook relay configured"
                );
                Some(Arc::new(
                    HttpWebhookRelay::new(target).context("failed to build webhook client")?,
                ))
            }
            Err(e) => {
                warn!(error = %e, "webhook relay not configured, submissions will be refused");
                None
            }
        };

        let captcha = match (config.captcha.required, &config.captcha.secret) {
            (false, _) => CaptchaGate::Disabled,
            (true, None) => {
                warn!("captcha required but LEADGATE_CAPTCHA_SECRET is not configured");
                CaptchaGate::Misconfigured
            }
            (true, Some(secret)) => {
                // Same bound as the webhook call.
                let client = reqwest::Client::builder()
                    .timeout(config.webhook.timeout)
                    .build()
                    .context("failed to build captcha client")?;
                info!(verify_url = %config.captcha.verify_url, "captcha verification enabled");
                CaptchaGate::Enabled(Arc::new(HCaptchaVerifier::new(
                    client,
                    config.captcha.verify_url.clone(),
                    secret.clone(),
                    config.captcha.sitekey.clone(),
                )))
            }
        };

        Ok(Self {
            origins,
            agents,
            validator,
            rate_limits,
            relay,
            relay_error_mode: config.relay_error_mode,
            captcha,
        })
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}
