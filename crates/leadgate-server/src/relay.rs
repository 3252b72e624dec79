//! HTTP webhook relay.
//!
//! Posts the normalized payload as JSON to the configured webhook with the
//! configured credentials. One attempt, bounded by the target's timeout.

use std::time::Duration;

use tracing::{debug, warn};

use leadgate_core::error::RelayError;
use leadgate_core::payload::WebhookPayload;
use leadgate_core::relay::WebhookRelay;

use crate::config::{WebhookAuth, WebhookTarget};

/// Header carrying the key for `api-key` authentication.
pub const API_KEY_HEADER: &str = "x-make-apikey";

/// Upstream error bodies are cut to this many characters before logging.
const MAX_LOGGED_BODY: usize = 512;

/// [`WebhookRelay`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpWebhookRelay {
    client: reqwest::Client,
    target: WebhookTarget,
}

impl HttpWebhookRelay {
    /// Build a relay for `target`.
    ///
    /// # Errors
    ///
    /// Returns [`reqwest::Error`] if the HTTP client cannot be constructed.
    pub fn new(target: WebhookTarget) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(target.timeout).build()?;
        Ok(Self { client, target })
    }

    fn timeout(&self) -> Duration {
        self.target.timeout
    }
}

#[async_trait::async_trait]
impl WebhookRelay for HttpWebhookRelay {
    async fn relay(&self, payload: &WebhookPayload) -> Result<(), RelayError> {
        let request = self.client.post(&self.target.url).json(payload);
        let request = match &self.target.auth {
            WebhookAuth::None => request,
            WebhookAuth::ApiKey(key) => request.header(API_KEY_HEADER, key),
            WebhookAuth::Bearer(key) => request.bearer_auth(key),
            WebhookAuth::Basic { user, pass } => request.basic_auth(user, Some(pass)),
        };

        debug!("sending submission to webhook");
        let resp = request.send().await.map_err(|e| {
            if e.is_timeout() {
                RelayError::Timeout {
                    after_secs: self.timeout().as_secs(),
                }
            } else {
                RelayError::Transport {
                    reason: e.to_string(),
                }
            }
        })?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }

        let body: String = resp
            .text()
            .await
            .unwrap_or_default()
            .chars()
            .take(MAX_LOGGED_BODY)
            .collect();
        warn!(status = %status, body = %body, "webhook rejected submission");
        Err(RelayError::Status {
            status: status.as_u16(),
            body,
        })
    }
}
