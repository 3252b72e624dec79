//! hCaptcha token verification.

use serde::Deserialize;
use tracing::debug;

use leadgate_core::error::CaptchaError;
use leadgate_core::relay::CaptchaVerifier;

/// Verification endpoint answer.
#[derive(Debug, Deserialize)]
struct VerifyResponse {
    success: bool,
    #[serde(default, rename = "error-codes")]
    error_codes: Vec<String>,
}

/// [`CaptchaVerifier`] that calls an hCaptcha-compatible `siteverify`
/// endpoint with a form-encoded body.
#[derive(Clone)]
pub struct HCaptchaVerifier {
    client: reqwest::Client,
    verify_url: String,
    secret: String,
    sitekey: Option<String>,
}

impl HCaptchaVerifier {
    /// Create a verifier for `verify_url` using `secret`.
    pub fn new(
        client: reqwest::Client,
        verify_url: String,
        secret: String,
        sitekey: Option<String>,
    ) -> Self {
        Self {
            client,
            verify_url,
            secret,
            sitekey,
        }
    }
}

impl std::fmt::Debug for HCaptchaVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HCaptchaVerifier")
            .field("verify_url", &self.verify_url)
            .field("sitekey", &self.sitekey)
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl CaptchaVerifier for HCaptchaVerifier {
    async fn verify(&self, token: &str, remote_ip: Option<&str>) -> Result<(), CaptchaError> {
        let mut form = vec![("secret", self.secret.as_str()), ("response", token)];
        if let Some(ip) = remote_ip {
            form.push(("remoteip", ip));
        }
        if let Some(sitekey) = &self.sitekey {
            form.push(("sitekey", sitekey.as_str()));
        }

        let resp = self
            .client
            .post(&self.verify_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| CaptchaError::Provider {
                reason: format!("verification request failed: {e}"),
            })?;

        let result: VerifyResponse = resp.json().await.map_err(|e| CaptchaError::Provider {
            reason: format!("failed to parse verification response: {e}"),
        })?;

        if result.success {
            debug!("captcha token verified");
            Ok(())
        } else {
            Err(CaptchaError::Rejected {
                codes: result.error_codes,
            })
        }
    }
}
