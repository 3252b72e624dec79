//! Server configuration for `leadgate`.
//!
//! Loads configuration from environment variables with sensible defaults.
//! Secrets (webhook credentials, CAPTCHA secret) are never defaulted; when
//! they are missing the gatekeeper answers `Server configuration error` at
//! the stage that needs them.

use std::net::SocketAddr;
use std::time::Duration;

use leadgate_core::agent::DEFAULT_BLOCKED_AGENTS;
use leadgate_core::origin::{DEFAULT_ALLOWED_ORIGINS, DEFAULT_PREVIEW_PATTERN};
use leadgate_store::{DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW};

/// Default hCaptcha verification endpoint.
pub const DEFAULT_CAPTCHA_VERIFY_URL: &str = "https://api.hcaptcha.com/siteverify";

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the HTTP listener to.
    pub bind_addr: SocketAddr,
    /// Log level filter used when `RUST_LOG` is unset.
    pub log_level: String,
    /// Origins allowed by exact match.
    pub allowed_origins: Vec<String>,
    /// Regex for preview-deployment origins (`None` disables).
    pub preview_origin_pattern: Option<String>,
    /// User-agent tokens that block a request.
    pub blocked_agents: Vec<String>,
    /// Admitted submissions per client per window.
    pub rate_limit_max: u32,
    /// Fixed rate-limit window.
    pub rate_limit_window: Duration,
    /// Downstream webhook settings.
    pub webhook: WebhookConfig,
    /// How relay failures are reported to the client.
    pub relay_error_mode: RelayErrorMode,
    /// CAPTCHA verification settings.
    pub captcha: CaptchaConfig,
}

/// Raw webhook settings as read from the environment.
#[derive(Clone, Default)]
pub struct WebhookConfig {
    pub url: Option<String>,
    /// Requested scheme; `None` picks `api-key` when a key is present.
    pub auth: Option<AuthScheme>,
    pub api_key: Option<String>,
    pub basic_user: Option<String>,
    pub basic_pass: Option<String>,
    pub timeout: Duration,
}

/// Authentication scheme names accepted in `LEADGATE_WEBHOOK_AUTH`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    None,
    ApiKey,
    Bearer,
    Basic,
}

/// Credentials attached to each relay request.
#[derive(Clone, PartialEq, Eq)]
pub enum WebhookAuth {
    /// No credentials.
    None,
    /// `x-make-apikey: <key>`.
    ApiKey(String),
    /// `Authorization: Bearer <key>`.
    Bearer(String),
    /// HTTP Basic authentication.
    Basic { user: String, pass: String },
}

/// A complete, usable relay destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookTarget {
    pub url: String,
    pub auth: WebhookAuth,
    pub timeout: Duration,
}

/// Why the webhook relay cannot be used.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A required variable is unset or empty.
    #[error("{name} is not configured")]
    Missing { name: &'static str },
}

/// Mapping of relay failures onto client-visible statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RelayErrorMode {
    /// Every relay failure is a 500.
    #[default]
    Uniform,
    /// Upstream errors are 502 and timeouts are 504.
    Gateway,
}

/// CAPTCHA verification settings.
#[derive(Clone, Default)]
pub struct CaptchaConfig {
    /// Whether submissions must carry a verified token.
    pub required: bool,
    pub secret: Option<String>,
    pub sitekey: Option<String>,
    pub verify_url: String,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `PORT` — port to bind on, binds to `0.0.0.0`
    /// - `LEADGATE_BIND_ADDR` — full bind address (overrides `PORT`, default: `127.0.0.1:8787`)
    /// - `LEADGATE_LOG_LEVEL` — log filter (default: `info`)
    /// - `LEADGATE_ALLOWED_ORIGINS` — comma-separated exact origins
    /// - `LEADGATE_PREVIEW_ORIGIN_PATTERN` — preview origin regex, empty disables
    /// - `LEADGATE_BLOCKED_AGENTS` — comma-separated user-agent tokens
    /// - `LEADGATE_RATE_LIMIT_MAX` — submissions per window (default: `5`)
    /// - `LEADGATE_RATE_LIMIT_WINDOW_SECS` — window length (default: `900`)
    /// - `LEADGATE_WEBHOOK_URL` — relay destination
    /// - `LEADGATE_WEBHOOK_AUTH` — `none`, `api-key`, `bearer` or `basic`
    /// - `LEADGATE_WEBHOOK_API_KEY` — key for `api-key` and `bearer`
    /// - `LEADGATE_WEBHOOK_BASIC_USER` / `LEADGATE_WEBHOOK_BASIC_PASS`
    /// - `LEADGATE_WEBHOOK_TIMEOUT_SECS` — relay timeout (default: `15`)
    /// - `LEADGATE_RELAY_ERROR_MODE` — `uniform` or `gateway` (default: `uniform`)
    /// - `LEADGATE_CAPTCHA_REQUIRED` — require a CAPTCHA token (default: `false`)
    /// - `LEADGATE_CAPTCHA_SECRET` / `LEADGATE_CAPTCHA_SITEKEY`
    /// - `LEADGATE_CAPTCHA_VERIFY_URL` — verification endpoint
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        // Empty values count as unset.
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        // Priority: LEADGATE_BIND_ADDR > PORT > default 127.0.0.1:8787
        let default_addr = SocketAddr::from(([127, 0, 0, 1], 8787));
        let bind_addr = if let Some(addr) = var("LEADGATE_BIND_ADDR") {
            addr.parse().unwrap_or(default_addr)
        } else if let Some(port) = var("PORT") {
            SocketAddr::from(([0, 0, 0, 0], port.parse().unwrap_or(8787)))
        } else {
            default_addr
        };

        let log_level = var("LEADGATE_LOG_LEVEL").unwrap_or_else(|| "info".to_owned());

        let allowed_origins = var("LEADGATE_ALLOWED_ORIGINS").map_or_else(
            || DEFAULT_ALLOWED_ORIGINS.iter().map(|&o| o.to_owned()).collect(),
            |v| split_list(&v),
        );

        // Set-but-empty disables previews, so read the raw value here.
        let preview_origin_pattern = match lookup("LEADGATE_PREVIEW_ORIGIN_PATTERN") {
            Some(p) if p.trim().is_empty() => None,
            Some(p) => Some(p),
            None => Some(DEFAULT_PREVIEW_PATTERN.to_owned()),
        };

        let blocked_agents = var("LEADGATE_BLOCKED_AGENTS").map_or_else(
            || DEFAULT_BLOCKED_AGENTS.iter().map(|&a| a.to_owned()).collect(),
            |v| split_list(&v),
        );

        let rate_limit_max = var("LEADGATE_RATE_LIMIT_MAX")
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_MAX_REQUESTS);

        let rate_limit_window = var("LEADGATE_RATE_LIMIT_WINDOW_SECS")
            .and_then(|v| v.parse().ok())
            .map_or(DEFAULT_WINDOW, Duration::from_secs);

        let webhook = WebhookConfig {
            url: var("LEADGATE_WEBHOOK_URL"),
            auth: var("LEADGATE_WEBHOOK_AUTH").and_then(|v| parse_auth_scheme(&v)),
            api_key: var("LEADGATE_WEBHOOK_API_KEY"),
            basic_user: var("LEADGATE_WEBHOOK_BASIC_USER"),
            basic_pass: var("LEADGATE_WEBHOOK_BASIC_PASS"),
            timeout: var("LEADGATE_WEBHOOK_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .map_or(Duration::from_secs(15), Duration::from_secs),
        };

        let relay_error_mode = match var("LEADGATE_RELAY_ERROR_MODE")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "gateway" => RelayErrorMode::Gateway,
            _ => RelayErrorMode::Uniform,
        };

        let captcha = CaptchaConfig {
            required: var("LEADGATE_CAPTCHA_REQUIRED").is_some_and(|v| v == "true" || v == "1"),
            secret: var("LEADGATE_CAPTCHA_SECRET"),
            sitekey: var("LEADGATE_CAPTCHA_SITEKEY"),
            verify_url: var("LEADGATE_CAPTCHA_VERIFY_URL")
                .unwrap_or_else(|| DEFAULT_CAPTCHA_VERIFY_URL.to_owned()),
        };

        Self {
            bind_addr,
            log_level,
            allowed_origins,
            preview_origin_pattern,
            blocked_agents,
            rate_limit_max,
            rate_limit_window,
            webhook,
            relay_error_mode,
            captcha,
        }
    }
}

impl WebhookConfig {
    /// Resolve the raw settings into a relay destination.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] naming the first variable the chosen
    /// scheme needs but does not have.
    pub fn target(&self) -> Result<WebhookTarget, ConfigError> {
        let url = self.url.clone().ok_or(ConfigError::Missing {
            name: "LEADGATE_WEBHOOK_URL",
        })?;

        let scheme = self.auth.unwrap_or(if self.api_key.is_some() {
            AuthScheme::ApiKey
        } else {
            AuthScheme::None
        });

        let api_key = || {
            self.api_key.clone().ok_or(ConfigError::Missing {
                name: "LEADGATE_WEBHOOK_API_KEY",
            })
        };

        let auth = match scheme {
            AuthScheme::None => WebhookAuth::None,
            AuthScheme::ApiKey => WebhookAuth::ApiKey(api_key()?),
            AuthScheme::Bearer => WebhookAuth::Bearer(api_key()?),
            AuthScheme::Basic => WebhookAuth::Basic {
                user: self.basic_user.clone().ok_or(ConfigError::Missing {
                    name: "LEADGATE_WEBHOOK_BASIC_USER",
                })?,
                pass: self.basic_pass.clone().ok_or(ConfigError::Missing {
                    name: "LEADGATE_WEBHOOK_BASIC_PASS",
                })?,
            },
        };

        Ok(WebhookTarget {
            url,
            auth,
            timeout: self.timeout,
        })
    }
}

impl std::fmt::Debug for WebhookConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookConfig")
            .field("url", &self.url.as_ref().map(|_| "[redacted]"))
            .field("auth", &self.auth)
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .field("basic_user", &self.basic_user)
            .field("basic_pass", &self.basic_pass.as_ref().map(|_| "[redacted]"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl std::fmt::Debug for WebhookAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::ApiKey(_) => f.write_str("ApiKey([redacted])"),
            Self::Bearer(_) => f.write_str("Bearer([redacted])"),
            Self::Basic { user, .. } => write!(f, "Basic {{ user: {user:?}, pass: [redacted] }}"),
        }
    }
}

impl std::fmt::Debug for CaptchaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptchaConfig")
            .field("required", &self.required)
            .field("secret", &self.secret.as_ref().map(|_| "[redacted]"))
            .field("sitekey", &self.sitekey)
            .field("verify_url", &self.verify_url)
            .finish()
    }
}

fn parse_auth_scheme(value: &str) -> Option<AuthScheme> {
    match value.trim().to_lowercase().as_str() {
        "none" => Some(AuthScheme::None),
        "api-key" | "apikey" | "x-make-apikey" => Some(AuthScheme::ApiKey),
        "bearer" => Some(AuthScheme::Bearer),
        "basic" => Some(AuthScheme::Basic),
        _ => None,
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}
