//! Browser origin allow-list.
//!
//! An origin is allowed when it exactly matches one of the configured
//! origins, or when it matches the hosting platform's preview-deployment
//! pattern. A request without an `Origin` header is never allowed.

use regex::Regex;

/// Production and local development origins accepted out of the box.
pub const DEFAULT_ALLOWED_ORIGINS: &[&str] = &[
    "https://gigglebyte.ltd",
    "https://www.gigglebyte.ltd",
    "http://localhost:8080",
    "http://localhost:5173",
];

/// Preview deployments are served from `https://<slug>.netlify.app`.
pub const DEFAULT_PREVIEW_PATTERN: &str = r"^https://[a-z0-9-]+\.netlify\.app$";

/// Decides which origins may submit the form.
#[derive(Debug, Clone)]
pub struct OriginPolicy {
    exact: Vec<String>,
    preview: Option<Regex>,
}

impl OriginPolicy {
    /// Build a policy from exact origins and an optional preview pattern.
    ///
    /// # Errors
    ///
    /// Returns [`regex::Error`] if `preview_pattern` does not compile.
    pub fn new<I, S>(exact: I, preview_pattern: Option<&str>) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let preview = preview_pattern
            .filter(|p| !p.is_empty())
            .map(Regex::new)
            .transpose()?;

        Ok(Self {
            exact: exact.into_iter().map(Into::into).collect(),
            preview,
        })
    }

    /// Whether `origin` passes the allow-list.
    pub fn allows(&self, origin: Option<&str>) -> bool {
        self.allowed(origin).is_some()
    }

    /// The origin to echo back in `Access-Control-Allow-Origin`, or `None`
    /// when the origin is missing or not allowed.
    pub fn allowed<'a>(&self, origin: Option<&'a str>) -> Option<&'a str> {
        let origin = origin.filter(|o| !o.is_empty())?;

        if self.exact.iter().any(|allowed| allowed == origin) {
            return Some(origin);
        }

        match &self.preview {
            Some(pattern) if pattern.is_match(origin) => Some(origin),
            _ => None,
        }
    }
}
