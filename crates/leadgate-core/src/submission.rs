//! Contact form submissions: parsing and validation.
//!
//! The body is decoded into a [`ContactSubmission`] where every field is
//! optional, then [`SubmissionValidator::validate`] applies the checks in a
//! fixed order (honeypot, required fields, email shape, size) and yields a
//! [`ValidSubmission`].

use regex::Regex;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::SubmissionError;

/// Largest accepted serialized submission, in bytes.
pub const MAX_PAYLOAD_BYTES: usize = 10_000;

/// Loose `local@domain.tld` shape.
pub const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

/// A submission exactly as the client sent it.
///
/// Fields that are missing or not JSON strings decode as `None`. Unknown
/// keys are dropped, but count towards [`ContactSubmission::serialized_len`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactSubmission {
    #[serde(default, deserialize_with = "string_or_none")]
    pub first_name: Option<String>,
    #[serde(default, deserialize_with = "string_or_none")]
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "string_or_none")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "string_or_none")]
    pub company: Option<String>,
    #[serde(default, deserialize_with = "string_or_none")]
    pub message: Option<String>,
    /// Hidden field; humans leave it empty.
    #[serde(default, deserialize_with = "string_or_none")]
    pub honeypot: Option<String>,
    /// Client-side submission time, ISO-8601.
    #[serde(default, deserialize_with = "string_or_none")]
    pub timestamp: Option<String>,
    #[serde(default, deserialize_with = "string_or_none")]
    pub captcha_token: Option<String>,
    /// Token key used by the hCaptcha widget.
    #[serde(default, deserialize_with = "string_or_none")]
    pub hcaptcha_token: Option<String>,
    /// Length of the whole body re-serialized as compact JSON.
    #[serde(skip)]
    size: usize,
}

fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

/// A submission that passed every content check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidSubmission {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub company: Option<String>,
    pub message: String,
    pub timestamp: Option<String>,
    pub captcha_token: Option<String>,
}

impl ContactSubmission {
    /// Decode a request body.
    ///
    /// An empty body, or any JSON value that is not an object, decodes as an
    /// empty form and is left to the field checks.
    ///
    /// # Errors
    ///
    /// Returns [`SubmissionError::Malformed`] if the body is not JSON.
    pub fn from_body(body: &[u8]) -> Result<Self, SubmissionError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        let malformed = |e: serde_json::Error| SubmissionError::Malformed {
            reason: e.to_string(),
        };

        let value: Value = serde_json::from_slice(body).map_err(malformed)?;
        let size = serde_json::to_vec(&value).map_err(malformed)?.len();
        let mut submission = match value {
            Value::Object(_) => serde_json::from_value(value).map_err(malformed)?,
            _ => Self::default(),
        };
        submission.size = size;
        Ok(submission)
    }

    /// The CAPTCHA token under either accepted key.
    pub fn token(&self) -> Option<&str> {
        self.captcha_token
            .as_deref()
            .or(self.hcaptcha_token.as_deref())
            .filter(|t| !t.is_empty())
    }

    /// Size of the submitted JSON re-serialized compactly, unknown keys
    /// included.
    pub fn serialized_len(&self) -> usize {
        self.size
    }
}

/// Content checks for decoded submissions.
#[derive(Debug, Clone)]
pub struct SubmissionValidator {
    email: Regex,
    max_bytes: usize,
}

impl SubmissionValidator {
    /// Build a validator using [`EMAIL_PATTERN`] and [`MAX_PAYLOAD_BYTES`].
    ///
    /// # Errors
    ///
    /// Returns [`regex::Error`] if the email pattern does not compile.
    pub fn new() -> Result<Self, regex::Error> {
        Self::with_limits(EMAIL_PATTERN, MAX_PAYLOAD_BYTES)
    }

    /// Build a validator with a custom email pattern and size limit.
    ///
    /// # Errors
    ///
    /// Returns [`regex::Error`] if `email_pattern` does not compile.
    pub fn with_limits(email_pattern: &str, max_bytes: usize) -> Result<Self, regex::Error> {
        Ok(Self {
            email: Regex::new(email_pattern)?,
            max_bytes,
        })
    }

    /// Whether `email` has an acceptable shape.
    pub fn is_valid_email(&self, email: &str) -> bool {
        self.email.is_match(email)
    }

    /// Run the content checks in order and return the validated form.
    ///
    /// # Errors
    ///
    /// - [`SubmissionError::Honeypot`] if the honeypot field is non-empty
    /// - [`SubmissionError::MissingFields`] if a required field is empty
    /// - [`SubmissionError::InvalidEmail`] if the email has the wrong shape
    /// - [`SubmissionError::PayloadTooLarge`] if the form exceeds the size
    ///   limit
    pub fn validate(
        &self,
        submission: ContactSubmission,
    ) -> Result<ValidSubmission, SubmissionError> {
        if submission.honeypot.as_deref().is_some_and(|h| !h.is_empty()) {
            return Err(SubmissionError::Honeypot);
        }

        let missing: Vec<&'static str> = [
            ("firstName", &submission.first_name),
            ("lastName", &submission.last_name),
            ("email", &submission.email),
            ("message", &submission.message),
        ]
        .into_iter()
        .filter(|(_, value)| value.as_deref().is_none_or(str::is_empty))
        .map(|(name, _)| name)
        .collect();
        if !missing.is_empty() {
            return Err(SubmissionError::MissingFields { fields: missing });
        }

        let email = submission.email.clone().unwrap_or_default();
        if !self.is_valid_email(&email) {
            return Err(SubmissionError::InvalidEmail { email });
        }

        let size = submission.serialized_len();
        if size > self.max_bytes {
            return Err(SubmissionError::PayloadTooLarge {
                size,
                limit: self.max_bytes,
            });
        }

        let captcha_token = submission.token().map(str::to_owned);
        Ok(ValidSubmission {
            first_name: submission.first_name.unwrap_or_default(),
            last_name: submission.last_name.unwrap_or_default(),
            email,
            company: submission.company.filter(|c| !c.is_empty()),
            message: submission.message.unwrap_or_default(),
            timestamp: submission.timestamp.filter(|t| !t.is_empty()),
            captcha_token,
        })
    }
}
