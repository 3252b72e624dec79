//! Error types for `leadgate-core`.
//!
//! Messages are written for operator logs. They may contain the offending
//! value and must never be copied verbatim into a client response.

/// Why a submitted form was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionError {
    /// The body could not be decoded as a JSON object of string fields.
    #[error("malformed submission body: {reason}")]
    Malformed { reason: String },

    /// The hidden honeypot field was filled in.
    #[error("honeypot field was filled")]
    Honeypot,

    /// One or more of the required fields is absent or empty.
    #[error("missing required fields: {}", fields.join(", "))]
    MissingFields { fields: Vec<&'static str> },

    /// The email address does not have a `local@domain.tld` shape.
    #[error("invalid email address '{email}'")]
    InvalidEmail { email: String },

    /// The serialized submission exceeds the size limit.
    #[error("submission is {size} bytes, limit is {limit}")]
    PayloadTooLarge { size: usize, limit: usize },
}

/// Errors from relaying a payload to the webhook.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The webhook answered with a non-2xx status. `body` is the truncated
    /// response body, logged once by the relay.
    #[error("webhook returned status {status}")]
    Status { status: u16, body: String },

    /// The webhook did not answer within the configured timeout.
    #[error("webhook timed out after {after_secs}s")]
    Timeout { after_secs: u64 },

    /// The request could not be sent or the connection failed.
    #[error("webhook transport error: {reason}")]
    Transport { reason: String },
}

/// Errors from CAPTCHA verification.
#[derive(Debug, thiserror::Error)]
pub enum CaptchaError {
    /// The provider rejected the token.
    #[error("captcha token rejected: [{}]", codes.join(", "))]
    Rejected { codes: Vec<String> },

    /// The provider could not be reached or returned an unreadable answer.
    #[error("captcha provider error: {reason}")]
    Provider { reason: String },
}
