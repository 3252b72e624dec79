//! HTTP error types for the `leadgate` server.
//!
//! Every rejection in the gatekeeper pipeline is a [`GateError`]. Its
//! `Display` text is the exact client-facing message; operator detail is
//! logged where the error is raised and never reaches the response body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use leadgate_core::error::{RelayError, SubmissionError};

use crate::config::RelayErrorMode;

/// Rejection returned from the gatekeeper pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GateError {
    /// Anything other than `POST` or `OPTIONS`.
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// `Origin` missing or not on the allow-list.
    #[error("Origin not allowed")]
    OriginNotAllowed,

    /// User agent missing or denylisted.
    #[error("Request blocked")]
    RequestBlocked,

    /// Client exceeded its submissions for the current window.
    #[error("Too many requests. Please try again later.")]
    RateLimited,

    /// Honeypot field was filled.
    #[error("Invalid submission")]
    InvalidSubmission,

    #[error("Missing required fields")]
    MissingFields,

    #[error("Invalid email format")]
    InvalidEmail,

    #[error("Payload too large")]
    PayloadTooLarge,

    /// CAPTCHA is enabled and the form carries no token.
    #[error("Captcha verification required")]
    CaptchaRequired,

    /// The CAPTCHA provider rejected the token.
    #[error("Captcha verification failed. Please try again.")]
    CaptchaFailed,

    /// A required secret or URL is not configured.
    #[error("Server configuration error")]
    Configuration,

    /// The webhook answered with an error (gateway mode).
    #[error("Failed to send message")]
    BadGateway,

    /// The webhook did not answer in time (gateway mode).
    #[error("Request timeout")]
    GatewayTimeout,

    /// Catch-all for unexpected failures, including relay failures in
    /// uniform mode.
    #[error("Failed to process contact form. Please try again.")]
    Internal,
}

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl GateError {
    /// HTTP status for this rejection.
    pub fn status(self) -> StatusCode {
        match self {
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::OriginNotAllowed | Self::RequestBlocked => StatusCode::FORBIDDEN,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::InvalidSubmission
            | Self::MissingFields
            | Self::InvalidEmail
            | Self::CaptchaRequired
            | Self::CaptchaFailed => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Configuration | Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BadGateway => StatusCode::BAD_GATEWAY,
            Self::GatewayTimeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    /// Map a relay failure according to the configured reporting mode.
    pub fn from_relay(err: &RelayError, mode: RelayErrorMode) -> Self {
        match (mode, err) {
            (RelayErrorMode::Uniform, _) => Self::Internal,
            (RelayErrorMode::Gateway, RelayError::Timeout { .. }) => Self::GatewayTimeout,
            (RelayErrorMode::Gateway, RelayError::Status { .. } | RelayError::Transport { .. }) => {
                Self::BadGateway
            }
        }
    }
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
        };
        (self.status(), axum::Json(body)).into_response()
    }
}

impl From<SubmissionError> for GateError {
    fn from(err: SubmissionError) -> Self {
        match err {
            SubmissionError::Malformed { .. } => Self::Internal,
            SubmissionError::Honeypot => Self::InvalidSubmission,
            SubmissionError::MissingFields { .. } => Self::MissingFields,
            SubmissionError::InvalidEmail { .. } => Self::InvalidEmail,
            SubmissionError::PayloadTooLarge { .. } => Self::PayloadTooLarge,
        }
    }
}
