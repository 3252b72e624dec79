//! Contact form gatekeeper: `/api/contact`
//!
//! One handler runs the whole pipeline. Each stage either passes or ends the
//! request with a [`GateError`]; later stages never run after a failure:
//!
//! 1. `OPTIONS` preflight answers immediately
//! 2. method must be `POST`
//! 3. origin allow-list
//! 4. user-agent denylist
//! 5. per-client rate limit
//! 6. body read and decode, honeypot, required fields, email shape, size
//! 7. CAPTCHA (when enabled)
//! 8. relay configuration present
//! 9. single relay call to the webhook
//!
//! Every response carries the CORS headers computed from the request origin.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::header::{AsHeaderName, ORIGIN, USER_AGENT};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn, Instrument};

use leadgate_core::client::{client_key, UNKNOWN_CLIENT};
use leadgate_core::error::{CaptchaError, SubmissionError};
use leadgate_core::payload::{RequestMetadata, WebhookPayload};
use leadgate_core::submission::{ContactSubmission, SubmissionValidator, ValidSubmission};

use crate::cors::cors_headers;
use crate::error::GateError;
use crate::state::{AppState, CaptchaGate};

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_REAL_IP: &str = "x-real-ip";

/// Bodies longer than this are refused before decoding. Anything this large
/// is far over the submission size limit even with whitespace stripped.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Build the contact router. Every method is routed to the gatekeeper so it
/// can answer preflights and 405s with CORS headers.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/api/contact", any(handle))
}

// ── Types ────────────────────────────────────────────────────────────

/// Body returned for an accepted submission.
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub success: bool,
    pub message: String,
}

impl SubmitResponse {
    fn accepted() -> Self {
        Self {
            success: true,
            message: "Contact form submitted successfully".to_owned(),
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────

/// `ANY /api/contact` — run one request through the gatekeeper.
///
/// The body is taken unbuffered so that oversized requests still pass
/// through the earlier stages and get CORS headers on their rejection.
pub async fn handle(
    State(state): State<Arc<AppState>>,
    method: Method,
    headers: HeaderMap,
    body: Body,
) -> Response {
    let allowed_origin = state.origins.allowed(header_str(&headers, ORIGIN));
    let cors = cors_headers(allowed_origin);

    if method == Method::OPTIONS {
        return (StatusCode::OK, cors).into_response();
    }

    let span = tracing::info_span!(
        "contact_submission",
        request_id = %uuid::Uuid::new_v4(),
        method = %method,
    );
    let result = gatekeep(&state, &method, &headers, allowed_origin, body)
        .instrument(span)
        .await;

    (cors, result).into_response()
}

async fn gatekeep(
    state: &AppState,
    method: &Method,
    headers: &HeaderMap,
    allowed_origin: Option<&str>,
    body: Body,
) -> Result<Json<SubmitResponse>, GateError> {
    if method != Method::POST {
        return Err(GateError::MethodNotAllowed);
    }

    let Some(origin) = allowed_origin else {
        warn!(origin = ?header_str(headers, ORIGIN), "origin not allowed");
        return Err(GateError::OriginNotAllowed);
    };

    let user_agent = header_str(headers, USER_AGENT);
    if state.agents.is_blocked(user_agent) {
        warn!(user_agent = ?user_agent, "suspicious user agent blocked");
        return Err(GateError::RequestBlocked);
    }

    let client = client_key(
        header_str(headers, X_FORWARDED_FOR),
        header_str(headers, X_REAL_IP),
    );
    match state.rate_limits.check_and_increment(&client).await {
        Ok(true) => {}
        Ok(false) => {
            warn!(client = %client, "rate limit exceeded");
            return Err(GateError::RateLimited);
        }
        Err(e) => {
            warn!(client = %client, error = %e, "rate-limit store failed, admitting request");
        }
    }

    let body = axum::body::to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|e| {
            warn!(error = %e, limit = MAX_BODY_BYTES, "contact submission body unreadable");
            GateError::PayloadTooLarge
        })?;

    let submission = validate(&state.validator, &body)?;

    verify_captcha(state, &submission, &client).await?;

    let Some(relay) = &state.relay else {
        error!("webhook relay is not configured");
        return Err(GateError::Configuration);
    };

    let payload = WebhookPayload::new(
        &submission,
        RequestMetadata {
            user_agent: user_agent.unwrap_or_default().to_owned(),
            ip: client.clone(),
            origin: origin.to_owned(),
        },
        Utc::now(),
    );

    if let Err(e) = relay.relay(&payload).await {
        error!(client = %client, error = %e, "webhook relay failed");
        return Err(GateError::from_relay(&e, state.relay_error_mode));
    }

    info!(client = %client, "contact submission relayed");
    Ok(Json(SubmitResponse::accepted()))
}

/// Decode and validate the body, logging why a submission was refused.
fn validate(
    validator: &SubmissionValidator,
    body: &[u8],
) -> Result<ValidSubmission, GateError> {
    ContactSubmission::from_body(body)
        .and_then(|submission| validator.validate(submission))
        .map_err(|e| {
            match &e {
                SubmissionError::Malformed { .. } => {
                    error!(error = %e, "failed to decode contact submission");
                }
                SubmissionError::Honeypot => warn!("honeypot triggered, potential spam"),
                SubmissionError::MissingFields { fields } => {
                    info!(?fields, "contact submission missing required fields");
                }
                SubmissionError::InvalidEmail { .. } => info!("contact submission has invalid email"),
                SubmissionError::PayloadTooLarge { size, limit } => {
                    warn!(size, limit, "contact submission too large");
                }
            }
            GateError::from(e)
        })
}

async fn verify_captcha(
    state: &AppState,
    submission: &ValidSubmission,
    client: &str,
) -> Result<(), GateError> {
    let verifier = match &state.captcha {
        CaptchaGate::Disabled => return Ok(()),
        CaptchaGate::Misconfigured => {
            // The token check comes first so clients without one get a 400.
            if submission.captcha_token.is_none() {
                return Err(GateError::CaptchaRequired);
            }
            error!("captcha secret is not configured");
            return Err(GateError::Configuration);
        }
        CaptchaGate::Enabled(verifier) => verifier,
    };

    let Some(token) = submission.captcha_token.as_deref() else {
        return Err(GateError::CaptchaRequired);
    };

    let remote_ip = (client != UNKNOWN_CLIENT).then_some(client);
    match verifier.verify(token, remote_ip).await {
        Ok(()) => Ok(()),
        Err(e @ CaptchaError::Rejected { .. }) => {
            warn!(error = %e, "captcha verification failed");
            Err(GateError::CaptchaFailed)
        }
        Err(e @ CaptchaError::Provider { .. }) => {
            error!(error = %e, "captcha provider unavailable");
            Err(GateError::Internal)
        }
    }
}

fn header_str<K: AsHeaderName>(headers: &HeaderMap, name: K) -> Option<&str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
