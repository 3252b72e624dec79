//! Normalized body relayed to the webhook.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::submission::ValidSubmission;

/// Channel marker attached to every relayed submission.
pub const SOURCE_CONTACT_FORM: &str = "contact_form";

/// Request details forwarded alongside the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestMetadata {
    pub user_agent: String,
    pub ip: String,
    pub origin: String,
}

/// The JSON document posted to the webhook.
///
/// Built only from a [`ValidSubmission`], so the honeypot value and the
/// CAPTCHA token can never reach the webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Empty when the visitor left it blank.
    pub company: String,
    pub message: String,
    pub timestamp: String,
    pub source: String,
    pub metadata: RequestMetadata,
}

impl WebhookPayload {
    /// Shape a validated submission for the webhook.
    ///
    /// `received_at` stands in for the timestamp when the client sent none.
    pub fn new(
        submission: &ValidSubmission,
        metadata: RequestMetadata,
        received_at: DateTime<Utc>,
    ) -> Self {
        let timestamp = submission
            .timestamp
            .clone()
            .unwrap_or_else(|| received_at.to_rfc3339_opts(SecondsFormat::Millis, true));

        Self {
            first_name: submission.first_name.clone(),
            last_name: submission.last_name.clone(),
            email: submission.email.clone(),
            company: submission.company.clone().unwrap_or_default(),
            message: submission.message.clone(),
            timestamp,
            source: SOURCE_CONTACT_FORM.to_owned(),
            metadata,
        }
    }
}
