//! Pipeline tests for `/api/contact`.
//!
//! These drive the full router with `oneshot`, substituting recording fakes
//! for the webhook relay and the CAPTCHA provider so that every stage can be
//! observed without network access.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::http::header::{ACCESS_CONTROL_ALLOW_ORIGIN, X_CONTENT_TYPE_OPTIONS};
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use leadgate_core::agent::AgentFilter;
use leadgate_core::error::{CaptchaError, RelayError};
use leadgate_core::origin::{OriginPolicy, DEFAULT_ALLOWED_ORIGINS, DEFAULT_PREVIEW_PATTERN};
use leadgate_core::payload::WebhookPayload;
use leadgate_core::relay::{CaptchaVerifier, WebhookRelay};
use leadgate_core::submission::SubmissionValidator;
use leadgate_server::config::RelayErrorMode;
use leadgate_server::routes::build_router;
use leadgate_server::state::{AppState, CaptchaGate};
use leadgate_store::{MemoryStore, RateLimitStore, StoreError};

const ORIGIN: &str = "https://gigglebyte.ltd";
const BROWSER: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";
const CLIENT_IP: &str = "192.168.1.1";
const WINDOW: Duration = Duration::from_secs(15 * 60);

// ── Fakes ────────────────────────────────────────────────────────────

#[derive(Clone, Copy)]
enum RelayBehaviour {
    Accept,
    Status(u16),
    Timeout,
}

struct RecordingRelay {
    behaviour: RelayBehaviour,
    calls: Mutex<Vec<WebhookPayload>>,
}

impl RecordingRelay {
    fn new(behaviour: RelayBehaviour) -> Arc<Self> {
        Arc::new(Self {
            behaviour,
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<WebhookPayload> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl WebhookRelay for RecordingRelay {
    async fn relay(&self, payload: &WebhookPayload) -> Result<(), RelayError> {
        self.calls.lock().unwrap().push(payload.clone());
        match self.behaviour {
            RelayBehaviour::Accept => Ok(()),
            RelayBehaviour::Status(status) => Err(RelayError::Status {
                status,
                body: "Error".to_owned(),
            }),
            RelayBehaviour::Timeout => Err(RelayError::Timeout { after_secs: 15 }),
        }
    }
}

#[derive(Clone, Copy)]
enum CaptchaBehaviour {
    Accept,
    Reject,
    Unreachable,
}

struct FakeCaptcha {
    behaviour: CaptchaBehaviour,
    calls: Mutex<Vec<(String, Option<String>)>>,
}

impl FakeCaptcha {
    fn new(behaviour: CaptchaBehaviour) -> Arc<Self> {
        Arc::new(Self {
            behaviour,
            calls: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait::async_trait]
impl CaptchaVerifier for FakeCaptcha {
    async fn verify(&self, token: &str, remote_ip: Option<&str>) -> Result<(), CaptchaError> {
        self.calls
            .lock()
            .unwrap()
            .push((token.to_owned(), remote_ip.map(str::to_owned)));
        match self.behaviour {
            CaptchaBehaviour::Accept => Ok(()),
            CaptchaBehaviour::Reject => Err(CaptchaError::Rejected {
                codes: vec!["invalid-input-response".to_owned()],
            }),
            CaptchaBehaviour::Unreachable => Err(CaptchaError::Provider {
                reason: "connection refused".to_owned(),
            }),
        }
    }
}

struct FailingStore;

#[async_trait::async_trait]
impl RateLimitStore for FailingStore {
    async fn check_and_increment(&self, _key: &str) -> Result<bool, StoreError> {
        Err(StoreError::Unavailable {
            reason: "connection reset".to_owned(),
        })
    }

    async fn reset(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

// ── Harness ──────────────────────────────────────────────────────────

struct Harness {
    app: Router,
    relay: Arc<RecordingRelay>,
    store: MemoryStore,
}

struct HarnessBuilder {
    relay: Option<Arc<RecordingRelay>>,
    relay_error_mode: RelayErrorMode,
    captcha: CaptchaGate,
    store: Option<Arc<dyn RateLimitStore>>,
}

impl HarnessBuilder {
    fn new() -> Self {
        Self {
            relay: Some(RecordingRelay::new(RelayBehaviour::Accept)),
            relay_error_mode: RelayErrorMode::Uniform,
            captcha: CaptchaGate::Disabled,
            store: None,
        }
    }

    fn relay(mut self, behaviour: RelayBehaviour) -> Self {
        self.relay = Some(RecordingRelay::new(behaviour));
        self
    }

    fn without_relay(mut self) -> Self {
        self.relay = None;
        self
    }

    fn gateway_errors(mut self) -> Self {
        self.relay_error_mode = RelayErrorMode::Gateway;
        self
    }

    fn captcha(mut self, captcha: CaptchaGate) -> Self {
        self.captcha = captcha;
        self
    }

    fn store(mut self, store: Arc<dyn RateLimitStore>) -> Self {
        self.store = Some(store);
        self
    }

    fn build(self) -> Harness {
        let memory = MemoryStore::new(5, WINDOW);
        let relay = self
            .relay
            .clone()
            .unwrap_or_else(|| RecordingRelay::new(RelayBehaviour::Accept));
        let state = AppState {
            origins: OriginPolicy::new(
                DEFAULT_ALLOWED_ORIGINS.iter().copied(),
                Some(DEFAULT_PREVIEW_PATTERN),
            )
            .unwrap(),
            agents: AgentFilter::default(),
            validator: SubmissionValidator::new().unwrap(),
            rate_limits: self
                .store
                .unwrap_or_else(|| Arc::new(memory.clone()) as Arc<dyn RateLimitStore>),
            relay: self.relay.map(|r| r as Arc<dyn WebhookRelay>),
            relay_error_mode: self.relay_error_mode,
            captcha: self.captcha,
        };
        Harness {
            app: build_router(Arc::new(state)),
            relay,
            store: memory,
        }
    }
}

struct Reply {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl Reply {
    fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    fn error(&self) -> String {
        self.json()["error"].as_str().unwrap().to_owned()
    }
}

fn valid_form() -> Value {
    json!({
        "firstName": "John",
        "lastName": "Doe",
        "email": "john@example.com",
        "company": "Test Corp",
        "message": "This is a valid test message for E2E testing.",
        "timestamp": "2026-10-19T09:15:00.000Z",
    })
}

fn default_headers() -> Vec<(&'static str, &'static str)> {
    vec![
        ("origin", ORIGIN),
        ("user-agent", BROWSER),
        ("x-forwarded-for", CLIENT_IP),
        ("content-type", "application/json"),
    ]
}

async fn send(app: &Router, method: &str, headers: &[(&str, &str)], body: String) -> Reply {
    let mut builder = Request::builder().method(method).uri("/api/contact");
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let resp = app
        .clone()
        .oneshot(builder.body(Body::from(body)).unwrap())
        .await
        .unwrap();

    let status = resp.status();
    let headers = resp.headers().clone();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec();
    Reply {
        status,
        headers,
        body,
    }
}

async fn post(app: &Router, form: &Value) -> Reply {
    send(app, "POST", &default_headers(), form.to_string()).await
}

async fn post_with(app: &Router, headers: &[(&str, &str)], form: &Value) -> Reply {
    send(app, "POST", headers, form.to_string()).await
}

fn without(form: &Value, key: &str) -> Value {
    let mut form = form.clone();
    form.as_object_mut().unwrap().remove(key);
    form
}

fn with(form: &Value, key: &str, value: Value) -> Value {
    let mut form = form.clone();
    form[key] = value;
    form
}

// ── Method and CORS ──────────────────────────────────────────────────

#[tokio::test]
async fn preflight_returns_empty_200_with_cors() {
    let h = HarnessBuilder::new().build();
    let reply = send(&h.app, "OPTIONS", &default_headers(), String::new()).await;

    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.body.is_empty());
    assert_eq!(reply.headers[ACCESS_CONTROL_ALLOW_ORIGIN], ORIGIN);
    assert_eq!(reply.headers["access-control-allow-headers"], "Content-Type");
    assert_eq!(reply.headers["access-control-allow-methods"], "POST, OPTIONS");
}

#[tokio::test]
async fn preflight_bypasses_every_other_check() {
    let h = HarnessBuilder::new().build();
    let headers = [("origin", "https://malicious-site.com"), ("user-agent", "curl/8.0")];
    let reply = send(&h.app, "OPTIONS", &headers, "not json".to_owned()).await;

    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.body.is_empty());
    assert_eq!(reply.headers[ACCESS_CONTROL_ALLOW_ORIGIN], "");
    assert!(h.store.is_empty().await);
}

#[tokio::test]
async fn other_methods_are_405() {
    let h = HarnessBuilder::new().build();
    for method in ["GET", "PUT", "DELETE", "PATCH"] {
        let reply = send(&h.app, method, &default_headers(), String::new()).await;
        assert_eq!(reply.status, StatusCode::METHOD_NOT_ALLOWED, "{method}");
        assert_eq!(reply.error(), "Method not allowed");
        assert_eq!(reply.headers[ACCESS_CONTROL_ALLOW_ORIGIN], ORIGIN);
    }
    assert!(h.relay.calls().is_empty());
}

#[tokio::test]
async fn allowed_origin_is_echoed_on_success() {
    let h = HarnessBuilder::new().build();
    let reply = post(&h.app, &valid_form()).await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.headers[ACCESS_CONTROL_ALLOW_ORIGIN], ORIGIN);
    assert_eq!(reply.headers[X_CONTENT_TYPE_OPTIONS], "nosniff");
    assert_eq!(reply.headers["cache-control"], "no-store");
}

// ── Origin ───────────────────────────────────────────────────────────

#[tokio::test]
async fn known_and_preview_origins_are_accepted() {
    let h = HarnessBuilder::new().build();
    for origin in [
        "https://www.gigglebyte.ltd",
        "http://localhost:8080",
        "http://localhost:5173",
        "https://deploy-preview-123.netlify.app",
    ] {
        let headers = [("Origin", origin), ("User-Agent", BROWSER)];
        let reply = post_with(&h.app, &headers, &valid_form()).await;
        assert_eq!(reply.status, StatusCode::OK, "{origin}");
        assert_eq!(reply.headers[ACCESS_CONTROL_ALLOW_ORIGIN], origin);
        h.store.reset().await.unwrap();
    }
}

#[tokio::test]
async fn unknown_origin_is_403_with_empty_cors() {
    let h = HarnessBuilder::new().build();
    let headers = [
        ("origin", "https://malicious-site.com"),
        ("user-agent", BROWSER),
        ("x-forwarded-for", CLIENT_IP),
    ];
    let reply = post_with(&h.app, &headers, &valid_form()).await;

    assert_eq!(reply.status, StatusCode::FORBIDDEN);
    assert_eq!(reply.error(), "Origin not allowed");
    assert_eq!(reply.headers[ACCESS_CONTROL_ALLOW_ORIGIN], "");
    assert!(h.relay.calls().is_empty());
}

#[tokio::test]
async fn missing_origin_is_403() {
    let h = HarnessBuilder::new().build();
    let headers = [("user-agent", BROWSER), ("x-forwarded-for", CLIENT_IP)];
    let reply = post_with(&h.app, &headers, &valid_form()).await;

    assert_eq!(reply.status, StatusCode::FORBIDDEN);
    assert_eq!(reply.error(), "Origin not allowed");
}

#[tokio::test]
async fn origin_rejection_happens_before_rate_limiting() {
    let h = HarnessBuilder::new().build();
    let headers = [("origin", "https://malicious-site.com"), ("user-agent", BROWSER)];
    post_with(&h.app, &headers, &valid_form()).await;
    assert!(h.store.is_empty().await);
}

// ── User agent ───────────────────────────────────────────────────────

#[tokio::test]
async fn tool_user_agents_are_blocked() {
    let h = HarnessBuilder::new().build();
    for agent in ["curl/7.68.0", "Wget/1.21", "python-requests/2.31", "PostmanRuntime/7.36"] {
        let headers = [("origin", ORIGIN), ("user-agent", agent)];
        let reply = post_with(&h.app, &headers, &valid_form()).await;
        assert_eq!(reply.status, StatusCode::FORBIDDEN, "{agent}");
        assert_eq!(reply.error(), "Request blocked");
        assert_eq!(reply.headers[ACCESS_CONTROL_ALLOW_ORIGIN], ORIGIN);
    }
    assert!(h.store.is_empty().await);
    assert!(h.relay.calls().is_empty());
}

#[tokio::test]
async fn missing_user_agent_is_blocked() {
    let h = HarnessBuilder::new().build();
    let reply = post_with(&h.app, &[("origin", ORIGIN)], &valid_form()).await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);
    assert_eq!(reply.error(), "Request blocked");
}

// ── Rate limiting ────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn sixth_request_in_window_is_429_and_window_expiry_resets() {
    let h = HarnessBuilder::new().build();

    for attempt in 1..=5 {
        let reply = post(&h.app, &valid_form()).await;
        assert_eq!(reply.status, StatusCode::OK, "attempt {attempt}");
    }

    let reply = post(&h.app, &valid_form()).await;
    assert_eq!(reply.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(reply.error(), "Too many requests. Please try again later.");
    assert_eq!(h.relay.calls().len(), 5);

    tokio::time::advance(WINDOW + Duration::from_secs(1)).await;

    let reply = post(&h.app, &valid_form()).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(h.relay.calls().len(), 6);
}

#[tokio::test]
async fn clients_are_limited_independently() {
    let h = HarnessBuilder::new().build();
    for _ in 0..5 {
        post(&h.app, &valid_form()).await;
    }
    assert_eq!(
        post(&h.app, &valid_form()).await.status,
        StatusCode::TOO_MANY_REQUESTS
    );

    let other = [
        ("origin", ORIGIN),
        ("user-agent", BROWSER),
        ("x-forwarded-for", "203.0.113.9, 10.0.0.1"),
    ];
    assert_eq!(
        post_with(&h.app, &other, &valid_form()).await.status,
        StatusCode::OK
    );
}

#[tokio::test]
async fn requests_without_address_share_unknown_bucket() {
    let h = HarnessBuilder::new().build();
    let headers = [("origin", ORIGIN), ("user-agent", BROWSER)];
    post_with(&h.app, &headers, &valid_form()).await;

    let entry = h.store.entry("unknown").await.unwrap();
    assert_eq!(entry.count, 1);
    assert_eq!(h.relay.calls()[0].metadata.ip, "unknown");
}

#[tokio::test]
async fn real_ip_header_is_used_without_forwarded_for() {
    let h = HarnessBuilder::new().build();
    let headers = [
        ("origin", ORIGIN),
        ("user-agent", BROWSER),
        ("x-real-ip", "198.51.100.4"),
    ];
    post_with(&h.app, &headers, &valid_form()).await;
    assert!(h.store.entry("198.51.100.4").await.is_some());
}

#[tokio::test]
async fn rate_limit_store_failure_admits_request() {
    let h = HarnessBuilder::new().store(Arc::new(FailingStore)).build();
    let reply = post(&h.app, &valid_form()).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(h.relay.calls().len(), 1);
}

// ── Body validation ──────────────────────────────────────────────────

#[tokio::test]
async fn honeypot_submission_is_400() {
    let h = HarnessBuilder::new().build();
    let reply = post(&h.app, &with(&valid_form(), "honeypot", json!("spam"))).await;

    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.error(), "Invalid submission");
    assert!(h.relay.calls().is_empty());
}

#[tokio::test]
async fn each_missing_required_field_is_400() {
    let h = HarnessBuilder::new().build();
    for key in ["firstName", "lastName", "email", "message"] {
        h.store.reset().await.unwrap();
        let reply = post(&h.app, &without(&valid_form(), key)).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST, "{key}");
        assert_eq!(reply.error(), "Missing required fields");

        let reply = post(&h.app, &with(&valid_form(), key, json!(""))).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST, "empty {key}");
    }
    assert!(h.relay.calls().is_empty());
}

#[tokio::test]
async fn empty_body_is_missing_fields() {
    let h = HarnessBuilder::new().build();
    let reply = send(&h.app, "POST", &default_headers(), String::new()).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.error(), "Missing required fields");
}

#[tokio::test]
async fn invalid_email_is_400() {
    let h = HarnessBuilder::new().build();
    let reply = post(&h.app, &with(&valid_form(), "email", json!("invalid-email"))).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.error(), "Invalid email format");
}

#[tokio::test]
async fn oversized_payload_is_413() {
    let h = HarnessBuilder::new().build();
    let reply = post(&h.app, &with(&valid_form(), "message", json!("x".repeat(15_000)))).await;
    assert_eq!(reply.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(reply.error(), "Payload too large");
    assert!(h.relay.calls().is_empty());
}

#[tokio::test]
async fn malformed_json_is_generic_500() {
    let h = HarnessBuilder::new().build();
    let reply = send(&h.app, "POST", &default_headers(), "{\"firstName\": ".to_owned()).await;

    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        reply.error(),
        "Failed to process contact form. Please try again."
    );
    assert_eq!(reply.json().as_object().unwrap().len(), 1);
    assert!(h.relay.calls().is_empty());
}

#[tokio::test]
async fn non_object_json_is_missing_fields() {
    let h = HarnessBuilder::new().build();
    for body in ["[1, 2]", "\"hello\"", "42", "null"] {
        let reply = send(&h.app, "POST", &default_headers(), body.to_owned()).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(reply.error(), "Missing required fields");
    }
    assert!(h.relay.calls().is_empty());
}

#[tokio::test]
async fn huge_body_from_unknown_origin_is_403_with_cors() {
    let h = HarnessBuilder::new().build();
    let headers = [
        ("origin", "https://malicious-site.com"),
        ("user-agent", BROWSER),
        ("content-type", "application/json"),
    ];
    let body = format!("{{\"message\":\"{}\"}}", "x".repeat(3 * 1024 * 1024));
    let reply = send(&h.app, "POST", &headers, body).await;

    assert_eq!(reply.status, StatusCode::FORBIDDEN);
    assert_eq!(reply.error(), "Origin not allowed");
    assert_eq!(reply.headers[ACCESS_CONTROL_ALLOW_ORIGIN], "");
}

#[tokio::test]
async fn huge_body_from_allowed_origin_is_json_413_with_cors() {
    let h = HarnessBuilder::new().build();
    let form = with(&valid_form(), "message", json!("x".repeat(3 * 1024 * 1024)));
    let reply = post(&h.app, &form).await;

    assert_eq!(reply.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(reply.error(), "Payload too large");
    assert_eq!(reply.headers[ACCESS_CONTROL_ALLOW_ORIGIN], ORIGIN);
    assert_eq!(reply.headers["access-control-allow-methods"], "POST, OPTIONS");
    assert!(h.relay.calls().is_empty());
}

#[tokio::test]
async fn rejection_is_idempotent() {
    let h = HarnessBuilder::new().build();
    let form = with(&valid_form(), "email", json!("nope"));

    let first = post(&h.app, &form).await;
    let second = post(&h.app, &form).await;

    assert_eq!(first.status, second.status);
    assert_eq!(first.error(), second.error());
    assert!(h.relay.calls().is_empty());
}

#[tokio::test]
async fn company_is_optional() {
    let h = HarnessBuilder::new().build();
    let reply = post(&h.app, &without(&valid_form(), "company")).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(h.relay.calls()[0].company, "");
}

// ── Relay ────────────────────────────────────────────────────────────

#[tokio::test]
async fn valid_submission_is_relayed_once() {
    let h = HarnessBuilder::new().build();
    let form = with(&valid_form(), "honeypot", json!(""));
    let reply = post(&h.app, &form).await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(
        reply.json(),
        json!({ "success": true, "message": "Contact form submitted successfully" })
    );

    let calls = h.relay.calls();
    assert_eq!(calls.len(), 1);
    let payload = &calls[0];
    assert_eq!(payload.first_name, "John");
    assert_eq!(payload.last_name, "Doe");
    assert_eq!(payload.email, "john@example.com");
    assert_eq!(payload.company, "Test Corp");
    assert_eq!(payload.timestamp, "2026-10-19T09:15:00.000Z");
    assert_eq!(payload.source, "contact_form");
    assert_eq!(payload.metadata.user_agent, BROWSER);
    assert_eq!(payload.metadata.ip, CLIENT_IP);
    assert_eq!(payload.metadata.origin, ORIGIN);

    let raw = serde_json::to_value(payload).unwrap();
    assert!(raw.get("honeypot").is_none());
}

#[tokio::test]
async fn webhook_failure_is_500_without_retry() {
    let h = HarnessBuilder::new()
        .relay(RelayBehaviour::Status(500))
        .build();
    let reply = post(&h.app, &valid_form()).await;

    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(reply.error().contains("Failed to process"));
    assert_eq!(h.relay.calls().len(), 1);
}

#[tokio::test]
async fn webhook_timeout_is_500_in_uniform_mode() {
    let h = HarnessBuilder::new().relay(RelayBehaviour::Timeout).build();
    let reply = post(&h.app, &valid_form()).await;
    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn gateway_mode_distinguishes_failure_and_timeout() {
    let h = HarnessBuilder::new()
        .relay(RelayBehaviour::Status(503))
        .gateway_errors()
        .build();
    let reply = post(&h.app, &valid_form()).await;
    assert_eq!(reply.status, StatusCode::BAD_GATEWAY);
    assert_eq!(reply.error(), "Failed to send message");

    let h = HarnessBuilder::new()
        .relay(RelayBehaviour::Timeout)
        .gateway_errors()
        .build();
    let reply = post(&h.app, &valid_form()).await;
    assert_eq!(reply.status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(reply.error(), "Request timeout");
}

#[tokio::test]
async fn missing_webhook_configuration_is_500_without_relay() {
    let h = HarnessBuilder::new().without_relay().build();
    let reply = post(&h.app, &valid_form()).await;

    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(reply.error(), "Server configuration error");
    assert!(h.relay.calls().is_empty());
}

#[tokio::test]
async fn validation_runs_before_configuration_check() {
    let h = HarnessBuilder::new().without_relay().build();
    let reply = post(&h.app, &without(&valid_form(), "email")).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
}

// ── CAPTCHA ──────────────────────────────────────────────────────────

#[tokio::test]
async fn captcha_token_is_required_when_enabled() {
    let captcha = FakeCaptcha::new(CaptchaBehaviour::Accept);
    let h = HarnessBuilder::new()
        .captcha(CaptchaGate::Enabled(captcha.clone()))
        .build();
    let reply = post(&h.app, &valid_form()).await;

    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.error(), "Captcha verification required");
    assert!(captcha.calls.lock().unwrap().is_empty());
    assert!(h.relay.calls().is_empty());
}

#[tokio::test]
async fn verified_captcha_is_relayed_without_token() {
    let captcha = FakeCaptcha::new(CaptchaBehaviour::Accept);
    let h = HarnessBuilder::new()
        .captcha(CaptchaGate::Enabled(captcha.clone()))
        .build();
    let reply = post(&h.app, &with(&valid_form(), "hcaptchaToken", json!("tok-123"))).await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(
        *captcha.calls.lock().unwrap(),
        vec![("tok-123".to_owned(), Some(CLIENT_IP.to_owned()))]
    );
    let raw = serde_json::to_string(&h.relay.calls()[0]).unwrap();
    assert!(!raw.contains("tok-123"));
}

#[tokio::test]
async fn unknown_client_is_not_sent_as_remote_ip() {
    let captcha = FakeCaptcha::new(CaptchaBehaviour::Accept);
    let h = HarnessBuilder::new()
        .captcha(CaptchaGate::Enabled(captcha.clone()))
        .build();
    let headers = [("origin", ORIGIN), ("user-agent", BROWSER)];
    post_with(&h.app, &headers, &with(&valid_form(), "captchaToken", json!("t"))).await;
    assert_eq!(captcha.calls.lock().unwrap()[0].1, None);
}

#[tokio::test]
async fn rejected_captcha_is_400() {
    let h = HarnessBuilder::new()
        .captcha(CaptchaGate::Enabled(FakeCaptcha::new(CaptchaBehaviour::Reject)))
        .build();
    let reply = post(&h.app, &with(&valid_form(), "captchaToken", json!("bad"))).await;

    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.error(), "Captcha verification failed. Please try again.");
    assert!(h.relay.calls().is_empty());
}

#[tokio::test]
async fn unreachable_captcha_provider_is_generic_500() {
    let h = HarnessBuilder::new()
        .captcha(CaptchaGate::Enabled(FakeCaptcha::new(
            CaptchaBehaviour::Unreachable,
        )))
        .build();
    let reply = post(&h.app, &with(&valid_form(), "captchaToken", json!("t"))).await;

    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        reply.error(),
        "Failed to process contact form. Please try again."
    );
}

#[tokio::test]
async fn captcha_without_secret_is_configuration_error() {
    let h = HarnessBuilder::new()
        .captcha(CaptchaGate::Misconfigured)
        .build();

    let reply = post(&h.app, &valid_form()).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.error(), "Captcha verification required");

    let reply = post(&h.app, &with(&valid_form(), "captchaToken", json!("t"))).await;
    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(reply.error(), "Server configuration error");
    assert!(h.relay.calls().is_empty());
}

// ── Health ───────────────────────────────────────────────────────────

#[tokio::test]
async fn health_is_ok() {
    let h = HarnessBuilder::new().build();
    let resp = h
        .app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["status"], "ok");
}
