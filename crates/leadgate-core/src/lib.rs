//! Core library for `leadgate`.
//!
//! Everything here is transport-agnostic: the server crate extracts headers
//! and the body from an HTTP request and feeds them through these pieces in
//! a fixed order.
//!
//! - [`origin`] — which browser origins may submit
//! - [`agent`] — user-agent denylist for scripted clients
//! - [`client`] — the key a submission is rate limited under
//! - [`submission`] — parsing and validating the submitted form
//! - [`payload`] — the normalized body relayed to the webhook
//! - [`relay`] — traits for the downstream webhook and CAPTCHA provider

pub mod agent;
pub mod client;
pub mod error;
pub mod origin;
pub mod payload;
pub mod relay;
pub mod submission;
