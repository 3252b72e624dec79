//! `leadgate` HTTP server.
//!
//! Wires the core gatekeeping checks, the rate-limit store and the webhook
//! relay into an Axum service exposing the contact endpoint at
//! `/api/contact` and a liveness probe at `/health`.

pub mod captcha;
pub mod config;
pub mod cors;
pub mod error;
pub mod relay;
pub mod routes;
pub mod state;
