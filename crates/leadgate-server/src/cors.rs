//! CORS response headers.
//!
//! The gatekeeper computes the allowed origin itself instead of using a CORS
//! middleware: every response, rejections included, must carry the same
//! three headers, and a disallowed origin gets an empty
//! `Access-Control-Allow-Origin` rather than no response at all.

use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
};
use axum::http::{HeaderMap, HeaderValue};

/// CORS headers for a response to a request whose origin resolved to
/// `allowed_origin` (`None` when the origin was not allowed).
pub fn cors_headers(allowed_origin: Option<&str>) -> HeaderMap {
    let origin = allowed_origin
        .and_then(|o| HeaderValue::from_str(o).ok())
        .unwrap_or_else(|| HeaderValue::from_static(""));

    let mut headers = HeaderMap::with_capacity(3);
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("POST, OPTIONS"),
    );
    headers
}
