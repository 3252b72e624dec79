//! Client identification for rate limiting.

/// Bucket shared by every request that carries no client address.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Derive the rate-limit key for a request.
///
/// Uses the first entry of `X-Forwarded-For`, falling back to `X-Real-IP`,
/// and finally to [`UNKNOWN_CLIENT`]. Values are trimmed; empty values are
/// treated as absent.
pub fn client_key(forwarded_for: Option<&str>, real_ip: Option<&str>) -> String {
    forwarded_for
        .and_then(|xff| xff.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .or_else(|| real_ip.map(str::trim).filter(|ip| !ip.is_empty()))
        .unwrap_or(UNKNOWN_CLIENT)
        .to_owned()
}
