use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use subtle::ConstantTimeEq;
use uuid::Uuid;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// API key auth settings used by middleware.
#[derive(Clone)]
pub struct AuthState {
    api_key: Option<Arc<str>>,
}

impl std::fmt::Debug for AuthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthState")
            .field("enabled", &self.enabled())
            .finish()
    }
}

impl AuthState {
    /// Builds auth config from the configured `YTMON_API_KEY`.
    ///
    /// In development a missing key disables auth for local iteration.
    /// In other environments a missing key fails startup.
    pub fn from_config(api_key: Option<&str>, is_development: bool) -> anyhow::Result<Self> {
        match api_key.map(str::trim).filter(|k| !k.is_empty()) {
            Some(key) => Ok(Self::with_key(key)),
            None if is_development => {
                tracing::warn!("YTMON_API_KEY not set; API key auth disabled in development");
                Ok(Self::disabled())
            }
            None => anyhow::bail!("YTMON_API_KEY is required outside development"),
        }
    }

    #[must_use]
    pub fn with_key(key: &str) -> Self {
        Self {
            api_key: Some(Arc::from(key)),
        }
    }

    #[must_use]
    pub fn disabled() -> Self {
        Self { api_key: None }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.api_key.is_some()
    }

    fn allows(&self, candidate: &str) -> bool {
        self.api_key
            .as_deref()
            .is_some_and(|key| bool::from(key.as_bytes().ct_eq(candidate.as_bytes())))
    }
}

#[derive(Debug, Serialize)]
struct DetailBody {
    detail: &'static str,
}

/// Axum middleware that extracts or generates a request ID.
///
/// If the incoming request has an `x-request-id` header, that value is used.
/// Otherwise a new `UUIDv4` is generated. The ID is:
/// - Inserted into request extensions as [`RequestId`]
/// - Set on the response as the `x-request-id` header
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", val);
    }

    res
}

/// Middleware enforcing the `X-API-Key` header when auth is enabled.
pub async fn require_api_key(State(auth): State<AuthState>, req: Request, next: Next) -> Response {
    if !auth.enabled() {
        return next.run(req).await;
    }

    match extract_api_key(req.headers()) {
        Some(key) if auth.allows(key) => next.run(req).await,
        _ => (
            StatusCode::FORBIDDEN,
            Json(DetailBody {
                detail: "Could not validate credentials",
            }),
        )
            .into_response(),
    }
}

fn extract_api_key(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_api_key_reads_header() {
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, HeaderValue::from_static("k1"));
        assert_eq!(extract_api_key(&headers), Some("k1"));
    }

    #[test]
    fn extract_api_key_ignores_empty_header() {
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, HeaderValue::from_static(""));
        assert_eq!(extract_api_key(&headers), None);
    }

    #[test]
    fn auth_state_disables_without_key_in_dev() {
        let state = AuthState::from_config(None, true).expect("dev should allow missing key");
        assert!(!state.enabled());
    }

    #[test]
    fn auth_state_requires_key_outside_dev() {
        assert!(AuthState::from_config(Some("  "), false).is_err());
    }

    #[test]
    fn allows_only_exact_key() {
        let state = AuthState::with_key("secret-key");
        assert!(state.allows("secret-key"));
        assert!(!state.allows("secret-ke"));
        assert!(!state.allows("secret-key2"));
    }

    #[test]
    fn debug_does_not_leak_key() {
        let rendered = format!("{:?}", AuthState::with_key("secret-key"));
        assert!(!rendered.contains("secret-key"));
    }
}
