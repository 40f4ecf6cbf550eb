//! Session gate for protected routes
//!
//! Callers authenticate with `Authorization: Bearer <token>`. Tokens are
//! resolved by a [`SessionStore`]; the shipped store checks them against the
//! API keys declared in configuration.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::HashMap;

use super::api::ApiError;
use super::config::ApiKeyConfig;
use super::server::AppState;

/// An authenticated caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub name: String,
}

/// Resolves session tokens to principals
pub trait SessionStore: Send + Sync {
    fn authenticate(&self, token: &str) -> Option<Principal>;
}

/// Session store backed by a fixed set of API keys
#[derive(Debug, Default, Clone)]
pub struct StaticKeyStore {
    keys: HashMap<String, String>,
}

impl StaticKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(keys: &[ApiKeyConfig]) -> Self {
        Self {
            keys: keys
                .iter()
                .map(|k| (k.key.clone(), k.name.clone()))
                .collect(),
        }
    }

    pub fn with_key(mut self, name: impl Into<String>, key: impl Into<String>) -> Self {
        self.keys.insert(key.into(), name.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl SessionStore for StaticKeyStore {
    fn authenticate(&self, token: &str) -> Option<Principal> {
        self.keys.get(token).map(|name| Principal { name: name.clone() })
    }
}

/// Bearer token from the `Authorization` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    Some(token.trim()).filter(|t| !t.is_empty())
}

/// Reject requests without a valid session; otherwise attach the [`Principal`]
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let principal =
        bearer_token(request.headers()).and_then(|token| state.sessions.authenticate(token));

    match principal {
        Some(principal) => {
            tracing::debug!(
                principal = %principal.name,
                path = %request.uri().path(),
                "Session accepted"
            );
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
        None => {
            tracing::debug!(
                path = %request.uri().path(),
                "Rejected request without a valid session"
            );
            ApiError::new(StatusCode::UNAUTHORIZED, "Authentication required").into_response()
        }
    }
}
