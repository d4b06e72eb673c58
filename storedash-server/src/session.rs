//! Opaque session verification.
//!
//! The dashboard consumes authentication, it does not implement it: a
//! bearer token either maps to an identity or it does not. What issues the
//! tokens (an OAuth proxy, a gateway, a test fixture) is outside this
//! crate.

use std::collections::HashMap;
use std::sync::RwLock;

use axum::extract::FromRequestParts;
use http::header::AUTHORIZATION;
use http::request::Parts;

use crate::error::ApiError;
use crate::state::AppState;

/// The authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// The user's email, the key the access directory is queried with.
    pub email: String,
}

/// Checks whether a session token is valid.
pub trait SessionVerifier: Send + Sync {
    /// Resolve a token to an identity, or `None` for an invalid session.
    fn verify(&self, token: &str) -> Option<Identity>;
}

/// An in-memory token map, for tests and development.
#[derive(Debug, Default)]
pub struct StaticSessions {
    tokens: RwLock<HashMap<String, String>>,
}

impl StaticSessions {
    /// Create an empty verifier (every request is unauthorized).
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a token for a user.
    pub fn register(&self, token: impl Into<String>, email: impl Into<String>) -> &Self {
        self.tokens
            .write()
            .expect("lock poisoned")
            .insert(token.into(), email.into());
        self
    }

    /// Parse a `token=email,token=email` list, as carried by
    /// `STOREDASH_SESSIONS`.
    pub fn from_pairs(raw: &str) -> Result<Self, String> {
        let sessions = Self::new();
        for pair in raw.split(',').filter(|p| !p.trim().is_empty()) {
            let (token, email) = pair
                .split_once('=')
                .ok_or_else(|| format!("invalid session pair {pair:?}, expected token=email"))?;
            sessions.register(token.trim(), email.trim());
        }
        Ok(sessions)
    }
}

impl SessionVerifier for StaticSessions {
    fn verify(&self, token: &str) -> Option<Identity> {
        self.tokens
            .read()
            .expect("lock poisoned")
            .get(token)
            .map(|email| Identity {
                email: email.clone(),
            })
    }
}

/// Extractor rejecting with 401 unless the request carries a valid
/// `Authorization: Bearer` token.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Identity);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(ApiError::Unauthorized)?;

        state
            .sessions
            .verify(token)
            .map(CurrentUser)
            .ok_or(ApiError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_static_sessions_verify() {
        let sessions = StaticSessions::new();
        sessions.register("token123", "owner@example.com");

        assert_eq!(
            sessions.verify("token123"),
            Some(Identity {
                email: "owner@example.com".to_string()
            })
        );
        assert_eq!(sessions.verify("other"), None);
    }

    #[test]
    fn test_from_pairs() {
        let sessions =
            StaticSessions::from_pairs("t1=a@example.com, t2=b@example.com").unwrap();
        assert_eq!(sessions.verify("t2").unwrap().email, "b@example.com");

        assert!(StaticSessions::from_pairs("not-a-pair").is_err());
        assert!(StaticSessions::from_pairs("").unwrap().verify("x").is_none());
    }
}
