//! Session resolution trait.
//!
//! Modules that need the current user (the todo action layer, the request
//! gate) only know this trait. The concrete implementation lives in the
//! auth module and is injected at startup.

use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ServiceError;

/// The identity carried by a valid session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    pub name: String,
    pub email: String,
}

/// A resolved, server-verified session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub session_id: String,
    pub user: SessionUser,
    pub expires_at: DateTime<Utc>,
}

/// Pluggable session resolver.
///
/// Identity is resolved from the request headers on every call; no
/// implementation may cache a "current user" across requests.
pub trait SessionProvider: Send + Sync + 'static {
    /// Resolve the session carried by `headers`.
    ///
    /// - `Ok(None)`: no credentials, or credentials that are malformed,
    ///   expired or revoked.
    /// - `Err(_)`: the provider itself failed (e.g. the session store is
    ///   unreachable).
    fn get_session(&self, headers: &HeaderMap) -> Result<Option<AuthSession>, ServiceError>;

    /// Resolve the current user or fail with [`ServiceError::Unauthorized`].
    fn require_authenticated_user(&self, headers: &HeaderMap) -> Result<SessionUser, ServiceError> {
        match self.get_session(headers)? {
            Some(session) => Ok(session.user),
            None => Err(ServiceError::Unauthorized("Unauthorized".into())),
        }
    }
}

/// A provider that never finds a session. Used for testing.
pub struct Anonymous;

impl SessionProvider for Anonymous {
    fn get_session(&self, _headers: &HeaderMap) -> Result<Option<AuthSession>, ServiceError> {
        Ok(None)
    }
}

/// A provider that always resolves to the same user. Used for testing.
pub struct FixedUser(pub SessionUser);

impl FixedUser {
    pub fn new(id: &str) -> Self {
        Self(SessionUser {
            id: id.to_string(),
            name: format!("User {id}"),
            email: format!("{id}@example.com"),
        })
    }
}

impl SessionProvider for FixedUser {
    fn get_session(&self, _headers: &HeaderMap) -> Result<Option<AuthSession>, ServiceError> {
        Ok(Some(AuthSession {
            session_id: format!("session-{}", self.0.id),
            user: self.0.clone(),
            expires_at: Utc::now() + chrono::Duration::hours(1),
        }))
    }
}

/// A provider whose backend is down. Used for testing.
pub struct Unavailable;

impl SessionProvider for Unavailable {
    fn get_session(&self, _headers: &HeaderMap) -> Result<Option<AuthSession>, ServiceError> {
        Err(ServiceError::Storage("session store unavailable".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_requirement_is_unauthorized() {
        let err = Anonymous
            .require_authenticated_user(&HeaderMap::new())
            .unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(err.to_string(), "Unauthorized");
    }

    #[test]
    fn fixed_user_resolves() {
        let user = FixedUser::new("u1")
            .require_authenticated_user(&HeaderMap::new())
            .unwrap();
        assert_eq!(user.id, "u1");
        assert_eq!(user.email, "u1@example.com");
    }

    #[test]
    fn provider_fault_is_not_unauthorized() {
        let err = Unavailable
            .require_authenticated_user(&HeaderMap::new())
            .unwrap_err();
        assert!(matches!(err, ServiceError::Storage(_)));
    }
}
