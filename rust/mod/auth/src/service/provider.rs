use axum::http::HeaderMap;

use todolist_core::{AuthSession, ServiceError, SessionProvider};

use crate::cookie::{read_bearer, read_cookie};
use crate::model::ClientMeta;
use crate::service::{AuthError, AuthService};

impl AuthService {
    /// The session token a request carries: the session cookie, or a
    /// Bearer header for API clients.
    pub fn request_token<'a>(&self, headers: &'a HeaderMap) -> Option<&'a str> {
        read_cookie(headers, &self.config.cookie_name).or_else(|| read_bearer(headers))
    }

    /// Revoke the session a request carries and return its id. Requests
    /// without a valid session are a no-op.
    pub fn sign_out(&self, headers: &HeaderMap) -> Result<Option<String>, AuthError> {
        let Some(token) = self.request_token(headers) else {
            return Ok(None);
        };
        match self.verify_token(token)? {
            Some(session) => {
                self.revoke_session(&session.session_id)?;
                Ok(Some(session.session_id))
            }
            None => Ok(None),
        }
    }
}

impl SessionProvider for AuthService {
    fn get_session(&self, headers: &HeaderMap) -> Result<Option<AuthSession>, ServiceError> {
        match self.request_token(headers) {
            Some(token) => self.verify_token(token).map_err(ServiceError::from),
            None => Ok(None),
        }
    }
}

impl ClientMeta {
    /// Pull user agent and client address out of request headers.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };
        ClientMeta {
            user_agent: header("user-agent").map(str::to_string),
            ip_address: header("x-forwarded-for")
                .and_then(|v| v.split(',').next())
                .map(|v| v.trim().to_string()),
        }
    }
}
