pub mod password;
pub mod provider;
pub mod schema;
pub mod session;
pub mod user;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use todolist_sql::{Row, SQLError, SQLStore};

/// Auth service error type.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("storage: {0}")]
    Storage(String),

    #[error("internal: {0}")]
    Internal(String),
}

impl From<SQLError> for AuthError {
    fn from(e: SQLError) -> Self {
        match e {
            SQLError::Constraint(m) => AuthError::Conflict(m),
            other => AuthError::Storage(other.to_string()),
        }
    }
}

impl From<AuthError> for todolist_core::ServiceError {
    fn from(e: AuthError) -> Self {
        use todolist_core::ServiceError;
        match e {
            AuthError::NotFound(m) => ServiceError::NotFound(m),
            AuthError::Conflict(m) => ServiceError::Conflict(m),
            AuthError::Validation(m) => ServiceError::Validation(m),
            AuthError::Unauthorized(m) => ServiceError::Unauthorized(m),
            AuthError::Storage(m) => ServiceError::Storage(m),
            AuthError::Internal(m) => ServiceError::Internal(m),
        }
    }
}

/// Configuration for the auth service.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// JWT signing secret.
    pub jwt_secret: String,
    /// Session lifetime in seconds (default: 7 days).
    pub session_ttl: i64,
    /// Name of the session cookie.
    pub cookie_name: String,
    /// Mark the cookie `Secure` (HTTPS only).
    pub secure_cookie: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "todolist-dev-secret-change-me".to_string(),
            session_ttl: 604800, // 7 days
            cookie_name: "todolist.session_token".to_string(),
            secure_cookie: false,
        }
    }
}

/// The Auth service. Holds the SQL store and configuration.
pub struct AuthService {
    pub(crate) sql: Arc<dyn SQLStore>,
    pub(crate) config: AuthConfig,
    /// Checked against when the email is unknown.
    pub(crate) dummy_hash: String,
}

impl AuthService {
    /// Create a new AuthService, initializing the DB schema.
    pub fn new(sql: Arc<dyn SQLStore>, config: AuthConfig) -> Result<Arc<Self>, AuthError> {
        schema::init_schema(sql.as_ref())?;
        let dummy_hash = password::hash_password(&todolist_core::new_id())?;
        Ok(Arc::new(Self {
            sql,
            config,
            dummy_hash,
        }))
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }
}

/// Parse a stored RFC 3339 timestamp column.
pub(crate) fn row_timestamp(row: &Row, col: &str) -> Result<DateTime<Utc>, AuthError> {
    let raw = row.require_str(col)?;
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| AuthError::Internal(format!("bad timestamp in column {col}: {e}")))
}
