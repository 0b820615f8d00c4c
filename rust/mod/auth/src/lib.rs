//! Auth module: password accounts and cookie sessions.
//!
//! # Resources
//!
//! - **User**: email/password account (argon2id hash)
//! - **Session**: sign-in record; the session cookie is a JWT bound to it
//!
//! [`AuthService`](service::AuthService) implements
//! [`todolist_core::SessionProvider`], which is all other modules see.
//!
//! # Usage
//!
//! ```ignore
//! use auth::{AuthModule, service::AuthConfig};
//!
//! let module = AuthModule::new(sql, AuthConfig::default())?;
//! let provider: Arc<dyn SessionProvider> = module.service().clone();
//! let router = module.routes(); // /auth/...
//! ```

pub mod api;
pub mod cookie;
pub mod model;
pub mod service;

use std::sync::Arc;

use axum::Router;

use todolist_core::Module;
use todolist_sql::SQLStore;

use crate::service::{AuthConfig, AuthService};

/// Auth module implementing the Module trait.
pub struct AuthModule {
    service: Arc<AuthService>,
}

impl AuthModule {
    /// Create a new AuthModule, initializing its tables.
    pub fn new(
        sql: Arc<dyn SQLStore>,
        config: AuthConfig,
    ) -> Result<Self, todolist_core::ServiceError> {
        let service = AuthService::new(sql, config)?;
        Ok(Self { service })
    }

    /// Get a reference to the underlying AuthService.
    pub fn service(&self) -> &Arc<AuthService> {
        &self.service
    }
}

impl Module for AuthModule {
    fn name(&self) -> &str {
        "auth"
    }

    fn routes(&self) -> Router {
        api::build_router(self.service.clone())
    }
}
