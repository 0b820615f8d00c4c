mod session;
mod sign;

use std::sync::Arc;

use axum::Router;

use crate::service::AuthService;

/// Shared application state.
pub type AppState = Arc<AuthService>;

/// Build the auth JSON API router. Paths are absolute (`/auth/...`).
pub fn build_router(svc: Arc<AuthService>) -> Router {
    let api = Router::new()
        .merge(sign::routes())
        .merge(session::routes());

    Router::new().nest("/auth", api).with_state(svc)
}
