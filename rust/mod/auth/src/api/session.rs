use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::get;
use axum::{Json, Router};

use todolist_core::{AuthSession, ServiceError, SessionProvider};

use crate::api::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/session", get(current_session))
}

/// GET /auth/session: the current session, or `null`.
async fn current_session(
    State(svc): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Option<AuthSession>>, ServiceError> {
    Ok(Json(svc.get_session(&headers)?))
}
