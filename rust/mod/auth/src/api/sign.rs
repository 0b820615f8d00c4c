use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};

use todolist_core::{ServiceError, SessionUser};

use crate::api::AppState;
use crate::cookie::{clear_cookie, session_cookie};
use crate::model::{ClientMeta, SignIn, SignUp};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sign-up", post(sign_up))
        .route("/sign-in", post(sign_in))
        .route("/sign-out", post(sign_out))
}

/// POST /auth/sign-up: create an account and sign it in.
async fn sign_up(
    State(svc): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<SignUp>,
) -> Result<Response, ServiceError> {
    let user = svc.sign_up(input)?;
    let issued = svc.issue_session(&user, ClientMeta::from_headers(&headers))?;
    let cookie = session_cookie(svc.config(), &issued.token);
    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie)],
        Json(issued.user),
    )
        .into_response())
}

/// POST /auth/sign-in: password sign-in.
async fn sign_in(
    State(svc): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<SignIn>,
) -> Result<Response, ServiceError> {
    let issued = svc.sign_in(input, ClientMeta::from_headers(&headers))?;
    let cookie = session_cookie(svc.config(), &issued.token);
    let body = serde_json::json!({
        "user": SessionUser::from(&issued.user),
        "session": issued.session,
    });
    Ok((StatusCode::OK, [(header::SET_COOKIE, cookie)], Json(body)).into_response())
}

/// POST /auth/sign-out: revoke the current session, if any.
async fn sign_out(
    State(svc): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ServiceError> {
    svc.sign_out(&headers)?;
    Ok((
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, clear_cookie(svc.config()))],
    )
        .into_response())
}
