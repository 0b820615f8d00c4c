//! Server-rendered HTML pages: sign-in, sign-up and the todo dashboard.

use axum::extract::{Form, Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use tracing::info;

use auth::cookie::{clear_cookie, session_cookie};
use auth::model::{ClientMeta, SignIn, SignUp};
use auth::service::AuthError;
use todo::{GetTodosOptions, TodoFilter, TodoForm, TodoUpdate};
use todolist_core::{ActionResult, ServiceError};

use crate::routes::AppState;

const LOGIN_PATH: &str = "/login";
const DASHBOARD_PATH: &str = "/dashboard";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/login", get(login_page).post(login_submit))
        .route("/signup", get(signup_page).post(signup_submit))
        .route("/logout", post(logout))
        .route("/dashboard", get(dashboard))
        .route("/dashboard/todos", post(create_todo))
        .route("/dashboard/todos/{id}/toggle", post(toggle_todo))
        .route("/dashboard/todos/{id}/delete", post(delete_todo))
}

/// Page handler error. No session sends the browser to sign in; anything
/// else renders as the usual error response.
pub struct PageError(ServiceError);

impl From<ServiceError> for PageError {
    fn from(e: ServiceError) -> Self {
        PageError(e)
    }
}

impl From<AuthError> for PageError {
    fn from(e: AuthError) -> Self {
        PageError(e.into())
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        if self.0.is_unauthorized() {
            return Redirect::to(LOGIN_PATH).into_response();
        }
        self.0.into_response()
    }
}

// ---------------------------------------------------------------------------
// Sign-in / sign-up
// ---------------------------------------------------------------------------

async fn index() -> Redirect {
    Redirect::to(DASHBOARD_PATH)
}

async fn login_page(State(state): State<AppState>) -> Result<Html<String>, PageError> {
    Ok(Html(state.pages.login(None, "")?))
}

async fn login_submit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(input): Form<SignIn>,
) -> Result<Response, PageError> {
    let email = input.email.clone();
    match state.auth.sign_in(input, ClientMeta::from_headers(&headers)) {
        Ok(issued) => Ok(signed_in(&state, &issued.token)),
        Err(AuthError::Unauthorized(msg)) => Ok((
            StatusCode::UNAUTHORIZED,
            Html(state.pages.login(Some(&msg), &email)?),
        )
            .into_response()),
        Err(e) => Err(e.into()),
    }
}

async fn signup_page(State(state): State<AppState>) -> Result<Html<String>, PageError> {
    Ok(Html(state.pages.signup(None, "", "")?))
}

async fn signup_submit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(input): Form<SignUp>,
) -> Result<Response, PageError> {
    let (name, email) = (input.name.clone(), input.email.clone());
    let user = match state.auth.sign_up(input) {
        Ok(user) => user,
        Err(AuthError::Validation(msg)) => {
            return Ok((
                StatusCode::BAD_REQUEST,
                Html(state.pages.signup(Some(&msg), &name, &email)?),
            )
                .into_response())
        }
        Err(AuthError::Conflict(msg)) => {
            return Ok((
                StatusCode::CONFLICT,
                Html(state.pages.signup(Some(&msg), &name, &email)?),
            )
                .into_response())
        }
        Err(e) => return Err(e.into()),
    };
    let issued = state
        .auth
        .issue_session(&user, ClientMeta::from_headers(&headers))?;
    Ok(signed_in(&state, &issued.token))
}

fn signed_in(state: &AppState, token: &str) -> Response {
    let cookie = session_cookie(state.auth.config(), token);
    ([(header::SET_COOKIE, cookie)], Redirect::to(DASHBOARD_PATH)).into_response()
}

async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, PageError> {
    if let Some(session_id) = state.auth.sign_out(&headers)? {
        info!(session_id = %session_id, "signed out");
    }
    Ok((
        [(header::SET_COOKIE, clear_cookie(state.auth.config()))],
        Redirect::to(LOGIN_PATH),
    )
        .into_response())
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
struct DashboardQuery {
    filter: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ToggleForm {
    completed: bool,
}

async fn dashboard(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<DashboardQuery>,
) -> Result<Response, PageError> {
    let filter = query
        .filter
        .as_deref()
        .and_then(TodoFilter::parse)
        .unwrap_or_default();
    let page = render_dashboard_for(&state, &headers, filter, &TodoForm::default())?;
    Ok(Html(page).into_response())
}

async fn create_todo(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(mut form): Form<TodoForm>,
) -> Result<Response, PageError> {
    let created = form.submit(|input| state.todos.create_todo(&headers, input))?;
    if created.is_some() {
        return Ok(Redirect::to(DASHBOARD_PATH).into_response());
    }
    let page = render_dashboard_for(&state, &headers, TodoFilter::All, &form)?;
    Ok((StatusCode::UNPROCESSABLE_ENTITY, Html(page)).into_response())
}

async fn toggle_todo(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Form(toggle): Form<ToggleForm>,
) -> Result<Response, PageError> {
    let patch = TodoUpdate {
        completed: Some(toggle.completed),
        ..Default::default()
    };
    let result = state.todos.update_todo(&headers, &id, patch)?;
    back_to_dashboard(&state, result)
}

async fn delete_todo(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Response, PageError> {
    let result = state.todos.delete_todo(&headers, &id)?;
    back_to_dashboard(&state, result)
}

fn back_to_dashboard<T: serde::Serialize>(
    state: &AppState,
    result: ActionResult<T>,
) -> Result<Response, PageError> {
    if result.success {
        return Ok(Redirect::to(DASHBOARD_PATH).into_response());
    }
    let status = result
        .status_code
        .and_then(|code| StatusCode::from_u16(code).ok())
        .unwrap_or(StatusCode::BAD_REQUEST);
    let message = result.error.unwrap_or_default();
    Ok((status, Html(state.pages.message(&message)?)).into_response())
}

fn render_dashboard_for(
    state: &AppState,
    headers: &HeaderMap,
    filter: TodoFilter,
    form: &TodoForm,
) -> Result<String, ServiceError> {
    let user = state.todos.current_user(headers)?;
    let result = state.todos.get_todos(headers, GetTodosOptions { filter })?;
    let todos = result.data.unwrap_or_default();
    state.pages.dashboard(&user.name, filter, &todos, form)
}
