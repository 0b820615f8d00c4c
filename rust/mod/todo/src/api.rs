use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use todolist_core::{ActionResult, ServiceError};

use crate::actions::TodoActions;
use crate::model::{GetTodosOptions, TodoCreate, TodoFilter, TodoUpdate};
use crate::validation::{BODY_INVALID, FILTER_INVALID};

type ActionsState = Arc<TodoActions>;

/// JSON API over [`TodoActions`]. The body is always the `ActionResult`;
/// a failed result's `statusCode` becomes the HTTP status.
pub fn router(actions: Arc<TodoActions>) -> Router {
    Router::new()
        .route("/api/todos", get(list_todos).post(create_todo))
        .route("/api/todos/{id}", patch(update_todo).delete(delete_todo))
        .with_state(actions)
}

fn respond<T: Serialize>(result: ActionResult<T>, ok: StatusCode) -> Response {
    let status = match (result.success, result.status_code) {
        (true, _) => ok,
        (false, Some(code)) => StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST),
        (false, None) => StatusCode::BAD_REQUEST,
    };
    (status, Json(result)).into_response()
}

/// Unwrap a JSON body. The caller's session is checked first, so an
/// anonymous request is `Unauthorized` whatever it sent; a body that
/// doesn't parse becomes a 400 result.
fn parse_body<T>(
    actions: &TodoActions,
    headers: &HeaderMap,
    body: Result<Json<T>, JsonRejection>,
) -> Result<Result<T, Response>, ServiceError> {
    actions.current_user(headers)?;
    match body {
        Ok(Json(input)) => Ok(Ok(input)),
        Err(rejection) => {
            tracing::debug!("rejected todo body: {}", rejection.body_text());
            Ok(Err(respond(
                ActionResult::<()>::invalid(BODY_INVALID),
                StatusCode::OK,
            )))
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ListQuery {
    filter: Option<String>,
}

// ---------------------------------------------------------------------------
// GET /api/todos
// ---------------------------------------------------------------------------

async fn list_todos(
    State(actions): State<ActionsState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<Response, ServiceError> {
    let filter = match query.filter.as_deref() {
        None | Some("") => TodoFilter::All,
        Some(raw) => match TodoFilter::parse(raw) {
            Some(filter) => filter,
            None => {
                actions.current_user(&headers)?;
                return Ok(respond(
                    ActionResult::<()>::invalid(FILTER_INVALID),
                    StatusCode::OK,
                ));
            }
        },
    };
    let result = actions.get_todos(&headers, GetTodosOptions { filter })?;
    Ok(respond(result, StatusCode::OK))
}

// ---------------------------------------------------------------------------
// POST /api/todos
// ---------------------------------------------------------------------------

async fn create_todo(
    State(actions): State<ActionsState>,
    headers: HeaderMap,
    body: Result<Json<TodoCreate>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let input = match parse_body(&actions, &headers, body)? {
        Ok(input) => input,
        Err(rejected) => return Ok(rejected),
    };
    let result = actions.create_todo(&headers, input)?;
    Ok(respond(result, StatusCode::CREATED))
}

// ---------------------------------------------------------------------------
// PATCH /api/todos/{id}
// ---------------------------------------------------------------------------

async fn update_todo(
    State(actions): State<ActionsState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Result<Json<TodoUpdate>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let input = match parse_body(&actions, &headers, body)? {
        Ok(input) => input,
        Err(rejected) => return Ok(rejected),
    };
    let result = actions.update_todo(&headers, &id, input)?;
    Ok(respond(result, StatusCode::OK))
}

// ---------------------------------------------------------------------------
// DELETE /api/todos/{id}
// ---------------------------------------------------------------------------

async fn delete_todo(
    State(actions): State<ActionsState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Response, ServiceError> {
    let result = actions.delete_todo(&headers, &id)?;
    Ok(respond(result, StatusCode::OK))
}
