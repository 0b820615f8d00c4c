use std::sync::Arc;

use axum::http::HeaderMap;
use tracing::{debug, info};

use todolist_core::{new_id, now_utc, ActionResult, ServiceError, SessionProvider, SessionUser};

use crate::model::{GetTodosOptions, Todo, TodoCreate, TodoUpdate};
use crate::store::TodoStore;
use crate::validation::{validate_create, validate_update};

pub const TODO_NOT_FOUND: &str = "Todo not found";

/// Per-user todo CRUD.
///
/// Each action resolves the caller from the request first. No session is
/// `Err(ServiceError::Unauthorized)`; everything after that (bad input,
/// unknown or foreign id) comes back as a failed [`ActionResult`].
pub struct TodoActions {
    store: TodoStore,
    auth: Arc<dyn SessionProvider>,
}

impl TodoActions {
    pub fn new(store: TodoStore, auth: Arc<dyn SessionProvider>) -> Self {
        Self { store, auth }
    }

    /// The user making this request, or `Unauthorized`.
    pub fn current_user(&self, headers: &HeaderMap) -> Result<SessionUser, ServiceError> {
        self.auth.require_authenticated_user(headers)
    }

    pub fn create_todo(
        &self,
        headers: &HeaderMap,
        input: TodoCreate,
    ) -> Result<ActionResult<Todo>, ServiceError> {
        let user = self.current_user(headers)?;
        let draft = match validate_create(input) {
            Ok(draft) => draft,
            Err(msg) => return Ok(ActionResult::invalid(msg)),
        };

        let now = now_utc();
        let todo = Todo {
            id: new_id(),
            title: draft.title,
            description: draft.description,
            completed: false,
            priority: draft.priority,
            due_date: draft.due_date,
            user_id: user.id,
            created_at: now,
            updated_at: now,
        };
        self.store.insert(&todo)?;

        info!(todo_id = %todo.id, user_id = %todo.user_id, "todo created");
        Ok(ActionResult::ok(todo))
    }

    pub fn get_todos(
        &self,
        headers: &HeaderMap,
        options: GetTodosOptions,
    ) -> Result<ActionResult<Vec<Todo>>, ServiceError> {
        let user = self.current_user(headers)?;
        let todos = self.store.list(&user.id, options.filter)?;
        debug!(user_id = %user.id, filter = options.filter.as_str(), count = todos.len(), "listed todos");
        Ok(ActionResult::ok(todos))
    }

    pub fn update_todo(
        &self,
        headers: &HeaderMap,
        id: &str,
        input: TodoUpdate,
    ) -> Result<ActionResult<Todo>, ServiceError> {
        let user = self.current_user(headers)?;
        let patch = match validate_update(input) {
            Ok(patch) => patch,
            Err(msg) => return Ok(ActionResult::invalid(msg)),
        };

        match self.store.update(&user.id, id, &patch, &now_utc())? {
            Some(todo) => {
                debug!(todo_id = %todo.id, "todo updated");
                Ok(ActionResult::ok(todo))
            }
            None => Ok(ActionResult::not_found(TODO_NOT_FOUND)),
        }
    }

    pub fn delete_todo(
        &self,
        headers: &HeaderMap,
        id: &str,
    ) -> Result<ActionResult<()>, ServiceError> {
        let user = self.current_user(headers)?;
        if !self.store.delete(&user.id, id)? {
            return Ok(ActionResult::not_found(TODO_NOT_FOUND));
        }
        info!(todo_id = %id, user_id = %user.id, "todo deleted");
        Ok(ActionResult::done())
    }
}
