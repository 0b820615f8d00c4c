//! Todo module: per-user todo items.
//!
//! - [`actions::TodoActions`]: create, list, update and delete, scoped to
//!   the caller's session
//! - [`form::TodoForm`]: submission state for the "new todo" form
//! - JSON API under `/api/todos`

pub mod actions;
pub mod api;
pub mod form;
pub mod model;
pub mod store;
pub mod validation;

use std::sync::Arc;

use axum::Router;
use todolist_core::{Module, ServiceError, SessionProvider};
use todolist_sql::SQLStore;

use actions::TodoActions;
use store::TodoStore;

pub use form::TodoForm;
pub use model::{GetTodosOptions, Priority, Todo, TodoCreate, TodoFilter, TodoUpdate};

/// The Todo module.
///
/// Needs the `users` table to exist already (the `todos.user_id` foreign
/// key points at it), so build it after the auth module.
pub struct TodoModule {
    actions: Arc<TodoActions>,
}

impl TodoModule {
    pub fn new(db: Arc<dyn SQLStore>, auth: Arc<dyn SessionProvider>) -> Result<Self, ServiceError> {
        let store = TodoStore::new(db)?;
        Ok(Self {
            actions: Arc::new(TodoActions::new(store, auth)),
        })
    }

    pub fn actions(&self) -> &Arc<TodoActions> {
        &self.actions
    }
}

impl Module for TodoModule {
    fn name(&self) -> &str {
        "todo"
    }

    fn routes(&self) -> Router {
        api::router(Arc::clone(&self.actions))
    }
}
