//! State for the "new todo" form.
//!
//! A submission runs in two phases. [`TodoForm::begin_submit`] validates
//! the typed values and marks the form pending; [`TodoForm::finish_submit`]
//! takes the action's result. While pending, further submissions are
//! ignored.

use serde::Deserialize;

use todolist_core::{ActionResult, ServiceError};

use crate::model::{Priority, Todo, TodoCreate};
use crate::validation::validate_create;

const SUBMIT_FAILED: &str = "Failed to create todo";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TodoForm {
    pub title: String,
    pub description: String,
    pub priority: String,
    pub due_date: String,
    #[serde(skip)]
    pending: bool,
    #[serde(skip)]
    error: Option<String>,
}

impl Default for TodoForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            priority: Priority::default().as_str().to_string(),
            due_date: String::new(),
            pending: false,
            error: None,
        }
    }
}

impl TodoForm {
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Message to show next to the form, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Start a submission. Returns the input to send, or `None` when a
    /// submission is already in flight or the values don't validate (the
    /// error is then set and nothing should be sent).
    pub fn begin_submit(&mut self) -> Option<TodoCreate> {
        if self.pending {
            return None;
        }
        let input = self.to_input();
        if let Err(msg) = validate_create(input.clone()) {
            self.error = Some(msg.to_string());
            return None;
        }
        self.error = None;
        self.pending = true;
        Some(input)
    }

    /// Apply the outcome of a submission. On success the fields reset and
    /// the created todo is returned; on failure the typed values stay.
    pub fn finish_submit(&mut self, result: ActionResult<Todo>) -> Option<Todo> {
        self.pending = false;
        match result {
            ActionResult {
                success: true,
                data: Some(todo),
                ..
            } => {
                *self = Self::default();
                Some(todo)
            }
            ActionResult { error, .. } => {
                self.error = Some(error.unwrap_or_else(|| SUBMIT_FAILED.to_string()));
                None
            }
        }
    }

    /// Run a full submission through `create`. An `Err` from `create`
    /// (no session, storage down) clears the pending flag and is returned
    /// unchanged.
    pub fn submit<F>(&mut self, create: F) -> Result<Option<Todo>, ServiceError>
    where
        F: FnOnce(TodoCreate) -> Result<ActionResult<Todo>, ServiceError>,
    {
        let Some(input) = self.begin_submit() else {
            return Ok(None);
        };
        match create(input) {
            Ok(result) => Ok(self.finish_submit(result)),
            Err(e) => {
                self.pending = false;
                Err(e)
            }
        }
    }

    fn to_input(&self) -> TodoCreate {
        let optional = |s: &str| {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        };
        TodoCreate {
            title: self.title.clone(),
            description: optional(&self.description),
            priority: optional(&self.priority),
            due_date: optional(&self.due_date),
        }
    }
}
