use std::sync::Arc;

use chrono::{DateTime, Utc};

use todolist_core::{format_timestamp, ServiceError};
use todolist_sql::{Row, SQLStore, Value};

use crate::model::{Priority, Todo, TodoFilter, TodoPatch};

/// SQL schema for the todos table. `users` is owned by the auth module.
const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS todos (
    id          TEXT PRIMARY KEY,
    title       TEXT NOT NULL,
    description TEXT,
    completed   INTEGER NOT NULL DEFAULT 0,
    priority    TEXT NOT NULL DEFAULT 'medium',
    due_date    TEXT,
    user_id     TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);
CREATE INDEX IF NOT EXISTS idx_todos_user_completed ON todos(user_id, completed);
";

const COLUMNS: &str =
    "id, title, description, completed, priority, due_date, user_id, created_at, updated_at";

/// Persistent storage for todos, backed by SQLStore (SQLite).
///
/// Every statement that touches an existing row filters on both `id` and
/// `user_id`; a row owned by someone else is indistinguishable from a
/// missing one.
pub struct TodoStore {
    db: Arc<dyn SQLStore>,
}

impl TodoStore {
    /// Create a new TodoStore and initialise the schema.
    pub fn new(db: Arc<dyn SQLStore>) -> Result<Self, ServiceError> {
        db.exec_batch(SCHEMA)
            .map_err(|e| ServiceError::Storage(format!("todo schema init: {e}")))?;
        Ok(Self { db })
    }

    // -----------------------------------------------------------------------
    // CRUD
    // -----------------------------------------------------------------------

    /// Insert a new todo.
    pub fn insert(&self, todo: &Todo) -> Result<(), ServiceError> {
        self.db.exec(
            &format!("INSERT INTO todos ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"),
            &[
                Value::Text(todo.id.clone()),
                Value::Text(todo.title.clone()),
                Value::opt_text(todo.description.as_deref()),
                Value::bool(todo.completed),
                Value::Text(todo.priority.as_str().to_string()),
                opt_timestamp(todo.due_date.as_ref()),
                Value::Text(todo.user_id.clone()),
                Value::Text(format_timestamp(&todo.created_at)),
                Value::Text(format_timestamp(&todo.updated_at)),
            ],
        )?;
        Ok(())
    }

    /// Get one of `user_id`'s todos.
    pub fn get(&self, user_id: &str, id: &str) -> Result<Option<Todo>, ServiceError> {
        let rows = self.db.query(
            &format!("SELECT {COLUMNS} FROM todos WHERE id = ?1 AND user_id = ?2"),
            &[Value::Text(id.to_string()), Value::Text(user_id.to_string())],
        )?;
        rows.first().map(row_to_todo).transpose()
    }

    /// Apply a patch in a single statement and return the updated row.
    /// `updated_at` is always bumped, even for an empty patch.
    pub fn update(
        &self,
        user_id: &str,
        id: &str,
        patch: &TodoPatch,
        now: &DateTime<Utc>,
    ) -> Result<Option<Todo>, ServiceError> {
        let mut sets: Vec<String> = Vec::new();
        let mut params: Vec<Value> = Vec::new();

        let mut set = |column: &str, value: Value| {
            params.push(value);
            sets.push(format!("{column} = ?{}", params.len()));
        };
        if let Some(title) = &patch.title {
            set("title", Value::Text(title.clone()));
        }
        if let Some(description) = &patch.description {
            set("description", Value::opt_text(description.as_deref()));
        }
        if let Some(completed) = patch.completed {
            set("completed", Value::bool(completed));
        }
        if let Some(priority) = patch.priority {
            set("priority", Value::Text(priority.as_str().to_string()));
        }
        if let Some(due_date) = &patch.due_date {
            set("due_date", opt_timestamp(due_date.as_ref()));
        }
        set("updated_at", Value::Text(format_timestamp(now)));

        params.push(Value::Text(id.to_string()));
        let id_idx = params.len();
        params.push(Value::Text(user_id.to_string()));
        let user_idx = params.len();

        let sql = format!(
            "UPDATE todos SET {} WHERE id = ?{id_idx} AND user_id = ?{user_idx} RETURNING {COLUMNS}",
            sets.join(", ")
        );
        let rows = self.db.query(&sql, &params)?;
        rows.first().map(row_to_todo).transpose()
    }

    /// Delete one of `user_id`'s todos. Returns whether a row was removed.
    pub fn delete(&self, user_id: &str, id: &str) -> Result<bool, ServiceError> {
        let affected = self.db.exec(
            "DELETE FROM todos WHERE id = ?1 AND user_id = ?2",
            &[Value::Text(id.to_string()), Value::Text(user_id.to_string())],
        )?;
        Ok(affected > 0)
    }

    // -----------------------------------------------------------------------
    // List
    // -----------------------------------------------------------------------

    /// List `user_id`'s todos, newest first.
    pub fn list(&self, user_id: &str, filter: TodoFilter) -> Result<Vec<Todo>, ServiceError> {
        let mut sql = format!("SELECT {COLUMNS} FROM todos WHERE user_id = ?1");
        let mut params = vec![Value::Text(user_id.to_string())];
        if let Some(completed) = filter.completed() {
            sql.push_str(" AND completed = ?2");
            params.push(Value::bool(completed));
        }
        // rowid breaks ties between rows created in the same millisecond.
        sql.push_str(" ORDER BY created_at DESC, rowid DESC");

        let rows = self.db.query(&sql, &params)?;
        rows.iter().map(row_to_todo).collect()
    }
}

fn opt_timestamp(ts: Option<&DateTime<Utc>>) -> Value {
    match ts {
        Some(ts) => Value::Text(format_timestamp(ts)),
        None => Value::Null,
    }
}

fn parse_timestamp(column: &str, raw: &str) -> Result<DateTime<Utc>, ServiceError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| ServiceError::Storage(format!("bad timestamp in todos.{column}: {e}")))
}

fn row_to_todo(row: &Row) -> Result<Todo, ServiceError> {
    let text = |column: &str| -> Result<String, ServiceError> {
        Ok(row.require_str(column)?.to_string())
    };
    let priority = row.require_str("priority")?;
    let priority = Priority::parse(priority)
        .ok_or_else(|| ServiceError::Storage(format!("bad priority in todos: {priority}")))?;
    let due_date = row
        .get_str("due_date")
        .map(|raw| parse_timestamp("due_date", raw))
        .transpose()?;

    Ok(Todo {
        id: text("id")?,
        title: text("title")?,
        description: row.get_str("description").map(str::to_string),
        completed: row.get_bool("completed").unwrap_or(false),
        priority,
        due_date,
        user_id: text("user_id")?,
        created_at: parse_timestamp("created_at", row.require_str("created_at")?)?,
        updated_at: parse_timestamp("updated_at", row.require_str("updated_at")?)?,
    })
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use todolist_sql::{SQLStore, SqliteStore};

    /// In-memory database with a bare `users` table holding `user-1` and
    /// `user-2`, enough to satisfy the todos foreign key.
    pub fn test_db() -> Arc<dyn SQLStore> {
        let db = SqliteStore::open_in_memory().unwrap();
        db.exec_batch(
            "CREATE TABLE users (id TEXT PRIMARY KEY);
             INSERT INTO users (id) VALUES ('user-1'), ('user-2');",
        )
        .unwrap();
        Arc::new(db)
    }
}
