//! Page templates. The markup lives in `src/web/*.html` and is compiled
//! into the binary; tera autoescapes everything interpolated into it.

use serde::Serialize;
use tera::{Context, Tera};

use todo::{Priority, Todo, TodoFilter, TodoForm};
use todolist_core::ServiceError;

const TEMPLATES: [(&str, &str); 5] = [
    ("base.html", include_str!("web/base.html")),
    ("login.html", include_str!("web/login.html")),
    ("signup.html", include_str!("web/signup.html")),
    ("message.html", include_str!("web/message.html")),
    ("dashboard.html", include_str!("web/dashboard.html")),
];

pub struct Templates {
    tera: Tera,
}

#[derive(Serialize)]
struct AuthView<'a> {
    error: Option<&'a str>,
    name: &'a str,
    email: &'a str,
}

#[derive(Serialize)]
struct MessageView<'a> {
    message: &'a str,
}

#[derive(Serialize)]
struct DashboardView<'a> {
    user_name: &'a str,
    filters: Vec<FilterLink>,
    priorities: Vec<&'static str>,
    form: FormView<'a>,
    todos: Vec<TodoView<'a>>,
}

#[derive(Serialize)]
struct FilterLink {
    name: &'static str,
    current: bool,
}

#[derive(Serialize)]
struct FormView<'a> {
    title: &'a str,
    description: &'a str,
    priority: &'a str,
    due_date: &'a str,
    error: Option<&'a str>,
    pending: bool,
}

#[derive(Serialize)]
struct TodoView<'a> {
    id: &'a str,
    title: &'a str,
    description: Option<&'a str>,
    completed: bool,
    toggle_to: bool,
    priority: &'static str,
    due_iso: Option<String>,
    due_day: Option<String>,
}

impl<'a> From<&'a Todo> for TodoView<'a> {
    fn from(todo: &'a Todo) -> Self {
        Self {
            id: &todo.id,
            title: &todo.title,
            description: todo.description.as_deref(),
            completed: todo.completed,
            toggle_to: !todo.completed,
            priority: todo.priority.as_str(),
            due_iso: todo.due_date.map(|d| d.to_rfc3339()),
            due_day: todo.due_date.map(|d| d.format("%Y-%m-%d").to_string()),
        }
    }
}

impl Templates {
    pub fn new() -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        tera.add_raw_templates(TEMPLATES.to_vec())?;
        Ok(Self { tera })
    }

    fn render<T: Serialize>(&self, name: &str, view: &T) -> Result<String, ServiceError> {
        let context = Context::from_serialize(view)
            .map_err(|e| ServiceError::Internal(format!("template context for {name}: {e}")))?;
        self.tera
            .render(name, &context)
            .map_err(|e| ServiceError::Internal(format!("render {name}: {e}")))
    }

    pub fn login(&self, error: Option<&str>, email: &str) -> Result<String, ServiceError> {
        self.render("login.html", &AuthView { error, name: "", email })
    }

    pub fn signup(&self, error: Option<&str>, name: &str, email: &str) -> Result<String, ServiceError> {
        self.render("signup.html", &AuthView { error, name, email })
    }

    pub fn message(&self, message: &str) -> Result<String, ServiceError> {
        self.render("message.html", &MessageView { message })
    }

    pub fn dashboard(
        &self,
        user_name: &str,
        filter: TodoFilter,
        todos: &[Todo],
        form: &TodoForm,
    ) -> Result<String, ServiceError> {
        let view = DashboardView {
            user_name,
            filters: TodoFilter::ALL
                .iter()
                .map(|f| FilterLink {
                    name: f.as_str(),
                    current: *f == filter,
                })
                .collect(),
            priorities: Priority::ALL.iter().map(|p| p.as_str()).collect(),
            form: FormView {
                title: &form.title,
                description: &form.description,
                priority: &form.priority,
                due_date: &form.due_date,
                error: form.error(),
                pending: form.is_pending(),
            },
            todos: todos.iter().map(TodoView::from).collect(),
        };
        self.render("dashboard.html", &view)
    }
}
