//! Route registration: module routes, HTML pages, system endpoints.

use std::sync::Arc;

use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;

use auth::service::AuthService;
use todo::actions::TodoActions;

use crate::gate::{self, Gate};
use crate::pages;
use crate::templates::Templates;

/// Application shared state.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub todos: Arc<TodoActions>,
    pub pages: Arc<Templates>,
}

/// Build the complete router. Module routes carry absolute paths and
/// already have their state applied.
pub fn build_router(state: AppState, gate: Arc<Gate>, module_routes: Vec<(&str, Router)>) -> Router {
    let system_routes = Router::new()
        .route("/health", get(health))
        .route("/version", get(version));

    let mut app: Router<()> = pages::routes().with_state(state).merge(system_routes);

    for (name, router) in module_routes {
        tracing::debug!(module = name, "mounting module routes");
        app = app.merge(router);
    }

    app.layer(middleware::from_fn_with_state(gate, gate::gate_middleware))
}

async fn health() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "status": "ok",
    }))
}

async fn version() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "name": "todolistd",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    use super::*;
    use crate::config::GateConfig;
    use todolist_core::{Module, SessionProvider};
    use todolist_sql::{SQLStore, SqliteStore};

    fn test_app() -> Router {
        let sql: Arc<dyn SQLStore> = Arc::new(SqliteStore::open_in_memory().unwrap());
        let auth_module = auth::AuthModule::new(sql.clone(), Default::default()).unwrap();
        let provider: Arc<dyn SessionProvider> = auth_module.service().clone();
        let todo_module = todo::TodoModule::new(sql, provider.clone()).unwrap();

        let state = AppState {
            auth: auth_module.service().clone(),
            todos: todo_module.actions().clone(),
            pages: Arc::new(Templates::new().unwrap()),
        };
        let gate = Arc::new(Gate::new(&GateConfig::default(), provider));
        build_router(
            state,
            gate,
            vec![
                (auth_module.name(), auth_module.routes()),
                (todo_module.name(), todo_module.routes()),
            ],
        )
    }

    struct Reply {
        status: StatusCode,
        location: Option<String>,
        cookie: Option<String>,
        body: String,
    }

    async fn send(app: &Router, method: &str, uri: &str, form: Option<&str>, cookie: Option<&str>) -> Reply {
        let mut builder = Request::builder().method(method).uri(uri);
        if form.is_some() {
            builder = builder.header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        }
        if let Some(c) = cookie {
            builder = builder.header(header::COOKIE, c);
        }
        let body = form.map(|f| Body::from(f.to_string())).unwrap_or_else(Body::empty);
        let resp = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let header_str = |name: header::HeaderName| {
            resp.headers()
                .get(name)
                .map(|v| v.to_str().unwrap().to_string())
        };
        let location = header_str(header::LOCATION);
        // Keep only `name=value` for replaying as a Cookie header.
        let cookie = header_str(header::SET_COOKIE)
            .map(|c| c.split(';').next().unwrap().to_string());
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
        Reply {
            status,
            location,
            cookie,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    async fn sign_up(app: &Router) -> String {
        let reply = send(
            app,
            "POST",
            "/signup",
            Some("name=Alice&email=alice%40example.com&password=correct+horse"),
            None,
        )
        .await;
        assert_eq!(reply.status, StatusCode::SEE_OTHER);
        assert_eq!(reply.location.as_deref(), Some("/dashboard"));
        reply.cookie.unwrap()
    }

    #[tokio::test]
    async fn system_endpoints_are_public() {
        let app = test_app();
        let reply = send(&app, "GET", "/health", None, None).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert!(reply.body.contains("\"ok\""));

        let reply = send(&app, "GET", "/version", None, None).await;
        assert!(reply.body.contains("todolistd"));
    }

    #[tokio::test]
    async fn index_and_dashboard_redirect_when_signed_out() {
        let app = test_app();
        let reply = send(&app, "GET", "/", None, None).await;
        assert_eq!(reply.location.as_deref(), Some("/dashboard"));

        for path in ["/dashboard", "/dashboard/anything"] {
            let reply = send(&app, "GET", path, None, None).await;
            assert_eq!(reply.status, StatusCode::SEE_OTHER, "{path}");
            assert_eq!(reply.location.as_deref(), Some("/login"));
        }

        let reply = send(&app, "POST", "/dashboard/todos", Some("title=x"), None).await;
        assert_eq!(reply.location.as_deref(), Some("/login"));

        let reply = send(&app, "GET", "/login", None, None).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert!(reply.body.contains("Sign in"));
    }

    #[tokio::test]
    async fn dashboard_flow() {
        let app = test_app();
        let cookie = sign_up(&app).await;

        let reply = send(&app, "GET", "/dashboard", None, Some(&cookie)).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert!(reply.body.contains("Signed in as Alice"));
        assert!(reply.body.contains("No todos yet."));

        let reply = send(
            &app,
            "POST",
            "/dashboard/todos",
            Some("title=%3Cscript%3EBuy+milk&priority=high&dueDate=2025-06-01"),
            Some(&cookie),
        )
        .await;
        assert_eq!(reply.status, StatusCode::SEE_OTHER);

        let reply = send(&app, "GET", "/dashboard", None, Some(&cookie)).await;
        assert!(reply.body.contains("&lt;script&gt;Buy milk"));
        assert!(!reply.body.contains("<script>"));
        assert!(reply.body.contains("due 2025-06-01"));

        let reply = send(&app, "POST", "/dashboard/todos", Some("title=+&description=keep+me"), Some(&cookie)).await;
        assert_eq!(reply.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(reply.body.contains("Title is required"));
        assert!(reply.body.contains("keep me"));
    }

    #[tokio::test]
    async fn toggle_and_delete() {
        let app = test_app();
        let cookie = sign_up(&app).await;
        send(&app, "POST", "/dashboard/todos", Some("title=Buy+milk"), Some(&cookie)).await;

        let reply = send(&app, "GET", "/api/todos", None, Some(&cookie)).await;
        let json: serde_json::Value = serde_json::from_str(&reply.body).unwrap();
        let id = json["data"][0]["id"].as_str().unwrap().to_string();

        let reply = send(
            &app,
            "POST",
            &format!("/dashboard/todos/{id}/toggle"),
            Some("completed=true"),
            Some(&cookie),
        )
        .await;
        assert_eq!(reply.status, StatusCode::SEE_OTHER);

        let reply = send(&app, "GET", "/dashboard?filter=completed", None, Some(&cookie)).await;
        assert!(reply.body.contains("Buy milk"));
        let reply = send(&app, "GET", "/dashboard?filter=active", None, Some(&cookie)).await;
        assert!(!reply.body.contains("Buy milk"));

        let reply = send(&app, "POST", &format!("/dashboard/todos/{id}/delete"), None, Some(&cookie)).await;
        assert_eq!(reply.status, StatusCode::SEE_OTHER);

        let reply = send(&app, "POST", &format!("/dashboard/todos/{id}/delete"), None, Some(&cookie)).await;
        assert_eq!(reply.status, StatusCode::NOT_FOUND);
        assert!(reply.body.contains("Todo not found"));
    }

    #[tokio::test]
    async fn login_logout() {
        let app = test_app();
        sign_up(&app).await;

        let reply = send(
            &app,
            "POST",
            "/login",
            Some("email=alice%40example.com&password=wrong+horse"),
            None,
        )
        .await;
        assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
        assert!(reply.body.contains("invalid email or password"));
        assert!(reply.body.contains("alice@example.com"));

        let reply = send(
            &app,
            "POST",
            "/login",
            Some("email=alice%40example.com&password=correct+horse"),
            None,
        )
        .await;
        assert_eq!(reply.status, StatusCode::SEE_OTHER);
        let cookie = reply.cookie.unwrap();

        let reply = send(&app, "POST", "/logout", None, Some(&cookie)).await;
        assert_eq!(reply.location.as_deref(), Some("/login"));
        assert_eq!(reply.cookie.as_deref(), Some("todolist.session_token="));

        // The old cookie no longer opens anything.
        let reply = send(&app, "GET", "/dashboard", None, Some(&cookie)).await;
        assert_eq!(reply.location.as_deref(), Some("/login"));
    }

    #[tokio::test]
    async fn api_requires_session() {
        let app = test_app();
        let reply = send(&app, "GET", "/api/todos", None, None).await;
        assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
        let json: serde_json::Value = serde_json::from_str(&reply.body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"code": "UNAUTHENTICATED", "message": "Unauthorized"})
        );
    }

    #[tokio::test]
    async fn users_see_only_their_todos() {
        let app = test_app();
        let alice = sign_up(&app).await;
        send(&app, "POST", "/dashboard/todos", Some("title=Alice+secret"), Some(&alice)).await;

        let bob = send(
            &app,
            "POST",
            "/signup",
            Some("name=Bob&email=bob%40example.com&password=battery+staple"),
            None,
        )
        .await
        .cookie
        .unwrap();
        let reply = send(&app, "GET", "/dashboard", None, Some(&bob)).await;
        assert!(reply.body.contains("Signed in as Bob"));
        assert!(!reply.body.contains("Alice secret"));
    }
}
