//! Request gate for protected pages.
//!
//! A request whose path matches a protected pattern must carry a valid
//! session, otherwise it is redirected (303) to the login path. Errors
//! while resolving the session count as "no session".

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use todolist_core::SessionProvider;
use tracing::{debug, warn};

use crate::config::GateConfig;

#[derive(Debug, Clone, PartialEq)]
enum Pattern {
    Exact(String),
    /// `/x/*`: `/x` itself and anything below it.
    Subtree(String),
}

/// Glob-style path matcher.
#[derive(Debug, Clone)]
pub struct PathMatcher {
    patterns: Vec<Pattern>,
}

impl PathMatcher {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Self {
        let patterns = patterns
            .iter()
            .map(|p| {
                let p = p.as_ref();
                match p.strip_suffix("/*") {
                    Some(base) => Pattern::Subtree(base.to_string()),
                    None => Pattern::Exact(p.to_string()),
                }
            })
            .collect();
        Self { patterns }
    }

    pub fn matches(&self, path: &str) -> bool {
        self.patterns.iter().any(|pattern| match pattern {
            Pattern::Exact(p) => path == p,
            Pattern::Subtree(base) => {
                path == base
                    || path
                        .strip_prefix(base.as_str())
                        .is_some_and(|rest| rest.starts_with('/'))
            }
        })
    }
}

/// Gate settings plus the provider sessions are resolved through.
pub struct Gate {
    provider: Arc<dyn SessionProvider>,
    matcher: PathMatcher,
    login_path: String,
}

impl Gate {
    pub fn new(config: &GateConfig, provider: Arc<dyn SessionProvider>) -> Self {
        Self {
            provider,
            matcher: PathMatcher::new(&config.protected),
            login_path: config.login_path.clone(),
        }
    }

    /// Whether this request must be redirected to the login path.
    fn should_redirect(&self, request: &Request) -> bool {
        let path = request.uri().path();
        if path == self.login_path || !self.matcher.matches(path) {
            return false;
        }
        match self.provider.get_session(request.headers()) {
            Ok(Some(session)) => {
                debug!(path, user_id = %session.user.id, "gate: pass");
                false
            }
            Ok(None) => {
                debug!(path, "gate: no session, redirecting");
                true
            }
            Err(e) => {
                warn!(path, "gate: session lookup failed, redirecting: {e}");
                true
            }
        }
    }
}

/// Middleware entry point (`axum::middleware::from_fn_with_state`).
pub async fn gate_middleware(
    State(gate): State<Arc<Gate>>,
    request: Request,
    next: Next,
) -> Response {
    if gate.should_redirect(&request) {
        return Redirect::to(&gate.login_path).into_response();
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{header, StatusCode};
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    use super::*;
    use todolist_core::{Anonymous, FixedUser, Unavailable};

    #[test]
    fn subtree_pattern() {
        let m = PathMatcher::new(&["/dashboard/*"]);
        assert!(m.matches("/dashboard"));
        assert!(m.matches("/dashboard/"));
        assert!(m.matches("/dashboard/todos/abc"));
        assert!(!m.matches("/dashboards"));
        assert!(!m.matches("/login"));
        assert!(!m.matches("/"));
    }

    #[test]
    fn exact_pattern() {
        let m = PathMatcher::new(&["/settings"]);
        assert!(m.matches("/settings"));
        assert!(!m.matches("/settings/profile"));
    }

    fn app(provider: Arc<dyn SessionProvider>) -> Router {
        let gate = Arc::new(Gate::new(&GateConfig::default(), provider));
        Router::new()
            .route("/dashboard", get(|| async { "dashboard" }))
            .route("/dashboard/x", get(|| async { "x" }))
            .route("/login", get(|| async { "login" }))
            .route("/health", get(|| async { "ok" }))
            .layer(axum::middleware::from_fn_with_state(gate, gate_middleware))
    }

    async fn get_path(app: &Router, path: &str) -> (StatusCode, Option<String>) {
        let resp = app
            .clone()
            .oneshot(
                axum::http::Request::builder()
                    .uri(path)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let location = resp
            .headers()
            .get(header::LOCATION)
            .map(|v| v.to_str().unwrap().to_string());
        (resp.status(), location)
    }

    #[tokio::test]
    async fn anonymous_is_redirected() {
        let app = app(Arc::new(Anonymous));
        for path in ["/dashboard", "/dashboard/x"] {
            let (status, location) = get_path(&app, path).await;
            assert_eq!(status, StatusCode::SEE_OTHER, "{path}");
            assert_eq!(location.as_deref(), Some("/login"));
        }
    }

    #[tokio::test]
    async fn public_paths_pass() {
        let app = app(Arc::new(Anonymous));
        assert_eq!(get_path(&app, "/login").await.0, StatusCode::OK);
        assert_eq!(get_path(&app, "/health").await.0, StatusCode::OK);
    }

    #[tokio::test]
    async fn authenticated_passes() {
        let app = app(Arc::new(FixedUser::new("user-1")));
        assert_eq!(get_path(&app, "/dashboard").await.0, StatusCode::OK);
        assert_eq!(get_path(&app, "/dashboard/x").await.0, StatusCode::OK);
    }

    #[tokio::test]
    async fn provider_failure_fails_closed() {
        let app = app(Arc::new(Unavailable));
        let (status, location) = get_path(&app, "/dashboard").await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(location.as_deref(), Some("/login"));
    }
}
