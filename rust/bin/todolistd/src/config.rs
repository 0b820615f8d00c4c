//! Server-side configuration file.
//!
//! ```toml
//! [storage]
//! data_dir = "/var/lib/todolist"
//! # sqlite_path = "/var/lib/todolist/todos.sqlite"
//!
//! [session]
//! secret = "..."
//! expire_secs = 604800
//!
//! [gate]
//! protected = ["/dashboard/*"]
//! login_path = "/login"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Directory holding named server configs.
const CONFIG_DIR: &str = "/etc/todolist";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub storage: StorageConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub gate: GateConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: String,
    /// Defaults to `{data_dir}/data.sqlite`.
    #[serde(default)]
    pub sqlite_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// HMAC secret for session tokens. Required.
    pub secret: String,
    pub expire_secs: u64,
    pub cookie_name: String,
    /// Only send the cookie over HTTPS.
    pub secure: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            expire_secs: 604800,
            cookie_name: "todolist.session_token".to_string(),
            secure: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Path patterns that need a session. `/x/*` covers `/x` and
    /// everything below it; anything else matches exactly.
    pub protected: Vec<String>,
    pub login_path: String,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            protected: vec!["/dashboard/*".to_string()],
            login_path: "/login".to_string(),
        }
    }
}

impl ServerConfig {
    /// Resolve a context name or path to a config file.
    ///
    /// A value containing `/` or `.` is used as-is; a bare name maps to
    /// `/etc/todolist/<name>.toml`.
    pub fn resolve_path(name_or_path: &str) -> PathBuf {
        if name_or_path.contains('/') || name_or_path.contains('.') {
            PathBuf::from(name_or_path)
        } else {
            Path::new(CONFIG_DIR).join(format!("{name_or_path}.toml"))
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read {}: {}", path.display(), e))?;
        let config: ServerConfig = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("failed to parse {}: {}", path.display(), e))?;
        Ok(config)
    }

    /// Storage paths for the shared SQL store.
    pub fn service_config(&self) -> todolist_core::ServiceConfig {
        todolist_core::ServiceConfig {
            data_dir: Some(PathBuf::from(&self.storage.data_dir)),
            sqlite_path: self.storage.sqlite_path.as_ref().map(PathBuf::from),
        }
    }

    /// Settings for the auth module.
    pub fn auth_config(&self) -> auth::service::AuthConfig {
        auth::service::AuthConfig {
            jwt_secret: self.session.secret.clone(),
            // `verify_config` bounds this well below i64::MAX.
            session_ttl: i64::try_from(self.session.expire_secs).unwrap_or(i64::MAX),
            cookie_name: self.session.cookie_name.clone(),
            secure_cookie: self.session.secure,
        }
    }
}
