//! Startup checks.

use crate::config::ServerConfig;

/// Ten years.
pub const MAX_EXPIRE_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// Verify server configuration is ready to serve.
pub fn verify_config(config: &ServerConfig) -> anyhow::Result<()> {
    if config.session.secret.is_empty() {
        anyhow::bail!("Session secret is empty in configuration.");
    }
    if config.session.expire_secs == 0 || config.session.expire_secs > MAX_EXPIRE_SECS {
        anyhow::bail!(
            "Session expire_secs must be between 1 and {MAX_EXPIRE_SECS}, got {}.",
            config.session.expire_secs
        );
    }
    if config.storage.data_dir.is_empty() {
        anyhow::bail!("Storage data_dir is empty in configuration.");
    }
    if let Some(bad) = config.gate.protected.iter().find(|p| !p.starts_with('/')) {
        anyhow::bail!("Protected path pattern must start with '/': {bad}");
    }
    if !config.gate.login_path.starts_with('/') {
        anyhow::bail!("Gate login_path must start with '/'.");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GateConfig, SessionConfig, StorageConfig};

    fn config() -> ServerConfig {
        ServerConfig {
            storage: StorageConfig {
                data_dir: "/tmp".to_string(),
                sqlite_path: None,
            },
            session: SessionConfig {
                secret: "test".to_string(),
                ..Default::default()
            },
            gate: GateConfig::default(),
        }
    }

    #[test]
    fn test_verify_config_ok() {
        assert!(verify_config(&config()).is_ok());
    }

    #[test]
    fn test_verify_config_empty_secret() {
        let mut c = config();
        c.session.secret.clear();
        assert!(verify_config(&c).is_err());
    }

    #[test]
    fn test_verify_config_empty_data_dir() {
        let mut c = config();
        c.storage.data_dir.clear();
        assert!(verify_config(&c).is_err());
    }

    #[test]
    fn test_verify_config_relative_pattern() {
        let mut c = config();
        c.gate.protected.push("dashboard".to_string());
        let err = verify_config(&c).unwrap_err();
        assert!(err.to_string().contains("dashboard"));
    }

    #[test]
    fn test_verify_config_expire_secs_range() {
        let mut c = config();
        c.session.expire_secs = MAX_EXPIRE_SECS;
        assert!(verify_config(&c).is_ok());

        c.session.expire_secs = MAX_EXPIRE_SECS + 1;
        let err = verify_config(&c).unwrap_err();
        assert!(err.to_string().contains("expire_secs"));

        c.session.expire_secs = u64::MAX;
        assert!(verify_config(&c).is_err());

        c.session.expire_secs = 0;
        assert!(verify_config(&c).is_err());
    }

    #[test]
    fn test_max_expire_secs_issues_sessions() {
        let mut c = config();
        c.session.expire_secs = MAX_EXPIRE_SECS;
        let sql: std::sync::Arc<dyn todolist_sql::SQLStore> =
            std::sync::Arc::new(todolist_sql::SqliteStore::open_in_memory().unwrap());
        let svc = auth::service::AuthService::new(sql, c.auth_config()).unwrap();
        let user = svc
            .sign_up(auth::model::SignUp {
                name: "Alice".into(),
                email: "alice@example.com".into(),
                password: "correct horse".into(),
            })
            .unwrap();
        let issued = svc
            .issue_session(&user, auth::model::ClientMeta::default())
            .unwrap();
        assert!(svc.verify_token(&issued.token).unwrap().is_some());
    }
}
