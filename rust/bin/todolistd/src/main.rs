//! `todolistd`: the todo list server binary.
//!
//! Usage:
//!   todolistd -c <context-name-or-path> [--listen <addr>]
//!
//! The context name resolves to `/etc/todolist/<name>.toml`.
//! If a path with `/` or `.` is given, it's used directly.

mod bootstrap;
mod config;
mod gate;
mod pages;
mod routes;
mod templates;

use std::sync::Arc;

use clap::Parser;
use todolist_core::{Module, SessionProvider};
use tracing::info;

use config::ServerConfig;
use gate::Gate;
use routes::AppState;
use templates::Templates;

/// Todo list server.
#[derive(Parser, Debug)]
#[command(name = "todolistd", about = "Todo list server")]
struct Cli {
    /// Context name or path to config file.
    #[arg(short = 'c', long = "config", required = true)]
    config: String,

    /// Listen address (overrides default 0.0.0.0:8080).
    #[arg(long = "listen", default_value = "0.0.0.0:8080")]
    listen: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    // Load server configuration.
    let config_path = ServerConfig::resolve_path(&cli.config);
    info!("Loading configuration from {}", config_path.display());
    let server_config = ServerConfig::load(&config_path)?;
    bootstrap::verify_config(&server_config)?;

    // Initialize storage.
    let data_dir = std::path::PathBuf::from(&server_config.storage.data_dir);
    std::fs::create_dir_all(&data_dir)?;

    let core_config = server_config.service_config();
    let sql: Arc<dyn todolist_sql::SQLStore> = Arc::new(
        todolist_sql::SqliteStore::open(&core_config.resolve_sqlite_path())
            .map_err(|e| anyhow::anyhow!("failed to open SQL store: {}", e))?,
    );

    // Auth first: todos reference its users table.
    let auth_module = auth::AuthModule::new(Arc::clone(&sql), server_config.auth_config())?;
    info!("Auth module initialized");

    let provider: Arc<dyn SessionProvider> = auth_module.service().clone();
    let todo_module = todo::TodoModule::new(Arc::clone(&sql), Arc::clone(&provider))?;
    info!("Todo module initialized");

    let module_routes = vec![
        (auth_module.name(), auth_module.routes()),
        (todo_module.name(), todo_module.routes()),
    ];

    let app_state = AppState {
        auth: auth_module.service().clone(),
        todos: todo_module.actions().clone(),
        pages: Arc::new(Templates::new()?),
    };
    let gate = Arc::new(Gate::new(&server_config.gate, provider));
    info!(protected = ?server_config.gate.protected, "Request gate configured");

    let app = routes::build_router(app_state, gate, module_routes);

    // Start server.
    let listener = tokio::net::TcpListener::bind(&cli.listen).await?;
    info!("Todo list server listening on {}", cli.listen);
    axum::serve(listener, app).await?;

    Ok(())
}
