//! MediBook - doctor directory and appointment booking API

use anyhow::{Context, Result};
use clap::Parser;
use medibook_api::{AppState, create_router};
use medibook_auth::{PasswordService, TokenService};
use medibook_db::Database;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod bootstrap;
mod config;

use config::{Config, LogFormat, LoggingConfig};

/// MediBook - doctor directory and appointment booking API
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/medibook.toml")]
    config: String,

    /// Bind address
    #[arg(long, env = "MEDIBOOK_BIND")]
    bind: Option<String>,

    /// Port
    #[arg(short, long, env = "MEDIBOOK_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load(&args.config)?;

    init_logging(&config.logging);

    info!("Starting MediBook v{}", env!("CARGO_PKG_VERSION"));

    ensure_database_dir(&config.database.url).await?;
    let db = Database::new(&config.database.url).await?;

    let tokens = Arc::new(TokenService::new(
        &config.auth.jwt_secret,
        config.auth.token_ttl(),
    )?);
    let passwords = PasswordService::new(config.auth.password_policy());
    passwords
        .warm_up()
        .await
        .context("Failed to initialize password hashing")?;

    bootstrap::ensure_admin(&db, &passwords, config.auth.bootstrap_admin.as_ref()).await?;

    let metrics_handle = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install metrics recorder")?;

    let state = AppState::new(db, tokens, passwords);

    let app = create_router(state, Some(Arc::new(metrics_handle)))
        .layer(TraceLayer::new_for_http());

    let bind_addr = args.bind.unwrap_or(config.server.bind_address);
    let port = args.port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{}:{}", bind_addr, port).parse()?;

    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Initialize logging
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let registry = tracing_subscriber::registry().with(filter);
    match logging.format {
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(fmt::layer()).init(),
    }
}

/// Create the parent directory of a file-backed SQLite database
async fn ensure_database_dir(url: &str) -> Result<()> {
    if medibook_db::utils::is_memory_url(url) {
        return Ok(());
    }
    let path = url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:");
    let path = path.split('?').next().unwrap_or(path);
    if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create database directory {:?}", parent))?;
    }
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
