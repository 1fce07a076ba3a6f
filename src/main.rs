use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use clientflow::app;
use clientflow::config::AppConfig;
use clientflow::database::{DatabaseManager, MemoryStore, PgStore, Store};
use clientflow::state::AppState;

#[derive(Parser)]
#[command(name = "clientflow")]
#[command(about = "ClientFlow API server")]
#[command(version)]
struct Args {
    #[arg(long, help = "Serve from an empty in-memory store instead of Postgres")]
    memory: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL and provider keys
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    let config = AppConfig::from_env();

    let default_filter = if config.server.enable_request_logging {
        "clientflow=info,tower_http=debug"
    } else {
        "clientflow=info,tower_http=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    tracing::info!("Starting ClientFlow API in {:?} mode", config.environment);

    if config.is_production() && config.server.expose_error_detail {
        tracing::warn!("API_EXPOSE_ERROR_DETAIL is on in production; 5xx bodies will carry internals");
    }

    let mut manager = None;
    let store = if args.memory {
        tracing::warn!("Using in-memory store; data is lost on exit");
        Store::from_backend(MemoryStore::new())
    } else {
        let db = DatabaseManager::connect(&config.database)
            .await
            .context("failed to connect to database")?;
        if config.database.run_migrations {
            db.migrate().await.context("failed to apply migrations")?;
        }
        let store = Store::from_backend(PgStore::from_manager(&db));
        manager = Some(db);
        store
    };

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::from_config(config, store)?;
    let router = app::router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("ClientFlow API listening on http://{}", bind_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Some(db) = manager {
        db.close().await;
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
