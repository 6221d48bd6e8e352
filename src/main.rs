use eldercare::api::server::start_server;
use eldercare::api::AppContext;
use eldercare::config::{self, Config};
use eldercare::db::open_database;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config::default_log_filter())),
        )
        .init();

    if let Err(e) = run().await {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    let config = Config::from_env().map_err(|e| e.to_string())?;

    if let Some(dir) = config.database_path.parent() {
        std::fs::create_dir_all(dir)
            .map_err(|e| format!("Failed to create data directory: {e}"))?;
    }
    std::fs::create_dir_all(&config.photo_dir)
        .map_err(|e| format!("Failed to create photo directory: {e}"))?;

    let conn = open_database(&config.database_path).map_err(|e| e.to_string())?;
    tracing::info!(path = %config.database_path.display(), "Database ready");

    let bind_addr = config.bind_addr;
    let ctx = AppContext::new(config, conn);
    let mut server = start_server(ctx, bind_addr).await?;

    tracing::info!(
        "{} v{} listening on {}",
        config::APP_NAME,
        config::APP_VERSION,
        server.addr
    );

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| format!("Failed to listen for shutdown signal: {e}"))?;
    tracing::info!("Shutting down");
    server.shutdown();

    Ok(())
}
