use tracing_subscriber::EnvFilter;

use tumor_findings_miner::api::{start_server, ApiContext};
use tumor_findings_miner::{config, db};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let db_path = config::db_path();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    // Migrate up front so the first dashboard request doesn't hit a missing
    // schema.
    db::open_database(&db_path)?;
    tracing::info!(path = %db_path.display(), "database ready");

    let ctx = ApiContext::new(db_path);
    let mut server = start_server(ctx, config::bind_addr()).await?;
    tracing::info!("dashboard at http://{}/", server.addr);

    tokio::signal::ctrl_c().await?;
    tracing::info!("interrupt received, shutting down");
    server.shutdown();

    Ok(())
}
