//! Order server entry point

use order_server::core::{Config, ServerState, server};
use order_server::utils::logger;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let config = Config::from_env();
    logger::init_logger_with_file(Some(&config.log_level), config.log_dir.as_deref());

    tracing::info!(
        work_dir = %config.work_dir,
        port = config.http_port,
        tz = %config.timezone,
        "Starting order server"
    );

    let state = ServerState::initialize(config)?;

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received");
            signal_token.cancel();
        }
    });

    server::run(state, shutdown).await
}
