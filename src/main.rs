use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use memscan::config::{load_config, validate_config};
use memscan::engine::{EngineConn, EngineTransport};
use memscan::session::{spawn_workers, Session, SessionOptions};

#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config().context("loading configuration")?;
    validate_config(&config).context("validating configuration")?;

    // Initialize logging; RUST_LOG wins over the configured level
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone())),
        )
        .with_target(false)
        .init();

    info!("Starting memscan v{}", env!("CARGO_PKG_VERSION"));
    info!(socket = %config.engine.socket_path, "connecting to engine");

    let stream = tokio::net::UnixStream::connect(&config.engine.socket_path)
        .await
        .with_context(|| format!("connecting to engine at {}", config.engine.socket_path))?;
    let transport = EngineTransport::with_max_frame_len(stream, config.engine.max_frame_len);

    let session = Arc::new(Session::new(
        EngineConn::new(transport),
        SessionOptions {
            page_size: config.engine.page_size,
            result_list_limit: config.engine.result_list_limit,
        },
    ));

    // Optional pid argument attaches right away
    if let Some(pid) = std::env::args().nth(1) {
        let pid: u32 = pid.parse().context("pid argument must be an integer")?;
        session.attach(pid).await?;
    }

    let workers = spawn_workers(
        session.clone(),
        config.worker.watch_interval(),
        config.worker.progress_interval(),
    );

    info!("memscan ready. Press Ctrl+C to shutdown.");
    tokio::signal::ctrl_c().await?;

    info!("Shutting down");
    session.shutdown().await?;
    workers.abort();
    Ok(())
}
