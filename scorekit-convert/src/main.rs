//! scorekit-convert - sheet music to MIDI conversion service
//!
//! Runs the pipeline controller behind an HTTP API (default port 5790) with
//! an SSE progress stream.

use std::net::IpAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scorekit_convert::config::ConvertConfig;
use scorekit_convert::AppState;

/// Command-line arguments for scorekit-convert
#[derive(Parser, Debug)]
#[command(name = "scorekit-convert")]
#[command(about = "Sheet music to MIDI conversion service")]
#[command(version)]
struct Args {
    /// Bootstrap config file (default: ~/.config/scorekit/convert.toml)
    #[arg(short, long, env = "SCOREKIT_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on (overrides the config file)
    #[arg(short, long, env = "SCOREKIT_PORT")]
    port: Option<u16>,

    /// Address to bind (overrides the config file)
    #[arg(short, long, env = "SCOREKIT_BIND")]
    bind: Option<IpAddr>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ConvertConfig::load(args.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(bind) = args.bind {
        config.bind_address = bind.to_string();
    }
    config.validate().context("Invalid configuration")?;

    // Initialize tracing; RUST_LOG wins over the configured level
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting scorekit-convert v{}", env!("CARGO_PKG_VERSION"));
    info!(
        backend = ?config.recognition.backend,
        time_scale = config.recognition.time_scale,
        failure_rate = config.failures.failure_rate,
        partial_rate = config.failures.partial_rate,
        "Recognition configured"
    );

    let state = AppState::from_config(&config).context("Failed to initialize controller")?;
    let app = scorekit_convert::build_router(state);

    let addr = config.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
