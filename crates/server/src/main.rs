use std::sync::Arc;

use anyhow::Result;
use axum::serve;
use karma_core::{config::AppConfig, AlertService};
use server::{create_app, AppState};
use tokio::{signal, sync::broadcast};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the tracing subscriber.
///
/// `RUST_LOG=debug` and `RUST_LOG=trace` raise every workspace crate to that level;
/// any other `RUST_LOG` value is used as a filter directly.
fn init_logging(config: &AppConfig) {
    let filter = match std::env::var("RUST_LOG").as_deref() {
        Ok("debug") => EnvFilter::new("warn,karma_core=debug,server=debug,cli=debug,tests=debug"),
        Ok("trace") => EnvFilter::new("warn,karma_core=trace,server=trace,cli=trace,tests=trace"),
        Ok(_) => EnvFilter::try_from_env("RUST_LOG")
            .unwrap_or_else(|_| EnvFilter::new("warn,karma_core=debug,server=debug")),
        Err(_) => EnvFilter::new(format!(
            "warn,karma_core={level},server={level}",
            level = config.logging.level
        )),
    };

    let registry = tracing_subscriber::registry().with(filter);

    if config.logging.format.as_str() == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .pretty()
            .with_file(true)
            .with_line_number(true)
            .with_target(false);
        registry.with(fmt_layer).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load().map_err(|e| anyhow::anyhow!("Failed to load config: {e}"))?;
    config.validate().map_err(|e| anyhow::anyhow!("Invalid configuration: {e}"))?;

    init_logging(&config);

    info!(
        karma_url = %config.karma.url,
        deadline_ms = u64::try_from(config.operation_deadline().as_millis()).unwrap_or(u64::MAX),
        "Starting karma alert server"
    );

    let service = Arc::new(
        AlertService::from_config(&config)
            .map_err(|e| anyhow::anyhow!("Failed to build alert service: {e}"))?,
    );

    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    let state = AppState::new(service, shutdown_tx.clone());
    let app = create_app(state, config.server.max_concurrent_requests);

    let addr = config.socket_addr().map_err(|e| anyhow::anyhow!(e))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(address = %addr, "HTTP server listening");

    let shutdown = async move {
        shutdown_signal().await;
        // In-flight engine calls observe this and return `Cancelled`.
        let _ = shutdown_tx.send(());
    };

    if let Err(e) = serve(listener, app).with_graceful_shutdown(shutdown).await {
        error!(error = %e, "Server error occurred");
    }

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install signal handler");
                () = std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown");
}
