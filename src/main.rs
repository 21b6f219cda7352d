//! area-remote
//!
//! Connects to a remote display server and mirrors its windows into a
//! headless in-memory session.

use anyhow::Result;
use area_remote::config::Config;
use area_remote::ipc::ServerConnection;
use area_remote::platform::WindowPlatform;
use area_remote::platform::headless::HeadlessPlatform;
use area_remote::{Session, WindowSettings};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "area_remote=debug,info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Area remote display client");

    let config = Config::load()?;

    // Setup signal handlers for graceful shutdown
    let (shutdown_tx, mut shutdown_rx) = tokio::sync::mpsc::channel::<()>(1);

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;
        let tx = shutdown_tx.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down gracefully");
                    let _ = tx.send(()).await;
                }
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down gracefully");
                    let _ = tx.send(()).await;
                }
            }
        });
    }

    let connection = ServerConnection::connect(&config.ipc.socket_path()).await?;
    let session = Session::new(
        WindowSettings::from_config(&config),
        connection.requests,
        Box::new(|wid| Box::new(HeadlessPlatform::new(wid)) as Box<dyn WindowPlatform>),
    );

    tokio::select! {
        result = session.run(connection.packets) => {
            if let Err(e) = result {
                error!("Session error: {}", e);
                return Err(e);
            }
        }
        _ = shutdown_rx.recv() => {
            info!("Shutdown signal received");
        }
    }

    Ok(())
}
