use std::sync::Arc;

use anyhow::Result;
use tokio::net::TcpListener;
use tokio::signal;

use enrol_notification_service::config::Settings;
use enrol_notification_service::host::create_directory;
use enrol_notification_service::notification::create_transport;
use enrol_notification_service::server::{create_app, AppState};
use enrol_notification_service::telemetry::init_telemetry;
use enrol_notification_service::triggers::RedisSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let settings = Settings::new()?;

    // Keep the guard alive until exit so pending spans are flushed
    let _telemetry = init_telemetry(&settings.otel, &settings.log)?;
    tracing::info!("Configuration loaded");

    let directory = create_directory(&settings).await?;
    let transport = create_transport(&settings.transport)?;

    let state = AppState::new(settings.clone(), directory, transport)?;
    tracing::info!(
        directory = state.directory.backend_name(),
        transport = state.dispatcher.transport_name(),
        "Application state initialized"
    );

    let redis_subscriber = Arc::new(RedisSubscriber::new(
        settings.redis.clone(),
        state.handler.clone(),
    ));
    let shutdown_signal = redis_subscriber.shutdown_signal();

    // Start Redis subscriber in background
    let redis_handle = if settings.redis.enabled {
        let subscriber = redis_subscriber.clone();
        Some(tokio::spawn(async move {
            if let Err(e) = subscriber.start().await {
                tracing::error!(error = %e, "Redis subscriber failed");
            }
        }))
    } else {
        tracing::info!("Redis trigger disabled");
        None
    };

    let app = create_app(state);

    let addr = settings.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal_handler(shutdown_signal))
        .await?;

    if let Some(handle) = redis_handle {
        tracing::info!("Waiting for Redis subscriber to finish...");
        let _ = handle.await;
    }

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal_handler(shutdown_tx: tokio::sync::broadcast::Sender<()>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }

    // Send shutdown signal to Redis subscriber
    let _ = shutdown_tx.send(());
}
