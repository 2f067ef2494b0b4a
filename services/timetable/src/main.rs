//! Timetable service
//!
//! Serves timetable edits and reads over HTTP and drives the periodic daily
//! announcement check.

use std::sync::Arc;

use anyhow::Result;
use timetable_service::{
    api, config,
    db::Database,
    identity::HttpIdentityClient,
    scheduler::AnnouncementWorker,
    service::TimetableService,
    state::AppState,
};
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::Config::from_env()?;

    // Prefer RUST_LOG, fall back to TIMETABLE_LOG_LEVEL
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| config.log_level.clone().into()))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("Starting timetable service");
    info!(
        listen_addr = %config.listen_addr,
        calendar = %config.calendar,
        "Configuration loaded"
    );

    let db = match Database::connect(&config.database).await {
        Ok(db) => {
            info!("Database connection established");
            db
        }
        Err(e) => {
            error!(error = %e, "Failed to connect to database");
            return Err(e.into());
        }
    };

    if config.migrate {
        info!("Running database migrations");
        if let Err(e) = db.run_migrations().await {
            error!(error = %e, "Failed to run migrations");
            return Err(e.into());
        }
    }

    let identity = HttpIdentityClient::new(&config.identity.base_url, config.identity.timeout)?;
    let service = TimetableService::new(Arc::new(db.store()), Arc::new(identity), config.calendar)
        .with_identity_timeout(config.identity.timeout);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let announcement_worker = AnnouncementWorker::new(service.clone(), config.announce_interval);
    let announcement_handle = tokio::spawn({
        let shutdown_rx = shutdown_rx.clone();
        async move {
            announcement_worker.run(shutdown_rx).await;
        }
    });

    let app = api::create_router(AppState::new(service));

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!(addr = %config.listen_addr, "Listening for connections");

    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let mut shutdown_rx = shutdown_rx;
                loop {
                    if *shutdown_rx.borrow() {
                        break;
                    }
                    if shutdown_rx.changed().await.is_err() {
                        break;
                    }
                }
                info!("HTTP server shutting down");
            })
            .await
    });

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
        result = server_handle => {
            match result {
                Ok(Ok(())) => info!("Server exited normally"),
                Ok(Err(e)) => error!(error = %e, "Server error"),
                Err(e) => error!(error = %e, "Server task panicked"),
            }
        }
    }

    let _ = shutdown_tx.send(true);

    info!("Waiting for workers to shut down...");
    let shutdown_timeout = std::time::Duration::from_secs(10);
    if let Err(e) = tokio::time::timeout(shutdown_timeout, announcement_handle).await {
        warn!(error = %e, "Announcement worker did not shut down in time");
    }

    info!("Timetable service shutdown complete");
    Ok(())
}
