//! Complaint producer HTTP server.

use complaint_producer::{AppState, Config, build_router};
use complaints_postgres::PostgresRecordStore;
use complaints_redpanda::KafkaPublisher;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "complaint_producer=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting complaint producer");

    let config = Config::from_env()?;
    info!(
        brokers = %config.kafka.brokers,
        topic = %config.kafka.topic,
        "Configuration loaded"
    );

    info!("Connecting to database...");
    let store = PostgresRecordStore::connect(&config.database_url).await?;
    store.migrate().await?;
    info!("Database ready");

    let publisher = KafkaPublisher::new(&config.kafka)?;

    let app = build_router(AppState {
        store: Arc::new(store),
        publisher: Arc::new(publisher),
    });

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("Received Ctrl+C, shutting down");
}
