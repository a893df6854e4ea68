//! Complaint consumer HTTP server and background subscription.

use complaint_consumer::{
    AcknowledgementHandler, AppState, Config, EmailTransport, build_router,
};
use complaints_core::EmailSender;
use complaints_email::{ConsoleEmailSender, SmtpEmailSender};
use complaints_postgres::PostgresRecordStore;
use complaints_redpanda::KafkaConnector;
use complaints_runtime::{
    ConsumerState, ConsumerSupervisor, MetricsServer, ShutdownOutcome, SubscriptionLoop,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "complaint_consumer=info,complaints_runtime=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting complaint consumer");

    let config = Config::from_env()?;
    info!(
        brokers = %config.kafka.brokers,
        topic = %config.kafka.topic,
        group_id = %config.kafka.group_id,
        offset_reset = %config.kafka.offset_reset,
        transport = ?config.email_transport,
        "Configuration loaded"
    );

    if let Some(port) = config.metrics_port {
        let mut metrics = MetricsServer::new(SocketAddr::from(([0, 0, 0, 0], port)));
        metrics.start()?;
    }

    // Fail fast: a consumer without its database cannot acknowledge anything.
    info!("Connecting to database...");
    let store = PostgresRecordStore::connect(&config.database_url).await?;
    store.migrate().await?;
    info!("Database ready");

    let email: Arc<dyn EmailSender> = match config.email_transport {
        EmailTransport::Smtp => Arc::new(SmtpEmailSender::new(config.smtp.clone())),
        EmailTransport::Console => Arc::new(ConsoleEmailSender::new()),
    };

    let state = ConsumerState::new();
    let handler = Arc::new(AcknowledgementHandler::new(Arc::new(store), email.clone()));
    let subscription = SubscriptionLoop::new(
        KafkaConnector::new(config.kafka.clone()),
        handler,
        state.clone(),
    )
    .with_settings(config.loop_settings());
    let supervisor = ConsumerSupervisor::start(subscription, config.supervisor);

    let app = build_router(AppState {
        consumer: state,
        email,
        kafka_env: config.kafka_env.clone(),
    });

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    match supervisor.shutdown().await {
        ShutdownOutcome::Completed => info!("Consumer stopped"),
        ShutdownOutcome::Failed => error!("Consumer task ended abnormally"),
        ShutdownOutcome::TimedOut => warn!("Consumer did not stop in time; abandoning it"),
    }

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}
