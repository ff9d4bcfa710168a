//! HTTP server initialization and runtime setup.
//!
//! Handles the database pool, migrations, the optional event producer and the
//! Axum server lifecycle including graceful shutdown.

use crate::application::services::{AuthService, LinkService, UserService};
use crate::config::Config;
use crate::domain::events::{LinkEvent, UserEvent};
use crate::infrastructure::messaging::{EventPublisher, KafkaPublisher, create_producer};
use crate::infrastructure::persistence::{PgLinkRepository, PgUserRepository};
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use rdkafka::producer::{FutureProducer, Producer};
use rdkafka::util::Timeout;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - PostgreSQL connection pool
/// - Apply migrations
/// - Kafka producer and per-topic publishers (when enabled)
/// - Axum HTTP server
///
/// On SIGINT/SIGTERM the server stops accepting connections, drains in-flight
/// requests, then flushes pending events for up to the configured grace period.
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - The producer cannot be created
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to migrate")?;

    let producer = create_producer(&config.kafka).context("Failed to create Kafka producer")?;

    let (user_publisher, link_publisher) = publishers(producer.as_ref());

    let pool = Arc::new(pool);
    let auth_service = Arc::new(AuthService::new(
        &config.jwt_secret,
        Duration::from_secs(config.jwt_ttl_seconds),
    ));
    let user_service = Arc::new(UserService::new(
        Arc::new(PgUserRepository::new(pool.clone())),
        auth_service.clone(),
        user_publisher,
    ));
    let link_service = Arc::new(LinkService::new(
        Arc::new(PgLinkRepository::new(pool.clone())),
        link_publisher,
    ));

    let state = AppState::new(
        user_service,
        link_service,
        auth_service,
        pool,
        producer.clone(),
    );

    let app = app_router(state);

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    let shutdown = CancellationToken::new();
    tokio::spawn(cancel_on_signal(shutdown.clone()));

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown.cancelled_owned())
    .await?;

    if let Some(producer) = producer {
        flush_producer(producer, config.shutdown_grace()).await;
    }

    tracing::info!("Server stopped");
    Ok(())
}

type Publishers = (
    Option<Arc<dyn EventPublisher<UserEvent>>>,
    Option<Arc<dyn EventPublisher<LinkEvent>>>,
);

/// One publisher per topic, sharing a single producer client.
fn publishers(producer: Option<&FutureProducer>) -> Publishers {
    let Some(producer) = producer else {
        return (None, None);
    };

    let users: Arc<dyn EventPublisher<UserEvent>> =
        Arc::new(KafkaPublisher::<UserEvent>::new(producer.clone()));
    let links: Arc<dyn EventPublisher<LinkEvent>> =
        Arc::new(KafkaPublisher::<LinkEvent>::new(producer.clone()));
    (Some(users), Some(links))
}

/// Waits for queued deliveries. Flushing blocks inside librdkafka.
async fn flush_producer(producer: FutureProducer, grace: Duration) {
    let flushed =
        tokio::task::spawn_blocking(move || producer.flush(Timeout::After(grace))).await;

    match flushed {
        Ok(Ok(())) => tracing::info!("Producer flushed"),
        Ok(Err(e)) => tracing::warn!(error = %e, "Producer flush incomplete"),
        Err(e) => tracing::error!(error = %e, "Producer flush task failed"),
    }
}

/// Cancels `token` on the first SIGINT or SIGTERM.
pub async fn cancel_on_signal(token: CancellationToken) {
    shutdown_signal().await;
    tracing::info!("Shutdown signal received");
    token.cancel();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
