//! Application lifecycle management and graceful shutdown.
//!
//! 1. **Startup**: connect the document store, apply migrations, connect
//!    the event bus and install the metrics exporter
//! 2. **Runtime**: one projection consumer per inbound topic, HTTP server
//! 3. **Shutdown**: on Ctrl+C or SIGTERM the HTTP server stops accepting
//!    connections, consumers are told to stop and awaited with a timeout
//!
//! # Example
//!
//! ```rust,ignore
//! let app = Application::build(Config::from_env()).await?;
//! app.run().await?;
//! ```

use crate::config::Config;
use anyhow::Context;
use answers_core::command::AnswerCommandHandler;
use answers_core::environment::SystemClock;
use answers_core::event_bus::EventBus;
use answers_core::projection::ProjectionStore;
use answers_postgres::PostgresDocumentStore;
use answers_projections::{DocumentProjectionStore, EventConsumer, ProjectionUpdater};
use answers_redpanda::RedpandaEventBus;
use answers_web::{router, AppState};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, warn};

/// Fully wired application, ready to run.
pub struct Application {
    /// TCP listener for HTTP server
    listener: tokio::net::TcpListener,

    /// Axum router with all HTTP routes
    app: axum::Router,

    /// Projection consumers, one per inbound topic
    consumers: Vec<EventConsumer>,

    /// Shutdown signal broadcaster
    shutdown_tx: broadcast::Sender<()>,

    /// Application configuration
    config: Arc<Config>,
}

impl Application {
    /// Connect every adapter and wire the command handler, consumers and
    /// router.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - the database is unreachable or migrations fail
    /// - the event bus cannot be created
    /// - the metrics exporter or the HTTP listener cannot bind
    pub async fn build(config: Config) -> anyhow::Result<Self> {
        let config = Arc::new(config);

        PrometheusBuilder::new()
            .with_http_listener(config.metrics_address())
            .install()
            .context("failed to install Prometheus exporter")?;
        crate::metrics::register_metrics();
        info!(address = %config.metrics_address(), "Metrics exporter listening");

        let documents = Arc::new(
            PostgresDocumentStore::connect(&config.postgres.url, config.postgres.max_connections)
                .await
                .context("failed to connect to PostgreSQL")?,
        );
        documents
            .migrate()
            .await
            .context("failed to migrate document store")?;

        let event_bus: Arc<dyn EventBus> = Arc::new(
            RedpandaEventBus::builder()
                .brokers(&config.redpanda.brokers)
                .consumer_group(&config.redpanda.consumer_group)
                .auto_offset_reset(&config.redpanda.auto_offset_reset)
                .build()
                .context("failed to create Redpanda event bus")?,
        );

        let projections: Arc<dyn ProjectionStore> =
            Arc::new(DocumentProjectionStore::new(documents.clone()));

        let (shutdown_tx, _) = broadcast::channel(1);
        let consumers = vec![
            projection_consumer(
                &config,
                &config.redpanda.users_topic,
                ProjectionUpdater::users(projections.clone()),
                &event_bus,
                &shutdown_tx,
            )?,
            projection_consumer(
                &config,
                &config.redpanda.discussions_topic,
                ProjectionUpdater::discussions(projections.clone()),
                &event_bus,
                &shutdown_tx,
            )?,
        ];

        let commands = AnswerCommandHandler::new(
            projections,
            documents,
            event_bus,
            Arc::new(SystemClock),
            config.redpanda.answers_topic.clone(),
        );
        let app = router(AppState::new(Arc::new(commands)));

        let listener = tokio::net::TcpListener::bind(config.http_address())
            .await
            .with_context(|| format!("failed to bind {}", config.http_address()))?;

        Ok(Self {
            listener,
            app,
            consumers,
            shutdown_tx,
            config,
        })
    }

    /// Run until a shutdown signal is received, then stop gracefully.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP server fails.
    pub async fn run(self) -> anyhow::Result<()> {
        info!(consumer_count = self.consumers.len(), "Starting event consumers");
        let consumer_handles: Vec<_> = self
            .consumers
            .into_iter()
            .map(|consumer| {
                let name = consumer.name().to_string();
                (name, consumer.spawn())
            })
            .collect();

        info!(address = %self.config.http_address(), "HTTP server listening for requests");
        axum::serve(self.listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("HTTP server failed")?;

        info!("HTTP server stopped, initiating graceful shutdown...");

        // No receivers left means every consumer already stopped
        let _ = self.shutdown_tx.send(());

        Self::await_shutdown(consumer_handles, &self.config).await;

        info!("Graceful shutdown complete");
        Ok(())
    }

    async fn await_shutdown(
        consumer_handles: Vec<(String, tokio::task::JoinHandle<()>)>,
        config: &Config,
    ) {
        let timeout = config.shutdown_timeout();

        for (name, handle) in consumer_handles {
            match tokio::time::timeout(timeout, handle).await {
                Ok(Ok(())) => info!(consumer = %name, "Consumer stopped gracefully"),
                Ok(Err(e)) => warn!(consumer = %name, error = %e, "Consumer task failed"),
                Err(_) => warn!(consumer = %name, "Consumer shutdown timed out"),
            }
        }
    }
}

fn projection_consumer(
    config: &Config,
    topic: &str,
    updater: ProjectionUpdater,
    event_bus: &Arc<dyn EventBus>,
    shutdown_tx: &broadcast::Sender<()>,
) -> anyhow::Result<EventConsumer> {
    let consumer = EventConsumer::builder()
        .name(format!("{}-projection", updater.name()))
        .topics(vec![topic.to_string()])
        .event_bus(event_bus.clone())
        .handler(Arc::new(updater))
        .shutdown(shutdown_tx.subscribe())
        .retry_delay(config.retry_delay())
        .build()
        .with_context(|| format!("failed to build consumer for {topic}"))?;
    Ok(consumer)
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
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
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        () = terminate => {
            info!("Received SIGTERM signal");
        }
    }
}
