//! Answers command service.
//!
//! - Projects `userCreated` and `discussionStarted` into `PostgreSQL`
//! - Serves `POST /answers` and publishes `answerPosted`
//!
//! # Usage
//!
//! ```bash
//! # Start infrastructure
//! docker compose up -d
//!
//! # Run server
//! cargo run --bin answers
//! ```

use answers_service::{Application, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Missing .env is fine
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,answers=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    tracing::info!(
        redpanda = %config.redpanda.brokers,
        users_topic = %config.redpanda.users_topic,
        discussions_topic = %config.redpanda.discussions_topic,
        answers_topic = %config.redpanda.answers_topic,
        "Configuration loaded"
    );

    let app = Application::build(config).await?;
    tracing::info!("Answers service is running, press Ctrl+C to shutdown");

    app.run().await
}
