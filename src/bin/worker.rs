//! Event consumer host for devshort.
//!
//! Runs one consumer group runner per topic until SIGINT/SIGTERM, then waits
//! at most `SHUTDOWN_GRACE_SECONDS` for the runners to close their groups.
//!
//! # Usage
//!
//! ```bash
//! # Consume both topics
//! cargo run --bin worker
//!
//! # Only link events
//! cargo run --bin worker -- --topic links
//! ```
//!
//! # Environment Variables
//!
//! - `KAFKA_BOOTSTRAP_SERVERS`, `KAFKA_GROUP_ID`, `KAFKA_AUTO_OFFSET_RESET`
//! - `KAFKA_REDELIVERY_BACKOFF_MS`
//! - `RUST_LOG`, `LOG_FORMAT`, `SHUTDOWN_GRACE_SECONDS`

use devshort::config;
use devshort::domain::events::EventKind;
use devshort::infrastructure::messaging::{
    ConsumerGroup, LinkEventHandler, MessageHandler, MessagingError, RunnerOptions,
    RunnerReport, UserEventHandler, create_consumer_group, run_consumer,
};
use devshort::{logging, server};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Consumes user and link events.
#[derive(Parser)]
#[command(name = "worker")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Topic to consume. Repeat for several; defaults to all topics.
    #[arg(long = "topic", value_enum)]
    topics: Vec<Topic>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum Topic {
    Users,
    Links,
}

impl Topic {
    fn kind(self) -> EventKind {
        match self {
            Topic::Users => EventKind::User,
            Topic::Links => EventKind::Link,
        }
    }

    fn handler(self) -> Arc<dyn MessageHandler> {
        match self {
            Topic::Users => Arc::new(UserEventHandler::new()),
            Topic::Links => Arc::new(LinkEventHandler::new()),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = config::load_worker_from_env()?;
    logging::init(&config.log_level, &config.log_format);
    config.print_summary();

    let mut topics = cli.topics;
    if topics.is_empty() {
        topics = vec![Topic::Users, Topic::Links];
    }
    topics.sort();
    topics.dedup();

    let token = CancellationToken::new();
    let options = RunnerOptions {
        redelivery_backoff: config.kafka.redelivery_backoff(),
    };
    tracing::info!(group_id = %config.kafka.group_id, "Joining consumer group");
    let runners = spawn_runners(&topics, &token, options, |_| {
        create_consumer_group(&config.kafka)
    })?;

    server::cancel_on_signal(token.clone()).await;

    let grace = config.shutdown_grace();
    match tokio::time::timeout(grace, futures::future::join_all(runners)).await {
        Ok(results) => {
            for result in results {
                match result {
                    Ok((topic, report)) => log_report(topic, &report),
                    Err(e) => tracing::error!(error = %e, "Consumer task failed"),
                }
            }
            tracing::info!("Worker stopped");
        }
        Err(_) => {
            tracing::warn!(
                grace_seconds = grace.as_secs(),
                "Consumers did not stop within the grace period"
            );
        }
    }

    Ok(())
}

type Runner = JoinHandle<(&'static str, RunnerReport)>;

/// Spawns one runner task per topic, all bound to `token`.
///
/// Every group is created before the first runner starts, so a failure for
/// any topic leaves nothing running.
fn spawn_runners<G, F>(
    topics: &[Topic],
    token: &CancellationToken,
    options: RunnerOptions,
    mut create_group: F,
) -> Result<Vec<Runner>>
where
    G: ConsumerGroup + 'static,
    F: FnMut(Topic) -> Result<G, MessagingError>,
{
    let mut groups = Vec::with_capacity(topics.len());
    for &topic in topics {
        let group = create_group(topic).with_context(|| {
            format!("Failed to create consumer for topic {}", topic.kind().topic())
        })?;
        groups.push((topic, group));
    }

    let runners = groups
        .into_iter()
        .map(|(topic, group)| {
            let name = topic.kind().topic();
            let handler = topic.handler();
            let token = token.clone();

            tracing::info!(topic = name, "Starting consumer");
            tokio::spawn(async move {
                let report = run_consumer(token, group, name, handler, options).await;
                (name, report)
            })
        })
        .collect();
    Ok(runners)
}

fn log_report(topic: &str, report: &RunnerReport) {
    tracing::info!(
        topic,
        acknowledged = report.acknowledged,
        failed = report.failed,
        faults = report.faults,
        "Consumer finished"
    );
}
