//! Consumer group runner.
//!
//! [`run_consumer`] hosts one `(topic, handler)` pair until its cancellation
//! token fires. Messages are handled one at a time in claim order, so events
//! sharing a key (and therefore a partition) are processed in the order they
//! were produced. Offsets only move forward after the handler succeeds.
//!
//! ```text
//! Idle ──join──▶ Claiming ──message──▶ Processing ──ok──▶ acknowledge ─┐
//!                  ▲   │                    │                          │
//!                  │   └─cancel─▶ Closed    └─err──▶ redeliver+backoff ┤
//!                  └───────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tokio_util::sync::CancellationToken;

use super::{ConsumerGroup, MessageHandler, MessagingError};

const JOIN_BACKOFF_BASE_MS: u64 = 10;
const JOIN_BACKOFF_MAX: Duration = Duration::from_secs(5);

/// Tuning knobs for [`run_consumer`].
#[derive(Debug, Clone, Copy)]
pub struct RunnerOptions {
    /// Pause after a failed delivery before claiming again.
    pub redelivery_backoff: Duration,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            redelivery_backoff: Duration::from_secs(1),
        }
    }
}

/// What a runner observed before it stopped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunnerReport {
    /// Messages handled successfully and acknowledged.
    pub acknowledged: u64,
    /// Handler failures. Each one was left unacknowledged for redelivery.
    pub failed: u64,
    /// Client, claim and offset errors absorbed by the runner.
    pub faults: u64,
}

/// Runs the consume loop for `topic` until `token` is cancelled.
///
/// Joining the group is retried with exponential backoff for as long as the
/// token is live. A handler call in progress is never interrupted: the token is
/// only observed while waiting for a message or backing off. The group is
/// closed exactly once, after the fault-drain task has finished.
pub async fn run_consumer<G>(
    token: CancellationToken,
    mut group: G,
    topic: &str,
    handler: Arc<dyn MessageHandler>,
    options: RunnerOptions,
) -> RunnerReport
where
    G: ConsumerGroup,
{
    let drain_token = token.child_token();
    let drain = group
        .take_errors()
        .map(|faults| spawn_fault_drain(drain_token.clone(), topic.to_string(), faults));

    let mut report = RunnerReport::default();

    if join(&token, &group, topic).await {
        tracing::info!(topic, "Consumer joined group");
        claim_loop(&token, &group, topic, handler.as_ref(), options, &mut report).await;
    }

    drain_token.cancel();
    if let Some(drain) = drain {
        match drain.await {
            Ok(observed) => report.faults += observed,
            Err(e) => tracing::error!(topic, error = %e, "Fault drain task failed"),
        }
    }

    group.close();
    tracing::info!(
        topic,
        acknowledged = report.acknowledged,
        failed = report.failed,
        faults = report.faults,
        "Consumer closed"
    );
    report
}

/// Subscribes to `topic`, retrying until it succeeds or the token fires.
async fn join<G: ConsumerGroup>(token: &CancellationToken, group: &G, topic: &str) -> bool {
    let strategy = ExponentialBackoff::from_millis(JOIN_BACKOFF_BASE_MS)
        .max_delay(JOIN_BACKOFF_MAX)
        .map(jitter);

    let attempt = || async {
        group.subscribe(topic).inspect_err(|e| {
            tracing::warn!(topic, error = %e, "Failed to join consumer group, retrying");
        })
    };

    tokio::select! {
        biased;
        _ = token.cancelled() => false,
        joined = Retry::spawn(strategy, attempt) => joined.is_ok(),
    }
}

async fn claim_loop<G: ConsumerGroup>(
    token: &CancellationToken,
    group: &G,
    topic: &str,
    handler: &dyn MessageHandler,
    options: RunnerOptions,
    report: &mut RunnerReport,
) {
    loop {
        let claimed = tokio::select! {
            biased;
            _ = token.cancelled() => break,
            claimed = group.claim() => claimed,
        };

        let message = match claimed {
            Ok(message) => message,
            Err(e) => {
                report.faults += 1;
                tracing::warn!(topic, error = %e, "Failed to claim message");
                if !pause(token, options.redelivery_backoff).await {
                    break;
                }
                continue;
            }
        };

        match handler.handle(&message).await {
            Ok(()) => {
                metrics::counter!("messages_processed_total", "topic" => topic.to_string())
                    .increment(1);
                match group.acknowledge(&message) {
                    Ok(()) => report.acknowledged += 1,
                    Err(e) => {
                        report.faults += 1;
                        tracing::error!(
                            topic,
                            partition = message.partition,
                            offset = message.offset,
                            error = %e,
                            "Failed to acknowledge message"
                        );
                    }
                }
            }
            Err(e) => {
                report.failed += 1;
                metrics::counter!("messages_failed_total", "topic" => topic.to_string())
                    .increment(1);
                tracing::error!(
                    topic,
                    partition = message.partition,
                    offset = message.offset,
                    key = message.key_str().unwrap_or_default(),
                    error = %e,
                    "Failed to handle message, it will be delivered again"
                );

                if let Err(e) = group.redeliver(&message) {
                    report.faults += 1;
                    tracing::error!(
                        topic,
                        partition = message.partition,
                        offset = message.offset,
                        error = %e,
                        "Failed to rewind partition"
                    );
                }

                if !pause(token, options.redelivery_backoff).await {
                    break;
                }
            }
        }
    }
}

/// Sleeps for `duration`. Returns `false` if the token fired first.
async fn pause(token: &CancellationToken, duration: Duration) -> bool {
    tokio::select! {
        biased;
        _ = token.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}

fn spawn_fault_drain(
    token: CancellationToken,
    topic: String,
    mut faults: mpsc::UnboundedReceiver<MessagingError>,
) -> JoinHandle<u64> {
    tokio::spawn(async move {
        let mut observed = 0;
        loop {
            tokio::select! {
                biased;
                fault = faults.recv() => match fault {
                    Some(e) => {
                        observed += 1;
                        tracing::warn!(topic = %topic, error = %e, "Consumer group fault");
                    }
                    None => break,
                },
                _ = token.cancelled() => break,
            }
        }

        while let Ok(e) = faults.try_recv() {
            observed += 1;
            tracing::warn!(topic = %topic, error = %e, "Consumer group fault");
        }
        observed
    })
}
