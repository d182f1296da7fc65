//! The sync worker.
//!
//! A single task drains the event queue and syncs one event at a time, so
//! two events never write the same organization's rulesets concurrently.
//! Shutdown cancels the in-flight sync: its pending GitHub call returns
//! `Cancelled` and the worker stops without taking further events.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::auth::InstallationBroker;
use crate::pipeline::Pipeline;
use crate::webhooks::RulesetEvent;

/// Capacity of the queue between the webhook handler and the worker.
pub const QUEUE_CAPACITY: usize = 64;

/// Creates the event queue.
///
/// The sender goes to the webhook server, which uses `try_send` and answers
/// 503 when the queue is full. The receiver goes to [`SyncWorker::new`].
pub fn event_queue() -> (mpsc::Sender<RulesetEvent>, mpsc::Receiver<RulesetEvent>) {
    mpsc::channel(QUEUE_CAPACITY)
}

/// Drains queued events through a pipeline.
///
/// Owns the receiving end of the queue. Each event gets a child of the
/// shutdown token, so cancelling shutdown cancels the in-flight sync too.
///
/// ```ignore
/// let (tx, rx) = event_queue();
/// let worker = tokio::spawn(SyncWorker::new(pipeline, rx, shutdown.clone()).run());
/// // hand `tx` to the webhook server
/// ```
pub struct SyncWorker<B> {
    pipeline: Pipeline<B>,
    rx: mpsc::Receiver<RulesetEvent>,
    shutdown: CancellationToken,
}

impl<B> SyncWorker<B>
where
    B: InstallationBroker + Sync,
    B::Client: Sync,
{
    /// Creates a worker; nothing runs until [`run`](Self::run) is awaited.
    pub fn new(
        pipeline: Pipeline<B>,
        rx: mpsc::Receiver<RulesetEvent>,
        shutdown: CancellationToken,
    ) -> Self {
        SyncWorker {
            pipeline,
            rx,
            shutdown,
        }
    }

    /// Runs until shutdown is requested or every sender is dropped.
    pub async fn run(mut self) {
        info!(dir = %self.pipeline.store().dir().display(), "Sync worker started");

        loop {
            tokio::select! {
                biased;

                _ = self.shutdown.cancelled() => {
                    info!("Shutdown signal received, stopping sync worker");
                    break;
                }

                event = self.rx.recv() => {
                    match event {
                        Some(event) => self.handle(event).await,
                        None => {
                            debug!("Event queue closed, stopping sync worker");
                            break;
                        }
                    }
                }
            }
        }
    }

    async fn handle(&self, event: RulesetEvent) {
        let cancel = self.shutdown.child_token();

        match self.pipeline.sync_event(&event, &cancel).await {
            Ok(report) if report.is_success() => {
                debug!(applied = report.applied.len(), "Event synced");
            }
            Ok(report) => {
                warn!(
                    org = %event.organization,
                    ruleset = %event.ruleset.name,
                    failed = report.failed.len(),
                    applied = report.applied.len(),
                    "Event synced with failures"
                );
            }
            Err(e) if e.is_cancelled() => {
                info!(org = %event.organization, ruleset = %event.ruleset.name, "Sync cancelled");
            }
            Err(e) => {
                error!(
                    org = %event.organization,
                    ruleset = %event.ruleset.name,
                    error = %e,
                    "Sync failed"
                );
            }
        }
    }
}
