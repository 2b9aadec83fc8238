//! SchedulerActor - drives the periodic probe cycle
//!
//! The scheduler fires one probe cycle ("tick") per interval. Each tick:
//!
//! ```text
//! Timer tick → registry snapshot → concurrent probes → classify → record
//!     ↑
//!     └─── Commands (TickNow, UpdateInterval, Shutdown)
//! ```
//!
//! ## Key guarantees
//!
//! 1. **Ticks never overlap** - the tick body is awaited inside the
//!    select loop and the ticker uses `MissedTickBehavior::Delay`, so a
//!    cycle that outruns the interval defers the next one instead of
//!    stacking duplicate in-flight probes.
//! 2. **Snapshot membership** - the target list is copied once at tick
//!    start; registry mutations during a tick take effect next tick.
//! 3. **Per-target isolation** - a probe or persistence failure for one
//!    target never reaches the tick driver; the target still gets its
//!    `down` record and siblings are unaffected.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use futures::StreamExt;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, MissedTickBehavior, interval, interval_at};
use tracing::{debug, error, instrument, trace, warn};

use crate::probe::{ProbeExecutor, classify};
use crate::recorder::Recorder;
use crate::storage::{StorageBackend, TargetSnapshot};

/// Commands that can be sent to the SchedulerActor
#[derive(Debug)]
pub enum SchedulerCommand {
    /// Trigger an immediate tick (bypassing the interval timer)
    ///
    /// Used for testing and manual refresh operations.
    TickNow {
        /// Channel to send the result back
        respond_to: oneshot::Sender<TickSummary>,
    },

    /// Update the probe interval
    UpdateInterval {
        /// New interval in seconds
        interval_secs: u64,
    },

    /// Gracefully shut down the scheduler
    ///
    /// An in-flight tick is allowed to finish; only future ticks are
    /// suppressed.
    Shutdown,
}

/// Outcome of one completed tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickSummary {
    /// Targets in the snapshot at tick start
    pub targets: usize,

    /// Records successfully persisted
    pub recorded: usize,
}

/// Actor that owns the probe cycle
pub struct SchedulerActor {
    storage: Arc<dyn StorageBackend>,
    executor: ProbeExecutor,
    recorder: Recorder,

    /// Command receiver for control messages
    command_rx: mpsc::Receiver<SchedulerCommand>,

    /// Current probe interval
    interval_duration: Duration,

    /// Optional cap on concurrent probes within a tick
    max_concurrent: Option<usize>,
}

impl SchedulerActor {
    pub fn new(
        storage: Arc<dyn StorageBackend>,
        executor: ProbeExecutor,
        command_rx: mpsc::Receiver<SchedulerCommand>,
        interval_duration: Duration,
        max_concurrent: Option<usize>,
    ) -> Self {
        let recorder = Recorder::new(storage.clone());

        Self {
            storage,
            executor,
            recorder,
            command_rx,
            interval_duration,
            max_concurrent,
        }
    }

    /// Run the actor's main loop
    ///
    /// Runs until a Shutdown command is received or the command channel
    /// is closed. Nothing a tick does can break this loop: every
    /// per-target failure is absorbed inside the fan-out.
    #[instrument(skip(self))]
    pub async fn run(mut self) {
        debug!(
            "starting scheduler with interval {:?}",
            self.interval_duration
        );

        let mut ticker = interval(self.interval_duration);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                // Timer tick - run one probe cycle. The next tick is
                // deferred until this one completes.
                _ = ticker.tick() => {
                    self.run_tick().await;
                }

                // Handle commands
                Some(cmd) = self.command_rx.recv() => {
                    match cmd {
                        SchedulerCommand::TickNow { respond_to } => {
                            debug!("received TickNow command");
                            let summary = self.run_tick().await;
                            let _ = respond_to.send(summary);
                        }

                        SchedulerCommand::UpdateInterval { interval_secs } => {
                            debug!("updating interval to {interval_secs}s");
                            self.interval_duration = Duration::from_secs(interval_secs);
                            // Next fire only after a full new interval;
                            // rescheduling must not run an extra cycle.
                            ticker = interval_at(
                                Instant::now() + self.interval_duration,
                                self.interval_duration,
                            );
                            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                        }

                        SchedulerCommand::Shutdown => {
                            debug!("received shutdown command");
                            break;
                        }
                    }
                }

                // Command channel closed - exit
                else => {
                    warn!("command channel closed, shutting down");
                    break;
                }
            }
        }

        debug!("scheduler stopped");
    }

    /// Execute one full probe cycle
    ///
    /// Snapshots the registry once, then probes every target
    /// concurrently. The tick completes only when every fanned-out
    /// probe has finished, timed out, or failed.
    #[instrument(skip(self))]
    async fn run_tick(&self) -> TickSummary {
        let targets = match self.storage.current_targets().await {
            Ok(targets) => targets,
            Err(e) => {
                error!("failed to snapshot registry: {e}");
                return TickSummary {
                    targets: 0,
                    recorded: 0,
                };
            }
        };

        let total = targets.len();
        trace!("tick started with {total} targets");

        let concurrency = self.max_concurrent.unwrap_or(total).max(1);

        let results: Vec<bool> = futures::stream::iter(targets)
            .map(|target| self.probe_one(target))
            .buffer_unordered(concurrency)
            .collect()
            .await;

        let recorded = results.into_iter().filter(|ok| *ok).count();
        debug!("tick complete: {recorded}/{total} records persisted");

        TickSummary {
            targets: total,
            recorded,
        }
    }

    /// Probe, classify and record a single target
    ///
    /// Returns whether the record was persisted. Any failure along the
    /// way is contained here.
    async fn probe_one(&self, target: TargetSnapshot) -> bool {
        let outcome = self.executor.probe(&target.url).await;

        if let Some(error) = &outcome.error {
            debug!("probe failed for target {} ({}): {error}", target.id, target.url);
        }

        let verdict = classify(&outcome);

        self.recorder.record(target.id, verdict, Utc::now()).await
    }
}

/// Handle for controlling a SchedulerActor
#[derive(Clone)]
pub struct SchedulerHandle {
    sender: mpsc::Sender<SchedulerCommand>,
}

impl SchedulerHandle {
    /// Spawn a new scheduler actor
    ///
    /// `interval` is the period between ticks, `timeout` the hard
    /// per-probe limit.
    pub fn spawn(
        storage: Arc<dyn StorageBackend>,
        interval: Duration,
        timeout: Duration,
        max_concurrent: Option<usize>,
    ) -> Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);

        let executor = ProbeExecutor::new(timeout)?;
        let actor = SchedulerActor::new(storage, executor, cmd_rx, interval, max_concurrent);

        tokio::spawn(actor.run());

        Ok(Self { sender: cmd_tx })
    }

    /// Trigger an immediate probe cycle and wait for its summary
    pub async fn tick_now(&self) -> Result<TickSummary> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(SchedulerCommand::TickNow { respond_to: tx })
            .await?;

        Ok(rx.await?)
    }

    /// Update the probe interval
    pub async fn update_interval(&self, interval_secs: u64) -> Result<()> {
        self.sender
            .send(SchedulerCommand::UpdateInterval { interval_secs })
            .await?;
        Ok(())
    }

    /// Shut down the scheduler, letting an in-flight tick finish
    pub async fn shutdown(self) {
        let _ = self.sender.send(SchedulerCommand::Shutdown).await;
    }
}
