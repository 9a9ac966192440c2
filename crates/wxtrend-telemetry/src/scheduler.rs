//! Periodic refresh loop.
//!
//! One tokio interval drives every tick. The fetch is awaited inside the
//! loop, so a slow source delays the next tick instead of overlapping it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::error::FetchError;
use crate::pipeline::{Pipeline, PipelineReader, PipelineView};
use crate::source::ObservationSource;

/// Default time between refreshes (15 minutes)
pub const DEFAULT_REFRESH_PERIOD: Duration = Duration::from_secs(900);

/// Shortest period the scheduler will run with
pub const MIN_REFRESH_PERIOD: Duration = Duration::from_secs(1);

const OUTCOME_CHANNEL_CAPACITY: usize = 16;

/// Where the scheduler is within a tick.
///
/// `Appended` and `Failed` describe the last finished tick and hold until the
/// next one starts fetching. `Idle` means no tick has run yet or the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickPhase {
    Idle,
    Fetching,
    Appended,
    Failed,
}

/// Result of a single tick
#[derive(Debug, Clone)]
pub enum TickOutcome {
    Appended(Arc<PipelineView>),
    Failed(FetchError),
}

impl TickOutcome {
    pub fn is_appended(&self) -> bool {
        matches!(self, Self::Appended(_))
    }
}

pub struct RefreshScheduler<S> {
    source: S,
    pipeline: Pipeline,
    period: Duration,
}

impl<S: ObservationSource> RefreshScheduler<S> {
    pub fn new(source: S, pipeline: Pipeline, period: Duration) -> Self {
        let period = if period < MIN_REFRESH_PERIOD {
            tracing::warn!(
                "Refresh period {:?} too short, using {:?}",
                period,
                MIN_REFRESH_PERIOD
            );
            MIN_REFRESH_PERIOD
        } else {
            period
        };

        Self {
            source,
            pipeline,
            period,
        }
    }

    pub fn reader(&self) -> PipelineReader {
        self.pipeline.reader()
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Fetch once and fold the result into the pipeline.
    ///
    /// A failed fetch leaves the window untouched.
    pub async fn tick(&mut self) -> TickOutcome {
        self.pipeline.set_phase(TickPhase::Fetching);

        match self.source.fetch().await {
            Ok(obs) => {
                let view = self.pipeline.record(obs);
                self.pipeline.set_phase(TickPhase::Appended);
                tracing::info!(
                    value = obs.value,
                    window_len = view.snapshot.len(),
                    "Recorded observation"
                );
                TickOutcome::Appended(view)
            }
            Err(e) => {
                tracing::warn!("Refresh failed, keeping last known readings: {}", e);
                self.pipeline.record_failure(e.clone());
                self.pipeline.set_phase(TickPhase::Failed);
                TickOutcome::Failed(e)
            }
        }
    }

    /// Tick immediately, then every `period`, until `cancel` fires.
    ///
    /// Outcomes are offered to `events` without waiting; a full or closed
    /// channel never stalls the loop.
    pub async fn run(mut self, cancel: CancellationToken, events: Option<mpsc::Sender<TickOutcome>>) {
        let mut events = events;
        let mut ticker = tokio::time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!("Refresh scheduler started (period {:?})", self.period);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let outcome = tokio::select! {
                _ = cancel.cancelled() => break,
                outcome = self.tick() => outcome,
            };

            if let Some(tx) = &events {
                match tx.try_send(outcome) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        tracing::debug!("Outcome channel full, dropping tick outcome");
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => {
                        tracing::debug!("Outcome receiver dropped");
                        events = None;
                    }
                }
            }
        }

        self.pipeline.set_phase(TickPhase::Idle);
        tracing::info!("Refresh scheduler stopped");
    }
}

impl<S: ObservationSource + 'static> RefreshScheduler<S> {
    /// Run on the current tokio runtime, returning a receiver of tick outcomes.
    pub fn spawn(self, cancel: CancellationToken) -> (JoinHandle<()>, mpsc::Receiver<TickOutcome>) {
        let (tx, rx) = mpsc::channel(OUTCOME_CHANNEL_CAPACITY);
        let handle = tokio::spawn(self.run(cancel, Some(tx)));
        (handle, rx)
    }
}
