//! Window ownership and publication of derived state.
//!
//! The [`Pipeline`] is the only writer of the window. Every successful append
//! produces a fresh immutable [`PipelineView`] which is swapped into a shared
//! cell; any number of [`PipelineReader`]s clone the `Arc` out of that cell
//! without ever waiting on network I/O.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::error::{FetchError, TrendError};
use crate::observation::Observation;
use crate::scheduler::TickPhase;
use crate::trend::{self, Fit, TrendDirection};
use crate::window::ObservationWindow;

/// Everything the presentation layer needs from one refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineView {
    /// Window contents, oldest first
    pub snapshot: Vec<Observation>,
    /// Trend over `snapshot`, or why there is none
    pub fit: Result<Fit, TrendError>,
    pub latest: Option<Observation>,
    /// Failure from the most recent tick, cleared by the next success
    pub last_error: Option<FetchError>,
    /// When the snapshot was last recomputed
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for PipelineView {
    fn default() -> Self {
        Self {
            snapshot: Vec::new(),
            fit: Err(TrendError::InsufficientData { points: 0 }),
            latest: None,
            last_error: None,
            updated_at: None,
        }
    }
}

impl PipelineView {
    /// `latest` is the reading just recorded, whether or not the window kept it.
    fn compute(window: &ObservationWindow, latest: Observation) -> Self {
        let snapshot = window.snapshot();
        let fit = trend::fit_observations(&snapshot);
        Self {
            latest: Some(latest),
            snapshot,
            fit,
            last_error: None,
            updated_at: Some(Utc::now()),
        }
    }

    /// Fitted value at each snapshot index, if a trend exists
    pub fn fit_line(&self) -> Option<Vec<f64>> {
        self.fit.as_ref().ok().map(|f| f.line(self.snapshot.len()))
    }

    pub fn trend(&self) -> Option<TrendDirection> {
        self.fit.as_ref().ok().map(Fit::direction)
    }
}

#[derive(Debug)]
struct Shared {
    view: RwLock<Arc<PipelineView>>,
    phase: RwLock<TickPhase>,
}

/// Owns the observation window and publishes views of it.
#[derive(Debug)]
pub struct Pipeline {
    window: ObservationWindow,
    shared: Arc<Shared>,
}

impl Pipeline {
    pub fn new(capacity: usize) -> Self {
        Self {
            window: ObservationWindow::new(capacity),
            shared: Arc::new(Shared {
                view: RwLock::new(Arc::new(PipelineView::default())),
                phase: RwLock::new(TickPhase::Idle),
            }),
        }
    }

    pub fn reader(&self) -> PipelineReader {
        PipelineReader {
            shared: self.shared.clone(),
        }
    }

    pub fn window(&self) -> &ObservationWindow {
        &self.window
    }

    /// Append a reading, recompute the trend and publish the result.
    pub fn record(&mut self, obs: Observation) -> Arc<PipelineView> {
        self.window.append(obs);
        let view = Arc::new(PipelineView::compute(&self.window, obs));
        *self.shared.view.write() = view.clone();
        view
    }

    /// Note a failed fetch on the published view without touching the window.
    pub fn record_failure(&mut self, error: FetchError) -> Arc<PipelineView> {
        let mut guard = self.shared.view.write();
        let mut view = PipelineView::clone(&guard);
        view.last_error = Some(error);
        let view = Arc::new(view);
        *guard = view.clone();
        view
    }

    pub(crate) fn set_phase(&self, phase: TickPhase) {
        let mut current = self.shared.phase.write();
        tracing::trace!("Tick phase {:?} -> {:?}", *current, phase);
        *current = phase;
    }
}

/// Read-only handle to the latest published state.
#[derive(Debug, Clone)]
pub struct PipelineReader {
    shared: Arc<Shared>,
}

impl PipelineReader {
    pub fn current(&self) -> Arc<PipelineView> {
        self.shared.view.read().clone()
    }

    pub fn latest(&self) -> Option<Observation> {
        self.current().latest
    }

    pub fn snapshot(&self) -> Vec<Observation> {
        self.current().snapshot.clone()
    }

    pub fn fit(&self) -> Result<Fit, TrendError> {
        self.current().fit
    }

    pub fn last_error(&self) -> Option<FetchError> {
        self.current().last_error.clone()
    }

    pub fn phase(&self) -> TickPhase {
        *self.shared.phase.read()
    }
}
