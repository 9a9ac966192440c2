//! Refresh-and-retention pipeline for wxtrend.
//!
//! A [`RefreshScheduler`] polls an [`ObservationSource`] on a fixed period,
//! appends each reading to a bounded [`ObservationWindow`], fits a linear
//! trend over the window and publishes the result for readers.

pub mod error;
pub mod observation;
pub mod pipeline;
pub mod scheduler;
pub mod source;
pub mod trend;
pub mod window;

pub use error::{FetchError, TrendError};
pub use observation::Observation;
pub use pipeline::{Pipeline, PipelineReader, PipelineView};
pub use scheduler::{RefreshScheduler, TickOutcome, TickPhase, DEFAULT_REFRESH_PERIOD};
pub use source::ObservationSource;
pub use trend::{fit, fit_observations, Fit, TrendDirection};
pub use window::{ObservationWindow, DEFAULT_WINDOW_CAPACITY};
