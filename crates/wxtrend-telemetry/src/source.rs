use std::future::Future;

use crate::error::FetchError;
use crate::observation::Observation;

/// Something that can produce the current reading on demand.
///
/// Implementations may block on I/O and may fail; they never retain state
/// that the pipeline depends on.
pub trait ObservationSource: Send + Sync {
    fn fetch(&self) -> impl Future<Output = Result<Observation, FetchError>> + Send;
}
