use wxtrend_telemetry::{FetchError, Observation, ObservationSource};

use crate::provider::WeatherProvider;

/// Temperature of the configured city, stamped with the local receive time.
impl ObservationSource for WeatherProvider {
    async fn fetch(&self) -> Result<Observation, FetchError> {
        let reading = self.fetch_current().await?;
        Ok(Observation::new(reading.temperature, reading.fetched_at))
    }
}
