use anyhow::Result;
use tokio_util::sync::CancellationToken;
use wxtrend_core::{AppError, Config, ConfigError, Units};
use wxtrend_telemetry::{Pipeline, PipelineView, RefreshScheduler, TickOutcome};
use wxtrend_weather::WeatherProvider;

#[tokio::main]
async fn main() -> Result<()> {
    wxtrend_core::init()?;

    let (config, _) = match Config::load_validated() {
        Ok(loaded) => loaded,
        Err(e) => {
            let err = match e.downcast::<ConfigError>() {
                Ok(config) => AppError::Config(config),
                Err(other) => AppError::Other(other),
            };
            eprintln!("{}\n{}", err.user_message(), err);
            return Err(err.into());
        }
    };

    let provider = WeatherProvider::new(&config.weather).map_err(|e| {
        let err = AppError::from(e);
        anyhow::anyhow!("{} ({})", err.user_message(), err)
    })?;
    let units = provider.units();

    tracing::info!(
        city = %config.weather.city,
        window_capacity = config.telemetry.window_capacity,
        "Starting weather trend monitor"
    );

    let pipeline = Pipeline::new(config.telemetry.window_capacity);
    let scheduler =
        RefreshScheduler::new(provider, pipeline, config.telemetry.refresh_interval());
    let reader = scheduler.reader();

    let cancel = CancellationToken::new();
    let (handle, mut outcomes) = scheduler.spawn(cancel.clone());

    println!("{} weather: live data", config.weather.city);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown requested");
                break;
            }
            outcome = outcomes.recv() => match outcome {
                Some(TickOutcome::Appended(view)) => render(&view, units),
                Some(TickOutcome::Failed(e)) => {
                    eprintln!("{}", e.user_message());
                    render(&reader.current(), units);
                }
                None => break,
            }
        }
    }

    cancel.cancel();
    if let Err(e) = handle.await {
        tracing::error!("Scheduler task ended abnormally: {}", e);
    }

    Ok(())
}

/// Plain-text rendering of the latest published state.
fn render(view: &PipelineView, units: Units) {
    let suffix = units.temperature_suffix();

    match &view.latest {
        Some(latest) => {
            println!();
            println!("Current temperature: {:.1} {}", latest.value, suffix);
            println!("Current date and time: {}", latest.display_timestamp());
        }
        None => {
            println!("No readings yet.");
            return;
        }
    }

    println!("Most recent readings:");
    let fitted = view.fit_line();
    for (i, obs) in view.snapshot.iter().enumerate() {
        match fitted.as_ref().and_then(|line| line.get(i)) {
            Some(trend) => println!(
                "  {}  {:>6.1} {}  (trend {:.1})",
                obs.display_timestamp(),
                obs.value,
                suffix,
                trend
            ),
            None => println!("  {}  {:>6.1} {}", obs.display_timestamp(), obs.value, suffix),
        }
    }

    match &view.fit {
        Ok(fit) => println!(
            "Trend: {} {:+.2} {} per reading",
            fit.direction(),
            fit.slope,
            suffix
        ),
        Err(e) => println!("Trend: {}", e.user_message()),
    }
}
