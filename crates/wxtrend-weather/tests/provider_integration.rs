//! Integration tests for WeatherProvider against a mock OpenWeatherMap server.

use std::time::Duration;

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use wxtrend_core::{ApiKey, Units, WeatherConfig};
use wxtrend_telemetry::{FetchError, ObservationSource, Pipeline, RefreshScheduler};
use wxtrend_weather::{RetryPolicy, WeatherError, WeatherProvider};

fn config_for(server: &MockServer) -> WeatherConfig {
    WeatherConfig {
        city: "Kansas City".to_string(),
        units: Units::Metric,
        api_key: ApiKey::new("test-key"),
        base_url: server.uri(),
        request_timeout_seconds: 5,
    }
}

fn fast_retry(max_retries: u32) -> RetryPolicy {
    RetryPolicy {
        max_retries,
        initial_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(5),
    }
}

fn weather_body(temp: f64) -> serde_json::Value {
    serde_json::json!({
        "coord": {"lon": -94.5786, "lat": 39.0997},
        "weather": [{"id": 800, "main": "Clear"}],
        "main": {"temp": temp, "feels_like": temp - 1.0, "humidity": 52},
        "dt": 1730556300,
        "name": "Kansas City"
    })
}

#[tokio::test]
async fn test_fetch_current_success() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("q", "Kansas City"))
        .and(query_param("appid", "test-key"))
        .and(query_param("units", "metric"))
        .respond_with(ResponseTemplate::new(200).set_body_json(weather_body(18.4)))
        .expect(1)
        .mount(&server)
        .await;

    let provider = WeatherProvider::new(&config_for(&server)).unwrap();
    let reading = provider.fetch_current().await.unwrap();

    assert_eq!(reading.temperature, 18.4);
    assert_eq!(reading.city.as_deref(), Some("Kansas City"));
    assert!(reading.coordinates.is_some());
}

#[tokio::test]
async fn test_observation_source_uses_temperature() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(weather_body(-3.5)))
        .mount(&server)
        .await;

    let provider = WeatherProvider::new(&config_for(&server)).unwrap();
    let before = chrono::Utc::now();
    let obs = provider.fetch().await.unwrap();

    assert_eq!(obs.value, -3.5);
    assert!(obs.timestamp >= before);
}

#[tokio::test]
async fn test_missing_temperature_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"name": "Kansas City"})),
        )
        .mount(&server)
        .await;

    let provider = WeatherProvider::new(&config_for(&server)).unwrap();
    let err = provider.fetch().await.unwrap_err();

    assert!(matches!(err, FetchError::MalformedResponse(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_non_json_body_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let provider = WeatherProvider::new(&config_for(&server)).unwrap();
    let err = provider.fetch_current().await.unwrap_err();

    assert!(matches!(err, WeatherError::Parse(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_unauthorized_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "cod": 401,
            "message": "Invalid API key"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = WeatherProvider::new(&config_for(&server))
        .unwrap()
        .with_retry(fast_retry(3));
    let err = provider.fetch_current().await.unwrap_err();

    assert!(matches!(err, WeatherError::Unauthorized));
    assert!(matches!(FetchError::from(err), FetchError::SourceUnavailable(_)));
}

#[tokio::test]
async fn test_unknown_city() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "cod": "404",
            "message": "city not found"
        })))
        .mount(&server)
        .await;

    let provider = WeatherProvider::new(&config_for(&server)).unwrap();
    let err = provider.fetch_current().await.unwrap_err();

    assert!(matches!(err, WeatherError::CityNotFound(ref c) if c == "Kansas City"));
}

#[tokio::test]
async fn test_server_error_retried_then_reported() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .expect(3)
        .mount(&server)
        .await;

    let provider = WeatherProvider::new(&config_for(&server))
        .unwrap()
        .with_retry(fast_retry(2));
    let err = provider.fetch_current().await.unwrap_err();

    match err {
        WeatherError::Status { status, ref body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "maintenance");
        }
        other => panic!("expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_server_error_recovers_on_retry() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(weather_body(12.0)))
        .mount(&server)
        .await;

    let provider = WeatherProvider::new(&config_for(&server))
        .unwrap()
        .with_retry(fast_retry(2));
    let reading = provider.fetch_current().await.unwrap();

    assert_eq!(reading.temperature, 12.0);
}

#[tokio::test]
async fn test_unreachable_server_is_unavailable() {
    let server = MockServer::start().await;
    let config = config_for(&server);
    drop(server);

    let provider = WeatherProvider::new(&config)
        .unwrap()
        .with_retry(RetryPolicy::none());
    let err = provider.fetch().await.unwrap_err();

    match err {
        FetchError::SourceUnavailable(msg) => assert!(!msg.contains("test-key"), "{}", msg),
        other => panic!("expected unavailable, got {:?}", other),
    }
}

#[tokio::test]
async fn test_scheduler_skips_failed_fetch() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(weather_body(20.0)))
        .up_to_n_times(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"main": {}})))
        .mount(&server)
        .await;

    let provider = WeatherProvider::new(&config_for(&server))
        .unwrap()
        .with_retry(RetryPolicy::none());
    let mut scheduler = RefreshScheduler::new(provider, Pipeline::new(5), Duration::from_secs(900));
    let reader = scheduler.reader();

    assert!(scheduler.tick().await.is_appended());
    assert!(scheduler.tick().await.is_appended());
    assert!(!scheduler.tick().await.is_appended());

    let view = reader.current();
    assert_eq!(view.snapshot.len(), 2);
    assert_eq!(view.fit.map(|f| f.slope), Ok(0.0));
    assert!(matches!(view.last_error, Some(FetchError::MalformedResponse(_))));
}
