use async_trait::async_trait;
use ingest_core::{
    BatchSink, City, FetchError, IngestionCycle, OpenWeatherSource, StoreError, WeatherRecord,
};
use serde_json::json;
use std::{
    sync::{Arc, Mutex},
    time::Duration,
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

#[derive(Debug, Default)]
struct CollectingSink {
    rows: Mutex<Vec<WeatherRecord>>,
}

#[async_trait]
impl BatchSink for CollectingSink {
    async fn store(&self, batch: &[WeatherRecord]) -> Result<usize, StoreError> {
        self.rows.lock().unwrap().extend_from_slice(batch);
        Ok(batch.len())
    }
}

async fn mount_city(server: &MockServer, lat: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/data/3.0/onecall"))
        .and(query_param("lat", lat))
        .respond_with(response)
        .mount(server)
        .await;
}

#[tokio::test]
async fn provider_error_for_one_city_is_isolated() {
    let server = MockServer::start().await;

    mount_city(
        &server,
        "10",
        ResponseTemplate::new(200).set_body_json(json!({
            "current": {
                "temp": 20.5,
                "feels_like": 19.0,
                "humidity": 60,
                "wind_speed": 3.2,
                "wind_deg": 180,
                "clouds": 10,
                "weather": [{ "main": "Clear", "description": "clear sky" }]
            }
        })),
    )
    .await;
    mount_city(&server, "20", ResponseTemplate::new(500).set_body_string("upstream exploded")).await;
    mount_city(
        &server,
        "30",
        ResponseTemplate::new(200).set_body_json(json!({
            "current": { "temp": -3.0, "snow": { "1h": 1.25 } }
        })),
    )
    .await;

    let source = OpenWeatherSource::new(
        "KEY".to_string(),
        format!("{}/data/3.0/onecall", server.uri()),
        "metric".to_string(),
        Duration::from_secs(5),
    )
    .unwrap();
    let sink = Arc::new(CollectingSink::default());
    let cycle = IngestionCycle::new(Arc::new(source), sink.clone(), Duration::from_secs(5));

    let cities = vec![City::new("A", 10.0, 1.0), City::new("B", 20.0, 2.0), City::new("C", 30.0, 3.0)];
    let report = cycle.run(&cities).await;

    assert_eq!(report.stored_count, 2);
    assert_eq!(report.failed_cities.len(), 1);
    assert_eq!(
        report.failed_cities["B"],
        FetchError::Provider { status: 500, body: "upstream exploded".into() }
    );
    assert!(report.store_error.is_none());

    let rows = sink.rows.lock().unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.captured_at == report.captured_at));

    let a = rows.iter().find(|r| r.city == "A").unwrap();
    assert_eq!(a.weather_description.as_deref(), Some("clear sky"));
    assert_eq!(a.snow_1h, 0.0);

    let c = rows.iter().find(|r| r.city == "C").unwrap();
    assert_eq!(c.temperature, Some(-3.0));
    assert_eq!(c.snow_1h, 1.25);
    assert_eq!(c.weather_main, None);
    assert_eq!(c.raw["current"]["snow"]["1h"], 1.25);
}

#[tokio::test]
async fn unreachable_provider_fails_every_city_without_storing() {
    // Nothing listens on the discard port.
    let source = OpenWeatherSource::new(
        "KEY".to_string(),
        "http://127.0.0.1:9/onecall".to_string(),
        "metric".to_string(),
        Duration::from_secs(2),
    )
    .unwrap();
    let sink = Arc::new(CollectingSink::default());
    let cycle = IngestionCycle::new(Arc::new(source), sink.clone(), Duration::from_secs(2));

    let cities = vec![City::new("A", 1.0, 1.0), City::new("B", 2.0, 2.0)];
    let report = cycle.run(&cities).await;

    assert_eq!(report.stored_count, 0);
    assert_eq!(report.failed_cities.len(), 2);
    assert!(report.failed_cities.values().all(|e| matches!(e, FetchError::Transport(_))));
    assert!(sink.rows.lock().unwrap().is_empty());
}
