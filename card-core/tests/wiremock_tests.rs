//! Fetcher and aggregator tests against a mock CWB datastore.

use std::{sync::Arc, time::Duration};

use card_core::{
    CurrentConditionsFetcher, CurrentConditionsSource, Endpoint, ForecastFetcher, ForecastSource,
    RefreshPhase, ViewModelAggregator,
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

const KEY: &str = "CWB-TEST-KEY";

fn endpoint(server: &MockServer, location: &str) -> Endpoint {
    Endpoint {
        base_url: server.uri(),
        authorization: KEY.to_string(),
        location_name: location.to_string(),
    }
}

fn observation_response(elements: serde_json::Value) -> serde_json::Value {
    serde_json::json!({
        "success": "true",
        "result": { "resource_id": "O-A0003-001" },
        "records": {
            "location": [{
                "lat": "25.037658",
                "lon": "121.514853",
                "locationName": "Taipei",
                "stationId": "466920",
                "time": { "obsTime": "2021-06-01 13:40:00" },
                "weatherElement": elements,
                "parameter": [{ "parameterName": "CITY", "parameterValue": "臺北市" }]
            }]
        }
    })
}

fn slot(start: &str, name: &str, value: Option<&str>) -> serde_json::Value {
    serde_json::json!({
        "startTime": start,
        "endTime": "2021-06-02 06:00:00",
        "parameter": { "parameterName": name, "parameterValue": value }
    })
}

fn forecast_response() -> serde_json::Value {
    serde_json::json!({
        "success": "true",
        "records": {
            "datasetDescription": "三十六小時天氣預報",
            "location": [{
                "locationName": "臺北市",
                "weatherElement": [
                    {
                        "elementName": "Wx",
                        "time": [
                            slot("2021-06-01 12:00:00", "Cloudy", Some("02")),
                            slot("2021-06-01 18:00:00", "Thunderstorms", Some("15"))
                        ]
                    },
                    {
                        "elementName": "PoP",
                        "time": [
                            slot("2021-06-01 12:00:00", "20", None),
                            slot("2021-06-01 18:00:00", "90", None)
                        ]
                    },
                    {
                        "elementName": "MinT",
                        "time": [slot("2021-06-01 12:00:00", "26", None)]
                    },
                    {
                        "elementName": "CI",
                        "time": [
                            slot("2021-06-01 12:00:00", "Comfortable", None),
                            slot("2021-06-01 18:00:00", "Muggy", None)
                        ]
                    }
                ]
            }]
        }
    })
}

async fn mount_observation(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/O-A0003-001"))
        .and(query_param("Authorization", KEY))
        .and(query_param("locationName", "臺北"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_forecast(server: &MockServer, status: u16, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/F-C0032-001"))
        .and(query_param("Authorization", KEY))
        .and(query_param("locationName", "臺北市"))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

// =============================================================================
// Current conditions
// =============================================================================

#[tokio::test]
async fn current_conditions_picks_elements_by_name() {
    let server = MockServer::start().await;
    mount_observation(
        &server,
        observation_response(serde_json::json!([
            { "elementName": "WDSD", "elementValue": "2.1" },
            { "elementName": "HUMD", "elementValue": "0.72" },
            { "elementName": "TEMP", "elementValue": "23.5" }
        ])),
    )
    .await;

    let fetcher = CurrentConditionsFetcher::new(endpoint(&server, "臺北")).unwrap();
    let record = fetcher.fetch().await.expect("observation parses");

    assert_eq!(record.location_name, "Taipei");
    assert_eq!(record.temperature, 23.5);
    assert_eq!(record.wind_speed, 2.1);
    assert_eq!(record.observation_time.to_string(), "2021-06-01 13:40:00");
}

#[tokio::test]
async fn current_conditions_ignores_element_order() {
    let server = MockServer::start().await;
    mount_observation(
        &server,
        observation_response(serde_json::json!([
            { "elementName": "TEMP", "elementValue": 23.5 },
            { "elementName": "WDIR", "elementValue": 240 },
            { "elementName": "WDSD", "elementValue": 2.1 }
        ])),
    )
    .await;

    let record = CurrentConditionsFetcher::new(endpoint(&server, "臺北"))
        .unwrap()
        .fetch()
        .await
        .expect("observation parses");

    assert_eq!(record.temperature, 23.5);
    assert_eq!(record.wind_speed, 2.1);
}

#[tokio::test]
async fn current_conditions_missing_wind_speed_fails() {
    let server = MockServer::start().await;
    mount_observation(
        &server,
        observation_response(serde_json::json!([
            { "elementName": "TEMP", "elementValue": "23.5" }
        ])),
    )
    .await;

    let err = CurrentConditionsFetcher::new(endpoint(&server, "臺北"))
        .unwrap()
        .fetch()
        .await
        .unwrap_err();

    assert!(err.to_string().contains("'WDSD' is missing"));
}

#[tokio::test]
async fn current_conditions_rejects_non_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/O-A0003-001"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let err = CurrentConditionsFetcher::new(endpoint(&server, "臺北"))
        .unwrap()
        .fetch()
        .await
        .unwrap_err();

    assert!(err.to_string().contains("Failed to parse CWB O-A0003-001 JSON"));
}

#[tokio::test]
async fn current_conditions_times_out_on_slow_station() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/O-A0003-001"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(observation_response(serde_json::json!([])))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let fetcher =
        CurrentConditionsFetcher::with_timeout(endpoint(&server, "臺北"), Duration::from_millis(200))
            .unwrap();
    let err = fetcher.fetch().await.unwrap_err();

    assert!(err.to_string().contains("Failed to send request to CWB (O-A0003-001)"));
}

// =============================================================================
// Forecast
// =============================================================================

#[tokio::test]
async fn forecast_uses_first_time_slot_only() {
    let server = MockServer::start().await;
    mount_forecast(&server, 200, forecast_response()).await;

    let record = ForecastFetcher::new(endpoint(&server, "臺北市"))
        .unwrap()
        .fetch()
        .await
        .expect("forecast parses");

    assert_eq!(record.description, "Cloudy");
    assert_eq!(record.weather_code, 2);
    assert_eq!(record.rain_possibility, 20);
    assert_eq!(record.comfortability, "Comfortable");
}

#[tokio::test]
async fn forecast_reports_http_status() {
    let server = MockServer::start().await;
    mount_forecast(
        &server,
        401,
        serde_json::json!({ "message": "Unauthorized" }),
    )
    .await;

    let fetcher = ForecastFetcher::new(endpoint(&server, "臺北市")).unwrap();
    let err = fetcher.fetch().await.unwrap_err();
    let msg = err.to_string();

    assert!(msg.contains("F-C0032-001 request failed with status 401"));
    assert!(msg.contains("Unauthorized"));
}

// =============================================================================
// Full refresh cycle
// =============================================================================

#[tokio::test]
async fn refresh_builds_the_view_model_end_to_end() {
    let server = MockServer::start().await;
    mount_observation(
        &server,
        observation_response(serde_json::json!([
            { "elementName": "TEMP", "elementValue": "23.5" },
            { "elementName": "WDSD", "elementValue": "2.1" }
        ])),
    )
    .await;
    mount_forecast(&server, 200, forecast_response()).await;

    let current: Arc<dyn CurrentConditionsSource> =
        Arc::new(CurrentConditionsFetcher::new(endpoint(&server, "臺北")).unwrap());
    let forecast: Arc<dyn ForecastSource> =
        Arc::new(ForecastFetcher::new(endpoint(&server, "臺北市")).unwrap());
    let agg = ViewModelAggregator::new(current, forecast);

    agg.refresh().await.expect("refresh succeeds");
    let state = agg.snapshot();

    assert_eq!(state.phase, RefreshPhase::Idle);
    let json = serde_json::to_value(&state.view).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "observationTime": "2021-06-01T13:40:00",
            "locationName": "Taipei",
            "temperature": 23.5,
            "windSpeed": 2.1,
            "description": "Cloudy",
            "weatherCode": 2,
            "rainPossibility": 20,
            "comfortability": "Comfortable",
            "isLoading": false,
        })
    );
}

#[tokio::test]
async fn refresh_fails_when_one_endpoint_fails() {
    let server = MockServer::start().await;
    mount_observation(
        &server,
        observation_response(serde_json::json!([
            { "elementName": "TEMP", "elementValue": "23.5" },
            { "elementName": "WDSD", "elementValue": "2.1" }
        ])),
    )
    .await;
    mount_forecast(&server, 503, serde_json::json!({ "message": "busy" })).await;

    let agg = ViewModelAggregator::new(
        Arc::new(CurrentConditionsFetcher::new(endpoint(&server, "臺北")).unwrap()),
        Arc::new(ForecastFetcher::new(endpoint(&server, "臺北市")).unwrap()),
    );

    assert!(agg.refresh().await.is_err());

    let state = agg.snapshot();
    assert!(!state.is_loading());
    assert!(state.view.observation.location_name.is_empty(), "placeholder view is kept");
    assert!(matches!(state.phase, RefreshPhase::Failed { .. }));
}
