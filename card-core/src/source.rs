use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::{fmt::Debug, sync::Arc, time::Duration};
use tracing::debug;

use crate::{
    Config, ForecastRecord, ObservationRecord,
    config::Endpoint,
    source::{current::CurrentConditionsFetcher, forecast::ForecastFetcher},
};

pub mod current;
pub mod forecast;

#[async_trait]
pub trait CurrentConditionsSource: Send + Sync + Debug {
    async fn fetch(&self) -> anyhow::Result<ObservationRecord>;
}

#[async_trait]
pub trait ForecastSource: Send + Sync + Debug {
    async fn fetch(&self) -> anyhow::Result<ForecastRecord>;
}

/// Build both fetchers from config, sharing one HTTP client.
pub fn sources_from_config(
    config: &Config,
) -> Result<(Arc<dyn CurrentConditionsSource>, Arc<dyn ForecastSource>)> {
    let http = http_client(Duration::from_secs(config.timeout_secs))?;

    let current = CurrentConditionsFetcher::with_client(config.observation_endpoint()?, http.clone());
    let forecast = ForecastFetcher::with_client(config.forecast_endpoint()?, http);

    Ok((Arc::new(current), Arc::new(forecast)))
}

pub(crate) fn http_client(timeout: Duration) -> Result<Client> {
    Client::builder().timeout(timeout).build().context("Failed to build HTTP client")
}

/// GET one datastore resource and decode the body as `T`.
pub(crate) async fn get_datastore<T: DeserializeOwned>(
    http: &Client,
    endpoint: &Endpoint,
    dataset: &str,
) -> Result<T> {
    let url = endpoint.url(dataset);
    debug!(%url, location = %endpoint.location_name, "requesting datastore");

    let res = http
        .get(&url)
        .query(&[
            ("Authorization", endpoint.authorization.as_str()),
            ("locationName", endpoint.location_name.as_str()),
        ])
        .send()
        .await
        .with_context(|| format!("Failed to send request to CWB ({dataset})"))?;

    let status = res.status();
    let body = res
        .text()
        .await
        .with_context(|| format!("Failed to read CWB {dataset} response body"))?;

    if !status.is_success() {
        return Err(anyhow!(
            "CWB {} request failed with status {}: {}",
            dataset,
            status,
            truncate_body(&body),
        ));
    }

    debug!(%status, bytes = body.len(), "datastore response received");

    serde_json::from_str(&body).with_context(|| format!("Failed to parse CWB {dataset} JSON"))
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}
