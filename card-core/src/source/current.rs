use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::{
    config::{DEFAULT_TIMEOUT_SECS, Endpoint, OBSERVATION_DATASET},
    elements::{self, ElementError, ElementTable},
    model::ObservationRecord,
};

use super::{CurrentConditionsSource, get_datastore, http_client};

const WIND_SPEED: &str = "WDSD";
const TEMPERATURE: &str = "TEMP";

#[derive(Debug, Clone)]
pub struct CurrentConditionsFetcher {
    endpoint: Endpoint,
    http: Client,
}

impl CurrentConditionsFetcher {
    /// Fetcher with its own client and the default request timeout.
    pub fn new(endpoint: Endpoint) -> Result<Self> {
        Self::with_timeout(endpoint, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(endpoint: Endpoint, timeout: Duration) -> Result<Self> {
        Ok(Self::with_client(endpoint, http_client(timeout)?))
    }

    pub fn with_client(endpoint: Endpoint, http: Client) -> Self {
        Self { endpoint, http }
    }
}

#[derive(Debug, Deserialize)]
struct ObsResponse {
    records: ObsRecords,
}

#[derive(Debug, Deserialize)]
struct ObsRecords {
    location: Vec<ObsLocation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObsLocation {
    location_name: String,
    time: ObsTime,
    weather_element: Vec<ObsElement>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObsTime {
    obs_time: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObsElement {
    element_name: String,
    #[serde(default)]
    element_value: Value,
}

impl TryFrom<ObsResponse> for ObservationRecord {
    type Error = ElementError;

    fn try_from(parsed: ObsResponse) -> Result<Self, Self::Error> {
        let location = parsed.records.location.into_iter().next().ok_or(ElementError::NoLocation)?;

        let table = ElementTable::collect(
            location.weather_element.into_iter().map(|e| (e.element_name, e.element_value)),
            &[WIND_SPEED, TEMPERATURE],
        );

        Ok(ObservationRecord {
            observation_time: elements::observation_time(&location.time.obs_time)?,
            location_name: location.location_name,
            temperature: elements::numeric(TEMPERATURE, table.require(TEMPERATURE)?)?,
            wind_speed: elements::numeric(WIND_SPEED, table.require(WIND_SPEED)?)?,
        })
    }
}

#[async_trait]
impl CurrentConditionsSource for CurrentConditionsFetcher {
    #[instrument(skip(self), fields(station = %self.endpoint.location_name))]
    async fn fetch(&self) -> Result<ObservationRecord> {
        let parsed: ObsResponse = get_datastore(&self.http, &self.endpoint, OBSERVATION_DATASET).await?;
        let record = ObservationRecord::try_from(parsed)?;

        debug!(temperature = record.temperature, wind_speed = record.wind_speed, "observation parsed");
        Ok(record)
    }
}
