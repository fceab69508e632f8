use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::{
    config::{DEFAULT_TIMEOUT_SECS, Endpoint, FORECAST_DATASET},
    elements::{self, ElementError, ElementTable},
    model::ForecastRecord,
};

use super::{ForecastSource, get_datastore, http_client};

const WEATHER: &str = "Wx";
const RAIN_PROBABILITY: &str = "PoP";
const COMFORT_INDEX: &str = "CI";

#[derive(Debug, Clone)]
pub struct ForecastFetcher {
    endpoint: Endpoint,
    http: Client,
}

impl ForecastFetcher {
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
struct FcResponse {
    records: FcRecords,
}

#[derive(Debug, Deserialize)]
struct FcRecords {
    location: Vec<FcLocation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FcLocation {
    weather_element: Vec<FcElement>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FcElement {
    element_name: String,
    #[serde(default)]
    time: Vec<FcTimeSlot>,
}

#[derive(Debug, Deserialize)]
struct FcTimeSlot {
    parameter: FcParameter,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FcParameter {
    parameter_name: String,
    parameter_value: Option<String>,
}

impl TryFrom<FcResponse> for ForecastRecord {
    type Error = ElementError;

    fn try_from(parsed: FcResponse) -> Result<Self, Self::Error> {
        let location = parsed.records.location.into_iter().next().ok_or(ElementError::NoLocation)?;

        // Only the soonest slot of each element is kept.
        let mut slots = Vec::new();
        for element in location.weather_element {
            if ![WEATHER, RAIN_PROBABILITY, COMFORT_INDEX].contains(&element.element_name.as_str()) {
                continue;
            }
            let parameter = element
                .time
                .into_iter()
                .next()
                .map(|slot| slot.parameter)
                .ok_or_else(|| ElementError::NoTimeSlot(element.element_name.clone()))?;
            slots.push((element.element_name, parameter));
        }
        let table = ElementTable::collect(slots, &[WEATHER, RAIN_PROBABILITY, COMFORT_INDEX]);

        let weather = table.require(WEATHER)?;
        let weather_code = weather
            .parameter_value
            .as_deref()
            .ok_or_else(|| ElementError::InvalidValue {
                element: WEATHER.to_string(),
                value: "null".to_string(),
            })
            .and_then(|raw| elements::small_integer(WEATHER, raw))?;

        let pop = &table.require(RAIN_PROBABILITY)?.parameter_name;
        let rain_possibility = elements::small_integer(RAIN_PROBABILITY, pop)?;
        if rain_possibility > 100 {
            return Err(ElementError::InvalidValue {
                element: RAIN_PROBABILITY.to_string(),
                value: pop.clone(),
            });
        }

        Ok(ForecastRecord {
            description: weather.parameter_name.clone(),
            weather_code,
            rain_possibility,
            comfortability: table.require(COMFORT_INDEX)?.parameter_name.clone(),
        })
    }
}

#[async_trait]
impl ForecastSource for ForecastFetcher {
    #[instrument(skip(self), fields(region = %self.endpoint.location_name))]
    async fn fetch(&self) -> Result<ForecastRecord> {
        let parsed: FcResponse = get_datastore(&self.http, &self.endpoint, FORECAST_DATASET).await?;
        let record = ForecastRecord::try_from(parsed)?;

        debug!(description = %record.description, pop = record.rain_possibility, "forecast parsed");
        Ok(record)
    }
}
