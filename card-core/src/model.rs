use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Live observation for one station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationRecord {
    /// Station-local time of the reading.
    pub observation_time: NaiveDateTime,
    pub location_name: String,
    /// Degrees Celsius.
    pub temperature: f64,
    /// Metres per second.
    pub wind_speed: f64,
}

/// Soonest forecast slot for one region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastRecord {
    pub description: String,
    pub weather_code: u8,
    /// Probability of precipitation, 0-100.
    pub rain_possibility: u8,
    pub comfortability: String,
}

/// Everything the card displays.
///
/// Serialises flat, with both records' fields side by side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewModel {
    #[serde(flatten)]
    pub observation: ObservationRecord,
    #[serde(flatten)]
    pub forecast: ForecastRecord,
    pub is_loading: bool,
}

impl ViewModel {
    /// Startup value shown before the first fetch completes.
    pub fn placeholder() -> Self {
        Self {
            observation: ObservationRecord {
                observation_time: Local::now().naive_local(),
                location_name: String::new(),
                temperature: 0.0,
                wind_speed: 0.0,
            },
            forecast: ForecastRecord {
                description: String::new(),
                weather_code: 0,
                rain_possibility: 0,
                comfortability: String::new(),
            },
            is_loading: true,
        }
    }

    /// Combine a finished fetch cycle into a loaded view.
    pub fn merge(observation: ObservationRecord, forecast: ForecastRecord) -> Self {
        Self { observation, forecast, is_loading: false }
    }
}

/// Where the refresh cycle currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshPhase {
    Idle,
    Refreshing,
    /// Last cycle faulted; the view still holds the last good data.
    Failed { reason: String },
}

/// Snapshot published to the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetState {
    pub view: ViewModel,
    pub phase: RefreshPhase,
}

impl WidgetState {
    pub fn initial() -> Self {
        Self { view: ViewModel::placeholder(), phase: RefreshPhase::Refreshing }
    }

    pub fn is_loading(&self) -> bool {
        self.view.is_loading
    }
}
