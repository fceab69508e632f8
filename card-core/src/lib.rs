//! Core library for the `weather-card` terminal widget.
//!
//! This crate defines:
//! - Configuration (authorization key, station, region, theme)
//! - Fetchers for the CWB observation and forecast datastores
//! - The aggregator that joins both into one view model
//!
//! Presentation lives in `card-cli`; nothing here renders or prompts.

pub mod aggregator;
pub mod config;
pub mod elements;
pub mod model;
pub mod source;
pub mod theme;

pub use aggregator::ViewModelAggregator;
pub use config::{Config, Endpoint};
pub use elements::ElementError;
pub use model::{ForecastRecord, ObservationRecord, RefreshPhase, ViewModel, WidgetState};
pub use source::{
    CurrentConditionsSource, ForecastSource, current::CurrentConditionsFetcher,
    forecast::ForecastFetcher, sources_from_config,
};
pub use theme::{Palette, ThemeName};
