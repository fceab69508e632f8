//! Name-keyed lookup over a CWB `weatherElement` array.

use chrono::{DateTime, NaiveDateTime};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Structural problems in an otherwise parseable datastore payload.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ElementError {
    #[error("response contained no location entries")]
    NoLocation,

    #[error("required weather element '{0}' is missing")]
    Missing(String),

    #[error("weather element '{0}' has no forecast time slots")]
    NoTimeSlot(String),

    #[error("weather element '{element}' has unusable value '{value}'")]
    InvalidValue { element: String, value: String },

    #[error("unrecognised observation time '{0}'")]
    InvalidTime(String),
}

/// Elements picked out of the source array by name, built once per response.
#[derive(Debug)]
pub struct ElementTable<V> {
    entries: HashMap<String, V>,
}

impl<V> ElementTable<V> {
    /// Keep only entries whose name is in `wanted`. On duplicate names the first one wins.
    pub fn collect<I>(elements: I, wanted: &[&str]) -> Self
    where
        I: IntoIterator<Item = (String, V)>,
    {
        let mut entries = HashMap::with_capacity(wanted.len());
        for (name, value) in elements {
            if wanted.contains(&name.as_str()) {
                entries.entry(name).or_insert(value);
            }
        }
        Self { entries }
    }

    pub fn require(&self, name: &str) -> Result<&V, ElementError> {
        self.entries.get(name).ok_or_else(|| ElementError::Missing(name.to_string()))
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Read a value the API may send either as a JSON number or a numeric string.
pub fn numeric(element: &str, value: &Value) -> Result<f64, ElementError> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    parsed.filter(|v| v.is_finite()).ok_or_else(|| ElementError::InvalidValue {
        element: element.to_string(),
        value: value.to_string(),
    })
}

/// Parse a whole-number string such as `"02"` or `"20"`.
pub fn small_integer(element: &str, raw: &str) -> Result<u8, ElementError> {
    raw.trim().parse::<u8>().map_err(|_| ElementError::InvalidValue {
        element: element.to_string(),
        value: raw.to_string(),
    })
}

/// `obsTime` is station-local, normally `2021-06-01 13:40:00`.
pub fn observation_time(raw: &str) -> Result<NaiveDateTime, ElementError> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.naive_local()))
        .map_err(|_| ElementError::InvalidTime(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table() -> ElementTable<Value> {
        let raw = vec![
            ("HUMD".to_string(), json!("0.8")),
            ("TEMP".to_string(), json!("23.5")),
            ("WDSD".to_string(), json!(2.1)),
            ("TEMP".to_string(), json!("99")),
        ];
        ElementTable::collect(raw, &["WDSD", "TEMP"])
    }

    #[test]
    fn collect_discards_unwanted_elements() {
        let table = table();

        assert_eq!(table.len(), 2);
        assert!(matches!(table.require("HUMD"), Err(ElementError::Missing(name)) if name == "HUMD"));
    }

    #[test]
    fn first_duplicate_wins() {
        assert_eq!(table().require("TEMP").unwrap(), &json!("23.5"));
    }

    #[test]
    fn numeric_accepts_numbers_and_strings() {
        assert_eq!(numeric("TEMP", &json!("23.5")).unwrap(), 23.5);
        assert_eq!(numeric("WDSD", &json!(2.1)).unwrap(), 2.1);
    }

    #[test]
    fn numeric_rejects_non_numbers() {
        let err = numeric("TEMP", &json!("n/a")).unwrap_err();
        assert!(matches!(err, ElementError::InvalidValue { element, .. } if element == "TEMP"));
        assert!(numeric("TEMP", &json!(null)).is_err());
    }

    #[test]
    fn small_integer_strips_leading_zero() {
        assert_eq!(small_integer("Wx", "02").unwrap(), 2);
        assert!(small_integer("PoP", "-1").is_err());
    }

    #[test]
    fn observation_time_formats() {
        let plain = observation_time("2021-06-01 13:40:00").unwrap();
        let rfc = observation_time("2021-06-01T13:40:00+08:00").unwrap();

        assert_eq!(plain, rfc);
        assert!(matches!(observation_time("yesterday"), Err(ElementError::InvalidTime(_))));
    }
}
