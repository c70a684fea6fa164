/*
 *  forecast.rs
 *
 *  yrpaper - forecast to e-paper
 *	(c) 2020-26 Stuart Hunter
 *
 *	Forecast snapshot model and the Locationforecast 2.0 document reader
 *
 *	This program is free software: you can redistribute it and/or modify
 *	it under the terms of the GNU General Public License as published by
 *	the Free Software Foundation, either version 3 of the License, or
 *	(at your option) any later version.
 *
 *	This program is distributed in the hope that it will be useful,
 *	but WITHOUT ANY WARRANTY; without even the implied warranty of
 *	MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *	GNU General Public License for more details.
 *
 *	See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *	Public License.
 *
 */
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Number of hourly periods the precipitation diagram needs.
pub const MIN_PERIODS: usize = 12;

/// Reasons a forecast document is rejected before it becomes a snapshot.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("forecast document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("forecast document holds {available} periods, {required} required")]
    TooFewPeriods { required: usize, available: usize },
}

/// One time-indexed slice of forecast data.
///
/// Numeric values are kept as raw JSON so the normalizer can tell a missing
/// value from one that is present but not a number.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeriodRecord {
    /// Forecast offset, 0 is the current hour
    pub offset: usize,
    pub time: DateTime<Utc>,
    pub air_temperature: Option<Value>,
    pub wind_speed: Option<Value>,
    pub wind_speed_of_gust: Option<Value>,
    /// Degrees the wind blows from, 0 is north
    pub wind_from_direction: Option<Value>,
    /// Precipitation over the next hour
    pub precipitation_amount: Option<Value>,
    /// Upper bound of the next hour precipitation
    pub precipitation_amount_max: Option<Value>,
    pub probability_of_precipitation: Option<Value>,
    /// Next hour condition, e.g. "partlycloudy_day"
    pub symbol_code: Option<String>,
    pub air_temperature_max_6h: Option<Value>,
    pub symbol_code_6h: Option<String>,
    pub symbol_code_12h: Option<String>,
}

/// A validated forecast: ordered periods plus the issue time of the model run.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastSnapshot {
    pub updated_at: DateTime<Utc>,
    pub periods: Vec<PeriodRecord>,
}

impl ForecastSnapshot {
    /// Parse a Locationforecast document, rejecting it when it holds fewer
    /// than `min_periods` periods.
    pub fn from_json(body: &str, min_periods: usize) -> Result<Self, DocumentError> {
        let doc: MetDocument = serde_json::from_str(body)?;
        let periods: Vec<PeriodRecord> = doc
            .properties
            .timeseries
            .into_iter()
            .enumerate()
            .map(|(offset, step)| step.into_record(offset))
            .collect();

        if periods.len() < min_periods {
            return Err(DocumentError::TooFewPeriods {
                required: min_periods,
                available: periods.len(),
            });
        }

        Ok(Self {
            updated_at: doc.properties.meta.updated_at,
            periods,
        })
    }

    pub fn period(&self, offset: usize) -> Option<&PeriodRecord> {
        self.periods.get(offset)
    }

    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }
}

// wire format, https://api.met.no/weatherapi/locationforecast/2.0/documentation

#[derive(Debug, Deserialize)]
struct MetDocument {
    properties: MetProperties,
}

#[derive(Debug, Deserialize)]
struct MetProperties {
    meta: MetMeta,
    timeseries: Vec<MetStep>,
}

#[derive(Debug, Deserialize)]
struct MetMeta {
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct MetStep {
    time: DateTime<Utc>,
    data: MetData,
}

#[derive(Debug, Deserialize)]
struct MetData {
    instant: MetInstant,
    next_1_hours: Option<MetOutlook>,
    next_6_hours: Option<MetOutlook>,
    next_12_hours: Option<MetOutlook>,
}

#[derive(Debug, Deserialize)]
struct MetInstant {
    #[serde(default)]
    details: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct MetOutlook {
    summary: Option<MetSummary>,
    #[serde(default)]
    details: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct MetSummary {
    symbol_code: String,
}

impl MetOutlook {
    fn symbol_code(&self) -> Option<String> {
        self.summary.as_ref().map(|s| s.symbol_code.clone())
    }
}

impl MetStep {
    fn into_record(self, offset: usize) -> PeriodRecord {
        let MetData { instant, next_1_hours, next_6_hours, next_12_hours } = self.data;
        let mut details = instant.details;
        let mut record = PeriodRecord {
            offset,
            time: self.time,
            air_temperature: details.remove("air_temperature"),
            wind_speed: details.remove("wind_speed"),
            wind_speed_of_gust: details.remove("wind_speed_of_gust"),
            wind_from_direction: details.remove("wind_from_direction"),
            ..Default::default()
        };

        if let Some(mut hour) = next_1_hours {
            record.symbol_code = hour.symbol_code();
            record.precipitation_amount = hour.details.remove("precipitation_amount");
            record.precipitation_amount_max = hour.details.remove("precipitation_amount_max");
            record.probability_of_precipitation = hour.details.remove("probability_of_precipitation");
        }
        if let Some(mut six) = next_6_hours {
            record.symbol_code_6h = six.symbol_code();
            record.air_temperature_max_6h = six.details.remove("air_temperature_max");
        }
        if let Some(twelve) = next_12_hours {
            record.symbol_code_12h = twelve.symbol_code();
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn step(hour: u32, temp: Value) -> Value {
        json!({
            "time": format!("2026-10-19T{:02}:00:00Z", hour),
            "data": {
                "instant": { "details": { "air_temperature": temp, "wind_speed": 3.4, "wind_speed_of_gust": 7.1, "wind_from_direction": 225.0 } },
                "next_1_hours": {
                    "summary": { "symbol_code": "partlycloudy_day" },
                    "details": { "precipitation_amount": 0.4, "precipitation_amount_max": 1.2, "probability_of_precipitation": 40.0 }
                },
                "next_6_hours": {
                    "summary": { "symbol_code": "rain" },
                    "details": { "air_temperature_max": 9.3 }
                },
                "next_12_hours": { "summary": { "symbol_code": "cloudy" } }
            }
        })
    }

    fn document(steps: usize) -> String {
        let series: Vec<Value> = (0..steps).map(|h| step(h as u32, json!(7.2))).collect();
        json!({
            "type": "Feature",
            "properties": {
                "meta": { "updated_at": "2026-10-19T10:35:12Z", "units": {} },
                "timeseries": series
            }
        })
        .to_string()
    }

    #[test]
    fn test_parse_document() {
        let snapshot = ForecastSnapshot::from_json(&document(14), MIN_PERIODS).unwrap();
        assert_eq!(snapshot.len(), 14);

        let first = snapshot.period(0).unwrap();
        assert_eq!(first.offset, 0);
        assert_eq!(first.air_temperature, Some(json!(7.2)));
        assert_eq!(first.wind_from_direction, Some(json!(225.0)));
        assert_eq!(first.symbol_code.as_deref(), Some("partlycloudy_day"));
        assert_eq!(first.probability_of_precipitation, Some(json!(40.0)));
        assert_eq!(first.symbol_code_6h.as_deref(), Some("rain"));
        assert_eq!(first.air_temperature_max_6h, Some(json!(9.3)));
        assert_eq!(first.symbol_code_12h.as_deref(), Some("cloudy"));
        assert_eq!(snapshot.period(13).unwrap().offset, 13);
    }

    #[test]
    fn test_short_document_rejected() {
        match ForecastSnapshot::from_json(&document(5), MIN_PERIODS) {
            Err(DocumentError::TooFewPeriods { required, available }) => {
                assert_eq!(required, 12);
                assert_eq!(available, 5);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(matches!(
            ForecastSnapshot::from_json("<html>busy</html>", MIN_PERIODS),
            Err(DocumentError::Json(_))
        ));
    }

    #[test]
    fn test_non_numeric_value_survives_parsing() {
        let series: Vec<Value> = (0..12).map(|h| step(h, json!("warm"))).collect();
        let body = json!({
            "properties": { "meta": { "updated_at": "2026-10-19T10:35:12Z" }, "timeseries": series }
        })
        .to_string();
        let snapshot = ForecastSnapshot::from_json(&body, MIN_PERIODS).unwrap();
        assert_eq!(snapshot.periods[0].air_temperature, Some(json!("warm")));
    }
}
