/*
 *  normalize.rs
 *
 *  yrpaper - forecast to e-paper
 *	(c) 2020-26 Stuart Hunter
 *
 *	Derives the display-ready field set from a forecast snapshot
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
use serde_json::Value;
use thiserror::Error;

use crate::forecast::{ForecastSnapshot, PeriodRecord};
use crate::legend::LegendTable;

/// Hourly slots in the precipitation diagram.
pub const SERIES_LEN: usize = 12;

/// Precipitation ceiling in mm, keeps diagram bars inside their slot.
pub const PRECIP_CEILING: f64 = 4.0;

/// Period whose 6 hour outlook covers the 6..12 h window.
const SECOND_WINDOW: usize = 6;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum NormalizeError {
    #[error("forecast has {available} periods, {required} required")]
    MissingPeriod { required: usize, available: usize },
    #[error("field '{field}' of period {offset} is malformed: {detail}")]
    MalformedField {
        field: &'static str,
        offset: usize,
        detail: String,
    },
    #[error("unknown symbol code '{0}'")]
    UnknownSymbol(String),
}

/// Day/night/polar twilight flavour of a symbol code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    Day,
    Night,
    PolarTwilight,
}

impl Variant {
    pub fn suffix(&self) -> &'static str {
        match self {
            Variant::Day => "_day",
            Variant::Night => "_night",
            Variant::PolarTwilight => "_polartwilight",
        }
    }
}

// longest suffix first
const VARIANTS: [Variant; 3] = [Variant::PolarTwilight, Variant::Night, Variant::Day];

/// Split a symbol code into base code and variant, stripping at most one
/// exact suffix.
pub fn split_symbol(code: &str) -> (&str, Option<Variant>) {
    for variant in VARIANTS {
        if let Some(base) = code.strip_suffix(variant.suffix()) {
            if !base.is_empty() {
                return (base, Some(variant));
            }
        }
    }
    (code, None)
}

/// Base condition code of `code`, e.g. "partlycloudy_day" -> "partlycloudy".
///
/// Only one suffix goes per call, so this is idempotent for codes carrying
/// at most one variant suffix (all met.no emits). A stacked code such as
/// "fog_night_polartwilight" gives "fog_night" once and "fog" twice.
pub fn normalize_symbol(code: &str) -> &str {
    split_symbol(code).0
}

/// A normalized condition code plus the variant it arrived with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub code: String,
    pub variant: Option<Variant>,
}

impl Condition {
    pub fn parse(raw: &str) -> Self {
        let (base, variant) = split_symbol(raw.trim());
        Self { code: base.to_string(), variant }
    }

    /// Asset names to try for this condition's icon, most specific first.
    pub fn icon_names(&self) -> Vec<String> {
        match self.variant {
            Some(v) => vec![format!("{}{}", self.code, v.suffix()), self.code.clone()],
            None => vec![self.code.clone()],
        }
    }
}

/// Layout class of the current temperature.
///
/// The large digit glyph set has no minus sign that fits two digits, so
/// double digit frost is drawn as its magnitude plus a "BELOW ZERO" marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemperatureBand {
    /// -9..=9
    Signed(i32),
    /// 10 and above
    Positive(u32),
    /// -10 and below, holds the absolute value
    BelowZero(u32),
}

impl TemperatureBand {
    pub fn classify(temperature: i32) -> Self {
        if temperature >= 10 {
            TemperatureBand::Positive(temperature as u32)
        } else if temperature <= -10 {
            TemperatureBand::BelowZero(temperature.unsigned_abs())
        } else {
            TemperatureBand::Signed(temperature)
        }
    }

    /// Digits drawn with the large glyph set, never includes a sign.
    pub fn digits(&self) -> String {
        match self {
            TemperatureBand::Signed(t) => t.unsigned_abs().to_string(),
            TemperatureBand::Positive(t) | TemperatureBand::BelowZero(t) => t.to_string(),
        }
    }

    /// Single digit below zero, the only band that draws a minus bar.
    pub fn needs_minus(&self) -> bool {
        matches!(self, TemperatureBand::Signed(t) if *t < 0)
    }

    pub fn below_zero_marker(&self) -> bool {
        matches!(self, TemperatureBand::BelowZero(_))
    }
}

/// Eight point compass, the direction the wind blows from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompassPoint {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl CompassPoint {
    const ALL: [CompassPoint; 8] = [
        CompassPoint::North,
        CompassPoint::NorthEast,
        CompassPoint::East,
        CompassPoint::SouthEast,
        CompassPoint::South,
        CompassPoint::SouthWest,
        CompassPoint::West,
        CompassPoint::NorthWest,
    ];

    /// Nearest point of a bearing in degrees, any value wraps.
    pub fn from_degrees(degrees: f64) -> Self {
        let sector = ((degrees.rem_euclid(360.0) + 22.5) / 45.0) as usize % 8;
        Self::ALL[sector]
    }

    pub fn label(&self) -> &'static str {
        match self {
            CompassPoint::North => "N",
            CompassPoint::NorthEast => "NE",
            CompassPoint::East => "E",
            CompassPoint::SouthEast => "SE",
            CompassPoint::South => "S",
            CompassPoint::SouthWest => "SW",
            CompassPoint::West => "W",
            CompassPoint::NorthWest => "NW",
        }
    }
}

/// Everything the renderer needs for one cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedFields {
    pub updated_at: DateTime<Utc>,
    pub temperature: i32,
    pub band: TemperatureBand,
    pub temperature_6h: i32,
    pub temperature_12h: i32,
    pub condition: Condition,
    pub condition_6h: Condition,
    pub condition_12h: Condition,
    pub description: String,
    pub precipitation_chance: u8,
    pub wind_speed: i32,
    pub wind_gust: i32,
    /// None when the forecast leaves the direction out
    pub wind_direction: Option<CompassPoint>,
    pub precipitation: [f64; SERIES_LEN],
    pub precipitation_max: [f64; SERIES_LEN],
}

pub fn clamp_precipitation(value: f64) -> f64 {
    value.min(PRECIP_CEILING)
}

fn as_number(value: &Value, field: &'static str, offset: usize) -> Result<f64, NormalizeError> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(NormalizeError::MalformedField {
            field,
            offset,
            detail: format!("'{}' is not a number", value),
        }),
    }
}

fn required(value: Option<&Value>, field: &'static str, offset: usize) -> Result<f64, NormalizeError> {
    match value {
        Some(v) => as_number(v, field, offset),
        None => Err(NormalizeError::MalformedField {
            field,
            offset,
            detail: "missing".to_string(),
        }),
    }
}

fn optional(value: Option<&Value>, field: &'static str, offset: usize) -> Result<Option<f64>, NormalizeError> {
    value.map(|v| as_number(v, field, offset)).transpose()
}

fn symbol<'a>(value: Option<&'a String>, field: &'static str, offset: usize) -> Result<&'a str, NormalizeError> {
    value
        .map(String::as_str)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| NormalizeError::MalformedField {
            field,
            offset,
            detail: "missing".to_string(),
        })
}

fn round(v: f64) -> i32 {
    v.round() as i32
}

/// Derive the display fields of a snapshot. Pure; touches neither input.
pub fn normalize(snapshot: &ForecastSnapshot, legend: &LegendTable) -> Result<NormalizedFields, NormalizeError> {
    if snapshot.len() < SERIES_LEN {
        return Err(NormalizeError::MissingPeriod {
            required: SERIES_LEN,
            available: snapshot.len(),
        });
    }
    let now: &PeriodRecord = &snapshot.periods[0];
    let later: &PeriodRecord = &snapshot.periods[SECOND_WINDOW];

    let temperature = round(required(now.air_temperature.as_ref(), "air_temperature", now.offset)?);
    let wind_speed = required(now.wind_speed.as_ref(), "wind_speed", now.offset)?;
    let wind_gust = optional(now.wind_speed_of_gust.as_ref(), "wind_speed_of_gust", now.offset)?
        .unwrap_or(wind_speed);
    let wind_direction = optional(now.wind_from_direction.as_ref(), "wind_from_direction", now.offset)?
        .map(CompassPoint::from_degrees);
    let chance = required(
        now.probability_of_precipitation.as_ref(),
        "probability_of_precipitation",
        now.offset,
    )?;

    let temperature_6h = round(required(now.air_temperature_max_6h.as_ref(), "air_temperature_max", now.offset)?);
    let temperature_12h = round(required(later.air_temperature_max_6h.as_ref(), "air_temperature_max", later.offset)?);

    let condition = Condition::parse(symbol(now.symbol_code.as_ref(), "symbol_code", now.offset)?);
    let condition_6h = Condition::parse(symbol(now.symbol_code_6h.as_ref(), "symbol_code", now.offset)?);
    let condition_12h = match later.symbol_code_6h.as_ref() {
        Some(code) => Condition::parse(symbol(Some(code), "symbol_code", later.offset)?),
        None => Condition::parse(symbol(now.symbol_code_12h.as_ref(), "symbol_code", now.offset)?),
    };

    let description = legend.describe(&condition.code)?.to_string();
    legend.describe(&condition_6h.code)?;
    legend.describe(&condition_12h.code)?;

    let mut precipitation = [0.0; SERIES_LEN];
    let mut precipitation_max = [0.0; SERIES_LEN];
    for (slot, period) in snapshot.periods.iter().take(SERIES_LEN).enumerate() {
        let amount = optional(period.precipitation_amount.as_ref(), "precipitation_amount", period.offset)?
            .unwrap_or(0.0);
        let amount_max = optional(period.precipitation_amount_max.as_ref(), "precipitation_amount_max", period.offset)?
            .unwrap_or(0.0);
        precipitation[slot] = clamp_precipitation(amount);
        precipitation_max[slot] = clamp_precipitation(amount_max);
    }

    Ok(NormalizedFields {
        updated_at: snapshot.updated_at,
        temperature,
        band: TemperatureBand::classify(temperature),
        temperature_6h,
        temperature_12h,
        condition,
        condition_6h,
        condition_12h,
        description,
        precipitation_chance: chance.round().clamp(0.0, 100.0) as u8,
        wind_speed: round(wind_speed),
        wind_gust: round(wind_gust),
        wind_direction,
        precipitation,
        precipitation_max,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn legend() -> LegendTable {
        LegendTable::from_entries([
            ("partlycloudy", "Partly cloudy"),
            ("rain", "Rain"),
            ("cloudy", "Cloudy"),
            ("clearsky", "Clear sky"),
        ])
    }

    fn snapshot(periods: usize) -> ForecastSnapshot {
        let periods = (0..periods)
            .map(|offset| PeriodRecord {
                offset,
                air_temperature: Some(json!(7.4)),
                wind_speed: Some(json!(3.4)),
                wind_speed_of_gust: Some(json!(7.6)),
                wind_from_direction: Some(json!(208.0)),
                precipitation_amount: Some(json!(offset as f64 * 0.5)),
                precipitation_amount_max: Some(json!(offset as f64)),
                probability_of_precipitation: Some(json!(40.0)),
                symbol_code: Some("partlycloudy_day".to_string()),
                air_temperature_max_6h: Some(json!(9.5 + offset as f64)),
                symbol_code_6h: Some("rain".to_string()),
                symbol_code_12h: Some("cloudy".to_string()),
                ..Default::default()
            })
            .collect();
        ForecastSnapshot { updated_at: Utc::now(), periods }
    }

    #[test]
    fn test_symbol_normalization() {
        assert_eq!(normalize_symbol("partlycloudy_day"), "partlycloudy");
        assert_eq!(normalize_symbol("clearsky_night"), "clearsky");
        assert_eq!(normalize_symbol("fair_polartwilight"), "fair");
        assert_eq!(normalize_symbol("heavyrain"), "heavyrain");
    }

    #[test]
    fn test_symbol_normalization_idempotent() {
        for code in ["partlycloudy_day", "x_polartwilight", "clearsky_night", "cloudy", "_day", "sunday", ""] {
            let once = normalize_symbol(code);
            assert_eq!(normalize_symbol(once), once, "not idempotent for {code}");
        }
    }

    #[test]
    fn test_symbol_strips_one_suffix_longest_first() {
        // "_polartwilight" wins over any shorter suffix and only one is removed
        assert_eq!(split_symbol("fog_night_polartwilight"), ("fog_night", Some(Variant::PolarTwilight)));
        assert_eq!(split_symbol("fog_day_night"), ("fog_day", Some(Variant::Night)));
    }

    #[test]
    fn test_stacked_suffixes_take_one_call_each() {
        let once = normalize_symbol("fog_night_polartwilight");
        assert_eq!(once, "fog_night");
        assert_eq!(normalize_symbol(once), "fog");
    }

    #[test]
    fn test_symbol_exact_suffix_not_charset_trim() {
        // trailing letters from the suffix alphabet are kept
        assert_eq!(normalize_symbol("sunday"), "sunday");
        assert_eq!(normalize_symbol("heavysleet"), "heavysleet");
        assert_eq!(normalize_symbol("lightrain"), "lightrain");
    }

    #[test]
    fn test_bare_suffix_is_not_stripped_to_nothing() {
        assert_eq!(normalize_symbol("_day"), "_day");
    }

    #[test]
    fn test_condition_icon_names() {
        let c = Condition::parse("partlycloudy_day");
        assert_eq!(c.code, "partlycloudy");
        assert_eq!(c.icon_names(), vec!["partlycloudy_day".to_string(), "partlycloudy".to_string()]);
        assert_eq!(Condition::parse("rain").icon_names(), vec!["rain".to_string()]);
    }

    #[test]
    fn test_temperature_band_boundaries() {
        assert_eq!(TemperatureBand::classify(-9), TemperatureBand::Signed(-9));
        assert_eq!(TemperatureBand::classify(9), TemperatureBand::Signed(9));
        assert_eq!(TemperatureBand::classify(0), TemperatureBand::Signed(0));
        assert_eq!(TemperatureBand::classify(10), TemperatureBand::Positive(10));
        assert_eq!(TemperatureBand::classify(-10), TemperatureBand::BelowZero(10));
        assert!(TemperatureBand::classify(-10).below_zero_marker());
        assert!(!TemperatureBand::classify(-9).below_zero_marker());
    }

    #[test]
    fn test_temperature_band_total() {
        for t in -120..=120 {
            let band = TemperatureBand::classify(t);
            let hits = [
                matches!(band, TemperatureBand::Signed(_)) && (-9..=9).contains(&t),
                matches!(band, TemperatureBand::Positive(_)) && t >= 10,
                matches!(band, TemperatureBand::BelowZero(_)) && t <= -10,
            ];
            assert_eq!(hits.iter().filter(|h| **h).count(), 1, "band of {t}");
            assert!(!band.digits().contains('-'));
        }
    }

    #[test]
    fn test_minus_only_for_single_digit_frost() {
        assert!(TemperatureBand::classify(-3).needs_minus());
        assert!(!TemperatureBand::classify(3).needs_minus());
        assert!(!TemperatureBand::classify(-14).needs_minus());
        assert_eq!(TemperatureBand::classify(-14).digits(), "14");
        assert_eq!(TemperatureBand::classify(-3).digits(), "3");
    }

    #[test]
    fn test_precipitation_clamp() {
        assert_eq!(clamp_precipitation(4.0), PRECIP_CEILING);
        assert_eq!(clamp_precipitation(17.3), PRECIP_CEILING);
        assert_eq!(clamp_precipitation(1.5), 1.5);
        assert!(clamp_precipitation(-0.5) < 0.0);
    }

    #[test]
    fn test_normalize_fields() {
        let fields = normalize(&snapshot(14), &legend()).unwrap();
        assert_eq!(fields.temperature, 7);
        assert_eq!(fields.band, TemperatureBand::Signed(7));
        assert_eq!(fields.condition.code, "partlycloudy");
        assert_eq!(fields.condition.variant, Some(Variant::Day));
        assert_eq!(fields.description, "Partly cloudy");
        assert_eq!(fields.precipitation_chance, 40);
        assert_eq!(fields.wind_speed, 3);
        assert_eq!(fields.wind_gust, 8);
        assert_eq!(fields.wind_direction, Some(CompassPoint::SouthWest));
        assert_eq!(fields.temperature_6h, 10);
        assert_eq!(fields.temperature_12h, 16);
        assert_eq!(fields.condition_6h.code, "rain");
        assert_eq!(fields.condition_12h.code, "rain");
        assert_eq!(fields.precipitation[3], 1.5);
        assert_eq!(fields.precipitation[11], PRECIP_CEILING);
        assert_eq!(fields.precipitation_max[2], 2.0);
        assert!(fields.precipitation_max[5..].iter().all(|v| *v == PRECIP_CEILING));
    }

    #[test]
    fn test_compass_points() {
        assert_eq!(CompassPoint::from_degrees(0.0), CompassPoint::North);
        assert_eq!(CompassPoint::from_degrees(22.4), CompassPoint::North);
        assert_eq!(CompassPoint::from_degrees(22.5), CompassPoint::NorthEast);
        assert_eq!(CompassPoint::from_degrees(180.0), CompassPoint::South);
        assert_eq!(CompassPoint::from_degrees(337.6), CompassPoint::North);
        assert_eq!(CompassPoint::from_degrees(360.0), CompassPoint::North);
        assert_eq!(CompassPoint::from_degrees(-90.0), CompassPoint::West);
        assert_eq!(CompassPoint::from_degrees(292.0).label(), "W");
        assert_eq!(CompassPoint::from_degrees(300.0).label(), "NW");
    }

    #[test]
    fn test_wind_direction_optional_but_numeric() {
        let mut snap = snapshot(12);
        snap.periods[0].wind_from_direction = None;
        assert_eq!(normalize(&snap, &legend()).unwrap().wind_direction, None);

        snap.periods[0].wind_from_direction = Some(json!("southwest"));
        assert!(matches!(
            normalize(&snap, &legend()),
            Err(NormalizeError::MalformedField { field: "wind_from_direction", offset: 0, .. })
        ));
    }

    #[test]
    fn test_twelve_hour_falls_back_to_next_12_hours() {
        let mut snap = snapshot(12);
        snap.periods[6].symbol_code_6h = None;
        let fields = normalize(&snap, &legend()).unwrap();
        assert_eq!(fields.condition_12h.code, "cloudy");
    }

    #[test]
    fn test_missing_period() {
        assert_eq!(
            normalize(&snapshot(11), &legend()),
            Err(NormalizeError::MissingPeriod { required: 12, available: 11 })
        );
    }

    #[test]
    fn test_malformed_field() {
        let mut snap = snapshot(12);
        snap.periods[4].precipitation_amount = Some(json!({"mm": 3}));
        match normalize(&snap, &legend()) {
            Err(NormalizeError::MalformedField { field, offset, .. }) => {
                assert_eq!(field, "precipitation_amount");
                assert_eq!(offset, 4);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_numeric_strings_accepted() {
        let mut snap = snapshot(12);
        snap.periods[0].air_temperature = Some(json!("-14.2"));
        let fields = normalize(&snap, &legend()).unwrap();
        assert_eq!(fields.temperature, -14);
        assert_eq!(fields.band, TemperatureBand::BelowZero(14));
    }

    #[test]
    fn test_missing_temperature_is_malformed() {
        let mut snap = snapshot(12);
        snap.periods[0].air_temperature = None;
        assert!(matches!(
            normalize(&snap, &legend()),
            Err(NormalizeError::MalformedField { field: "air_temperature", offset: 0, .. })
        ));
    }

    #[test]
    fn test_unknown_symbol() {
        let mut snap = snapshot(12);
        snap.periods[0].symbol_code = Some("sleetshowers_night".to_string());
        assert_eq!(
            normalize(&snap, &legend()),
            Err(NormalizeError::UnknownSymbol("sleetshowers".to_string()))
        );
    }

    #[test]
    fn test_normalize_leaves_input_untouched() {
        let snap = snapshot(12);
        let before = snap.clone();
        let _ = normalize(&snap, &legend()).unwrap();
        assert_eq!(snap, before);
    }
}
