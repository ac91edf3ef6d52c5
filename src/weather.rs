use chrono::{DateTime, Local};

use crate::owm::{current, forecast, Condition};

/// Time-of-day marker of the representative daily sample.
pub const NOON: &str = "12:00:00";

/// Most days shown in the forecast strip.
pub const FORECAST_DAYS: usize = 5;

pub const RAIN_ADVISORY: &str = "Carry umbrella 🌧";
pub const HEAT_ADVISORY: &str = "Stay hydrated 🥵";
pub const WIND_ADVISORY: &str = "High winds warning 🌪";

const HEAT_THRESHOLD_C: f64 = 35.0;
const WIND_THRESHOLD_MPS: f64 = 13.8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurrentObservation {
    pub location_name: String,
    pub temperature_c: Option<f64>,
    pub humidity_pct: Option<f64>,
    pub wind_speed_mps: Option<f64>,
    pub wind_direction_deg: Option<f64>,
    pub condition_description: Option<String>,
    pub coordinates: Option<Coordinates>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForecastEntry {
    pub timestamp: String,
    pub temperature_c: Option<f64>,
    pub condition_description: Option<String>,
}

/// Everything the dashboard shows for one completed query.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub current: CurrentObservation,
    pub daily: Vec<ForecastEntry>,
    pub alerts: Vec<String>,
    pub fetched_at: DateTime<Local>,
}

impl Snapshot {
    pub fn new(current: CurrentObservation, raw: &[ForecastEntry], fetched_at: DateTime<Local>) -> Self {
        let alerts = derive_alerts(&current, raw);
        Self {
            daily: select_daily_forecast(raw),
            current,
            alerts,
            fetched_at,
        }
    }
}

fn first_description(weather: Option<Vec<Condition>>) -> Option<String> {
    weather
        .into_iter()
        .flatten()
        .next()
        .and_then(|c| c.description)
}

impl From<current::Current> for CurrentObservation {
    fn from(c: current::Current) -> Self {
        let main = c.main.unwrap_or_default();
        let wind = c.wind.unwrap_or_default();
        Self {
            location_name: c.name.unwrap_or_default(),
            temperature_c: main.temp,
            humidity_pct: main.humidity,
            wind_speed_mps: wind.speed,
            wind_direction_deg: wind.deg,
            condition_description: first_description(c.weather),
            coordinates: c.coord.and_then(|coord| {
                Some(Coordinates {
                    lat: coord.lat?,
                    lon: coord.lon?,
                })
            }),
        }
    }
}

impl From<forecast::Entry> for ForecastEntry {
    fn from(e: forecast::Entry) -> Self {
        Self {
            timestamp: e.dt_txt,
            temperature_c: e.main.and_then(|m| m.temp),
            condition_description: first_description(e.weather),
        }
    }
}

/// Keeps the noon samples of a 3-hourly series, at most one strip's worth.
///
/// The match is textual on the timestamp as the upstream wrote it; no timezone
/// conversion happens here.
pub fn select_daily_forecast(raw: &[ForecastEntry]) -> Vec<ForecastEntry> {
    raw.iter()
        .filter(|e| e.timestamp.contains(NOON))
        .take(FORECAST_DAYS)
        .cloned()
        .collect()
}

/// Advisories for the current observation and the full, unfiltered series,
/// always ordered precipitation, heat, wind.
pub fn derive_alerts(current: &CurrentObservation, raw: &[ForecastEntry]) -> Vec<String> {
    let mut alerts = vec![];

    if raw.iter().any(|e| {
        e.condition_description
            .as_deref()
            .is_some_and(|d| d.contains("rain"))
    }) {
        alerts.push(RAIN_ADVISORY.to_string());
    }

    if raw
        .iter()
        .any(|e| e.temperature_c.is_some_and(|t| t > HEAT_THRESHOLD_C))
    {
        alerts.push(HEAT_ADVISORY.to_string());
    }

    if current
        .wind_speed_mps
        .is_some_and(|speed| speed > WIND_THRESHOLD_MPS)
    {
        alerts.push(WIND_ADVISORY.to_string());
    }

    alerts
}
