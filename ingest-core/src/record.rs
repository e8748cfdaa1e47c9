//! Flattening of provider documents into [`WeatherRecord`]s.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::{
    error::FetchError,
    model::{City, WeatherRecord},
};

/// Build a record from a One Call style document.
///
/// Only a missing (or non-object) `current` section is fatal. Every other gap
/// resolves to `None`, except precipitation which resolves to `0.0`.
pub fn build(city: &City, payload: Value, as_of: DateTime<Utc>) -> Result<WeatherRecord, FetchError> {
    let current = payload
        .get("current")
        .and_then(Value::as_object)
        .ok_or_else(|| {
            FetchError::MalformedPayload(format!(
                "response for {} has no `current` section",
                city.name
            ))
        })?;

    let condition = current
        .get("weather")
        .and_then(Value::as_array)
        .and_then(|conditions| conditions.first());

    let text = |key: &str| {
        condition
            .and_then(|c| c.get(key))
            .and_then(Value::as_str)
            .map(str::to_owned)
    };

    let temperature = current.get("temp").and_then(Value::as_f64);
    let feels_like = current.get("feels_like").and_then(Value::as_f64);
    let humidity = current.get("humidity").and_then(integer);
    let wind_speed = current.get("wind_speed").and_then(Value::as_f64);
    let wind_deg = current.get("wind_deg").and_then(integer);
    let clouds = current.get("clouds").and_then(integer);
    let weather_main = text("main");
    let weather_description = text("description");
    let rain_1h = precipitation(current.get("rain"));
    let snow_1h = precipitation(current.get("snow"));

    Ok(WeatherRecord {
        city: city.name.clone(),
        captured_at: as_of,
        temperature,
        feels_like,
        humidity,
        wind_speed,
        wind_deg,
        weather_main,
        weather_description,
        clouds,
        rain_1h,
        snow_1h,
        raw: payload,
    })
}

/// Integers, or floats with no fractional part (`65.0`).
fn integer(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
            .map(|f| f as i64)
    })
}

fn precipitation(block: Option<&Value>) -> f64 {
    block
        .and_then(|b| b.get("1h"))
        .and_then(Value::as_f64)
        .unwrap_or(0.0)
}
