use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A configured location to poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl City {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self { name: name.into(), latitude, longitude }
    }
}

/// One flat warehouse row.
///
/// Optional fields are `None` when the provider omitted them. `rain_1h` and
/// `snow_1h` are the exception: no precipitation block means no precipitation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub city: String,
    pub captured_at: DateTime<Utc>,
    pub temperature: Option<f64>,
    pub feels_like: Option<f64>,
    pub humidity: Option<i64>,
    pub wind_speed: Option<f64>,
    pub wind_deg: Option<i64>,
    pub weather_main: Option<String>,
    pub weather_description: Option<String>,
    pub clouds: Option<i64>,
    pub rain_1h: f64,
    pub snow_1h: f64,
    /// The provider document exactly as received.
    pub raw: serde_json::Value,
}

/// Records built during one cycle, in city order.
pub type Batch = Vec<WeatherRecord>;
