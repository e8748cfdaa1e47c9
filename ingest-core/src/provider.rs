use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt::Debug;

use crate::{City, FetchError, WeatherRecord};

pub mod openweather;

pub use openweather::OpenWeatherSource;

/// One request/response round trip for one city.
///
/// Implementations hold no per-call state, so a cycle may drive many
/// fetches concurrently against the same source.
#[async_trait]
pub trait WeatherSource: Send + Sync + Debug {
    async fn fetch(&self, city: &City, as_of: DateTime<Utc>) -> Result<WeatherRecord, FetchError>;
}
