use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use std::time::Duration;

use crate::{
    City, FetchError, WeatherRecord,
    config::ProviderConfig,
    error::truncate_body,
    record,
};

use super::WeatherSource;

/// OpenWeatherMap One Call "current conditions" client.
#[derive(Debug, Clone)]
pub struct OpenWeatherSource {
    api_key: String,
    base_url: String,
    units: String,
    http: Client,
}

impl OpenWeatherSource {
    pub fn new(api_key: String, base_url: String, units: String, timeout: Duration) -> Result<Self, FetchError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { api_key, base_url, units, http })
    }

    pub fn from_config(config: &ProviderConfig) -> anyhow::Result<Self> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            anyhow::anyhow!(
                "No provider API key configured.\n\
                 Hint: set `provider.api_key` in the config file or export OPENWEATHERMAP_API_KEY."
            )
        })?;

        Ok(Self::new(
            api_key,
            config.base_url.clone(),
            config.units.clone(),
            config.timeout(),
        )?)
    }
}

#[async_trait]
impl WeatherSource for OpenWeatherSource {
    async fn fetch(&self, city: &City, as_of: DateTime<Utc>) -> Result<WeatherRecord, FetchError> {
        let res = self
            .http
            .get(&self.base_url)
            .query(&[
                ("lat", city.latitude.to_string()),
                ("lon", city.longitude.to_string()),
                ("appid", self.api_key.clone()),
                ("units", self.units.clone()),
            ])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(FetchError::Provider {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let payload: serde_json::Value = serde_json::from_str(&body).map_err(|e| {
            FetchError::MalformedPayload(format!("response for {} is not JSON: {e}", city.name))
        })?;

        record::build(city, payload, as_of)
    }
}
