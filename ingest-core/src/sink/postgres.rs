//! PostgreSQL warehouse sink.
//!
//! The table holds one row per city per cycle, with the provider document
//! kept in a `JSONB` column for reprocessing.

use async_trait::async_trait;
use sqlx::{
    PgPool,
    postgres::PgPoolOptions,
    types::Json,
};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::{StoreError, WeatherRecord, config::WarehouseConfig};

use super::BatchSink;

#[derive(Debug)]
pub struct PostgresSink {
    pool: PgPool,
    table: String,
    provisioned: AtomicBool,
}

impl PostgresSink {
    /// Wrap an existing pool. `table` must already be a validated identifier.
    pub fn new(pool: PgPool, table: impl Into<String>) -> Self {
        Self { pool, table: table.into(), provisioned: AtomicBool::new(false) }
    }

    /// Build a lazily connecting pool, so an unreachable warehouse surfaces
    /// per cycle instead of at startup.
    pub fn from_config(config: &WarehouseConfig) -> anyhow::Result<Self> {
        let url = config
            .url
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("No warehouse URL configured"))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .connect_lazy(url)
            .map_err(|e| anyhow::anyhow!("Invalid warehouse URL: {e}"))?;

        Ok(Self::new(pool, config.table.clone()))
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    fn create_table_sql(&self) -> String {
        format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                city                VARCHAR NOT NULL,
                captured_at         TIMESTAMPTZ NOT NULL,
                temperature         DOUBLE PRECISION,
                feels_like          DOUBLE PRECISION,
                humidity            BIGINT,
                wind_speed          DOUBLE PRECISION,
                wind_deg            BIGINT,
                weather_main        VARCHAR,
                weather_description VARCHAR,
                clouds              BIGINT,
                rain_1h             DOUBLE PRECISION NOT NULL DEFAULT 0,
                snow_1h             DOUBLE PRECISION NOT NULL DEFAULT 0,
                raw_data            JSONB NOT NULL
            )
            "#,
            self.table
        )
    }

    fn insert_sql(&self) -> String {
        format!(
            r#"
            INSERT INTO {}
                (city, captured_at, temperature, feels_like, humidity, wind_speed, wind_deg,
                 weather_main, weather_description, clouds, rain_1h, snow_1h, raw_data)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
            self.table
        )
    }
}

#[async_trait]
impl BatchSink for PostgresSink {
    async fn store(&self, batch: &[WeatherRecord]) -> Result<usize, StoreError> {
        if batch.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await.map_err(StoreError::Connection)?;

        // DDL is transactional in Postgres; if the batch fails the flag stays unset.
        let provisioning = !self.provisioned.load(Ordering::Acquire);
        if provisioning {
            sqlx::query(&self.create_table_sql())
                .execute(&mut *tx)
                .await
                .map_err(|source| StoreError::Provision { table: self.table.clone(), source })?;
        }

        let insert = self.insert_sql();
        for record in batch {
            sqlx::query(&insert)
                .bind(&record.city)
                .bind(record.captured_at)
                .bind(record.temperature)
                .bind(record.feels_like)
                .bind(record.humidity)
                .bind(record.wind_speed)
                .bind(record.wind_deg)
                .bind(&record.weather_main)
                .bind(&record.weather_description)
                .bind(record.clouds)
                .bind(record.rain_1h)
                .bind(record.snow_1h)
                .bind(Json(&record.raw))
                .execute(&mut *tx)
                .await
                .map_err(|source| StoreError::Write { city: record.city.clone(), source })?;
        }

        tx.commit()
            .await
            .map_err(|source| StoreError::Commit { rows: batch.len(), source })?;

        if provisioning {
            self.provisioned.store(true, Ordering::Release);
            tracing::debug!(table = %self.table, "warehouse table provisioned");
        }

        Ok(batch.len())
    }
}
