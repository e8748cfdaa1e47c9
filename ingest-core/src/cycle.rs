//! One round of fetch-all-cities followed by at most one batch write.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::{collections::BTreeMap, sync::Arc, time::Duration};

use crate::{
    City, FetchError, StoreError, WeatherRecord, provider::WeatherSource, sink::BatchSink,
};

/// Outcome of one cycle. Produced even when every city failed.
#[derive(Debug)]
pub struct CycleReport {
    pub captured_at: DateTime<Utc>,
    /// Records that were built and handed to the sink.
    pub fetched_count: usize,
    /// Rows committed; zero whenever `store_error` is set.
    pub stored_count: usize,
    pub failed_cities: BTreeMap<String, FetchError>,
    pub store_error: Option<StoreError>,
}

impl CycleReport {
    /// Nothing reached the warehouse this cycle.
    pub fn is_total_failure(&self) -> bool {
        self.stored_count == 0
    }

    pub fn log(&self) {
        for (city, err) in &self.failed_cities {
            if err.is_transient() {
                tracing::warn!(city = %city, kind = err.kind(), error = %err, "fetch failed");
            } else {
                tracing::error!(city = %city, kind = err.kind(), error = %err, "fetch failed");
            }
        }

        match &self.store_error {
            Some(err) => tracing::error!(
                captured_at = %self.captured_at,
                rows = self.fetched_count,
                error = %err,
                "batch store failed; rows for this cycle are dropped"
            ),
            None => tracing::info!(
                captured_at = %self.captured_at,
                stored = self.stored_count,
                failed = self.failed_cities.len(),
                "cycle complete"
            ),
        }
    }
}

/// Fans out one fetch per city, joins them all, then stores the survivors.
#[derive(Debug, Clone)]
pub struct IngestionCycle {
    source: Arc<dyn WeatherSource>,
    sink: Arc<dyn BatchSink>,
    fetch_timeout: Duration,
}

impl IngestionCycle {
    pub fn new(source: Arc<dyn WeatherSource>, sink: Arc<dyn BatchSink>, fetch_timeout: Duration) -> Self {
        Self { source, sink, fetch_timeout }
    }

    pub async fn run(&self, cities: &[City]) -> CycleReport {
        let as_of = Utc::now();

        let fetches = cities.iter().map(|city| self.fetch_bounded(city, as_of));
        let results = join_all(fetches).await;

        let mut batch = Vec::with_capacity(cities.len());
        let mut failed_cities = BTreeMap::new();
        for (city, result) in cities.iter().zip(results) {
            match result {
                Ok(record) => batch.push(record),
                Err(err) => {
                    failed_cities.insert(city.name.clone(), err);
                }
            }
        }

        let fetched_count = batch.len();
        let (stored_count, store_error) = if batch.is_empty() {
            tracing::debug!("no records fetched; skipping store");
            (0, None)
        } else {
            match self.sink.store(&batch).await {
                Ok(rows) => (rows, None),
                Err(err) => (0, Some(err)),
            }
        };

        CycleReport { captured_at: as_of, fetched_count, stored_count, failed_cities, store_error }
    }

    async fn fetch_bounded(&self, city: &City, as_of: DateTime<Utc>) -> Result<WeatherRecord, FetchError> {
        match tokio::time::timeout(self.fetch_timeout, self.source.fetch(city, as_of)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Transport(format!(
                "no response within {}s",
                self.fetch_timeout.as_secs_f64()
            ))),
        }
    }
}
