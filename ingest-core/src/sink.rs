use async_trait::async_trait;
use std::fmt::Debug;

use crate::{StoreError, WeatherRecord};

pub mod postgres;
pub mod stdout;

pub use postgres::PostgresSink;
pub use stdout::StdoutSink;

/// Persists one cycle's batch as a single all-or-nothing unit.
#[async_trait]
pub trait BatchSink: Send + Sync + Debug {
    /// Returns the number of rows committed.
    async fn store(&self, batch: &[WeatherRecord]) -> Result<usize, StoreError>;
}
