//! Core library for the `weather-ingest` daemon.
//!
//! This crate defines:
//! - Configuration (cities, polling interval, provider and warehouse settings)
//! - The weather source abstraction and its OpenWeatherMap implementation
//! - Flattening of provider documents into warehouse rows
//! - Batch sinks (PostgreSQL warehouse, JSON-lines dry run)
//! - The ingestion cycle and the scheduler that repeats it
//!
//! It is used by `ingest-cli`, but can also be embedded in other services.

pub mod config;
pub mod cycle;
pub mod error;
pub mod model;
pub mod provider;
pub mod record;
pub mod scheduler;
pub mod sink;

pub use config::{Config, ProviderConfig, WarehouseConfig};
pub use cycle::{CycleReport, IngestionCycle};
pub use error::{FetchError, StoreError};
pub use model::{Batch, City, WeatherRecord};
pub use provider::{OpenWeatherSource, WeatherSource};
pub use scheduler::{Scheduler, SchedulerState};
pub use sink::{BatchSink, PostgresSink, StdoutSink};
