use async_trait::async_trait;
use std::{
    fmt,
    io::{self, Write},
    sync::Mutex,
};

use crate::{StoreError, WeatherRecord};

use super::BatchSink;

/// Dry-run sink: one JSON document per record, written as a single block.
pub struct StdoutSink<W = io::Stdout> {
    out: Mutex<W>,
}

impl StdoutSink<io::Stdout> {
    pub fn new() -> Self {
        Self::with_writer(io::stdout())
    }
}

impl Default for StdoutSink<io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W> StdoutSink<W> {
    pub fn with_writer(out: W) -> Self {
        Self { out: Mutex::new(out) }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<W> fmt::Debug for StdoutSink<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdoutSink").finish_non_exhaustive()
    }
}

#[async_trait]
impl<W: Write + Send + 'static> BatchSink for StdoutSink<W> {
    async fn store(&self, batch: &[WeatherRecord]) -> Result<usize, StoreError> {
        // Render everything first so a serialization failure emits nothing.
        let mut buf = Vec::new();
        for record in batch {
            serde_json::to_writer(&mut buf, record).map_err(io::Error::from)?;
            buf.push(b'\n');
        }

        let mut out = self
            .out
            .lock()
            .map_err(|_| io::Error::other("output writer lock poisoned"))?;
        out.write_all(&buf)?;
        out.flush()?;

        Ok(batch.len())
    }
}
