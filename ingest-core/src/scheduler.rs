use std::{sync::Arc, time::Duration};
use tokio::{
    sync::watch,
    time::{MissedTickBehavior, interval},
};

use crate::{City, cycle::IngestionCycle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Waiting for the next tick.
    Idle,
    /// One cycle in flight.
    Running,
}

/// Drives [`IngestionCycle`] on a fixed period, one cycle at a time.
///
/// A cycle that overruns the period is followed immediately by the next one;
/// cycles never overlap. Stop requests are only observed between cycles, so a
/// batch write in progress always finishes.
#[derive(Debug)]
pub struct Scheduler {
    cycle: IngestionCycle,
    cities: Arc<[City]>,
    period: Duration,
    state: watch::Sender<SchedulerState>,
}

impl Scheduler {
    pub fn new(cycle: IngestionCycle, cities: Arc<[City]>, period: Duration) -> Self {
        let (state, _) = watch::channel(SchedulerState::Idle);
        Self { cycle, cities, period, state }
    }

    pub fn state(&self) -> SchedulerState {
        *self.state.borrow()
    }

    /// Run until `shutdown` changes or its sender is dropped.
    /// Returns the number of cycles completed.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> u64 {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            cities = self.cities.len(),
            interval_secs = self.period.as_secs(),
            "scheduler started"
        );

        let mut completed = 0u64;
        loop {
            tokio::select! {
                biased;
                _ = shutdown.changed() => {
                    tracing::info!(cycles = completed, "shutdown requested, scheduler stopping");
                    break;
                }
                _ = ticker.tick() => {
                    self.state.send_replace(SchedulerState::Running);
                    let report = self.cycle.run(&self.cities).await;
                    self.state.send_replace(SchedulerState::Idle);

                    completed += 1;
                    tracing::debug!(cycle = completed, "cycle finished");
                    report.log();
                }
            }
        }

        completed
    }
}
