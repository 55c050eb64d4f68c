//! Fixed-interval fetch loop.
//!
//! Ticks never overlap: each fetch is awaited before the next tick is taken,
//! and ticks missed while a fetch ran are skipped rather than replayed.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::aggregate::Aggregator;
use crate::error::AggregateFetchError;
use crate::station::StationReport;

pub struct Poller {
    aggregator: Arc<Aggregator>,
    interval: Duration,
    max_ticks: usize,
}

impl Poller {
    pub fn new(aggregator: Arc<Aggregator>, interval: Duration) -> Self {
        Self {
            aggregator,
            interval,
            max_ticks: 0,
        }
    }

    /// Stops after `max_ticks` fetches. `0` means run until shut down.
    pub fn with_max_ticks(mut self, max_ticks: usize) -> Self {
        self.max_ticks = max_ticks;
        self
    }

    /// Runs the loop, handing every tick's result to `on_tick`.
    ///
    /// Returns the number of completed ticks. The loop ends when the tick limit
    /// is reached or `shutdown` flips to `true` (or its sender is dropped); a
    /// fetch in flight at shutdown is abandoned.
    #[tracing::instrument(
        skip_all,
        fields(interval_ms = self.interval.as_millis() as u64, max_ticks = self.max_ticks)
    )]
    pub async fn run<F>(&self, mut shutdown: watch::Receiver<bool>, mut on_tick: F) -> usize
    where
        F: FnMut(usize, Result<StationReport, AggregateFetchError>),
    {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut completed = 0;
        loop {
            if self.max_ticks > 0 && completed >= self.max_ticks {
                debug!(completed, "Tick limit reached");
                break;
            }
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.changed() => {
                    info!(completed, "Poller shutting down");
                    break;
                }
            }

            let result = tokio::select! {
                result = self.aggregator.fetch_report() => result,
                _ = shutdown.changed() => {
                    info!(completed, "Poller shutting down, abandoning fetch in flight");
                    break;
                }
            };

            completed += 1;
            on_tick(completed, result);
        }

        completed
    }
}
