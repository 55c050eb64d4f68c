//! Concurrent fetch of every registered vendor into one station list.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use clap::ValueEnum;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, error, info, warn};

use crate::error::{AggregateFetchError, VendorError};
use crate::names::NameTable;
use crate::station::{Station, StationReport, VendorFailure};
use crate::vendors::VendorAdapter;

pub const DEFAULT_VENDOR_TIMEOUT: Duration = Duration::from_secs(10);

/// What to do when some, but not all, vendors fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum FailurePolicy {
    /// Return whatever the healthy vendors produced.
    #[default]
    Degrade,
    /// Fail the whole cycle as soon as any vendor fails.
    FailFast,
}

pub struct Aggregator {
    adapters: Vec<Arc<dyn VendorAdapter>>,
    names: Arc<NameTable>,
    timeout: Duration,
    policy: FailurePolicy,
}

impl Aggregator {
    pub fn new(names: Arc<NameTable>) -> Self {
        Self {
            adapters: Vec::new(),
            names,
            timeout: DEFAULT_VENDOR_TIMEOUT,
            policy: FailurePolicy::default(),
        }
    }

    /// Registers a vendor. Stations are concatenated in registration order.
    pub fn with_adapter<A: VendorAdapter + 'static>(mut self, adapter: A) -> Self {
        self.adapters.push(Arc::new(adapter));
        self
    }

    /// Upper bound on one vendor's fetch, login included.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn vendors(&self) -> Vec<&str> {
        self.adapters.iter().map(|a| a.source()).collect()
    }

    /// All stations from every vendor that answered.
    pub async fn fetch_all_stations(&self) -> Result<Vec<Station>, AggregateFetchError> {
        self.fetch_report().await.map(|report| report.stations)
    }

    /// Fetches all vendors concurrently and joins them in registration order.
    ///
    /// Under [`FailurePolicy::Degrade`] a vendor failure is logged and recorded
    /// in the report; only a cycle where every vendor failed is an error.
    #[tracing::instrument(skip(self), fields(vendors = self.adapters.len(), policy = ?self.policy))]
    pub async fn fetch_report(&self) -> Result<StationReport, AggregateFetchError> {
        let fetched_at = Utc::now();

        let mut tasks = VendorTasks(Vec::with_capacity(self.adapters.len()));
        for adapter in &self.adapters {
            let vendor = adapter.source().to_string();
            let adapter = Arc::clone(adapter);
            let names = Arc::clone(&self.names);
            let timeout = self.timeout;

            let span = tracing::info_span!("vendor_fetch", vendor = %vendor);
            let fetch = async move { fetch_vendor(adapter.as_ref(), &names, timeout).await };
            tasks.0.push((vendor, tokio::spawn(fetch.instrument(span))));
        }

        let mut stations = Vec::new();
        let mut failures = Vec::new();
        let mut succeeded = 0usize;

        for (vendor, task) in tasks.0.iter_mut() {
            let result = task.await.unwrap_or_else(|e| {
                Err(VendorError::Task {
                    vendor: vendor.clone(),
                    message: e.to_string(),
                })
            });

            match result {
                Ok(mut batch) => {
                    debug!(vendor = %vendor, stations = batch.len(), "Vendor fetch complete");
                    succeeded += 1;
                    stations.append(&mut batch);
                }
                Err(e) => {
                    warn!(vendor = %vendor, kind = e.kind(), error = %e, "Vendor fetch failed");
                    failures.push(e);
                }
            }
        }

        let all_failed = succeeded == 0 && !failures.is_empty();
        if all_failed || (self.policy == FailurePolicy::FailFast && !failures.is_empty()) {
            error!(failed = failures.len(), "Station fetch failed");
            return Err(AggregateFetchError { failures });
        }

        info!(
            stations = stations.len(),
            failed_vendors = failures.len(),
            "Station fetch complete"
        );

        Ok(StationReport {
            fetched_at,
            stations,
            failures: failures
                .iter()
                .map(|e| VendorFailure {
                    vendor: e.vendor().to_string(),
                    kind: e.kind().to_string(),
                })
                .collect(),
        })
    }
}

/// Vendor tasks of one cycle. Dropping the cycle aborts whatever still runs.
struct VendorTasks(Vec<(String, JoinHandle<Result<Vec<Station>, VendorError>>)>);

impl Drop for VendorTasks {
    fn drop(&mut self) {
        for (_, task) in &self.0 {
            task.abort();
        }
    }
}

async fn fetch_vendor(
    adapter: &dyn VendorAdapter,
    names: &NameTable,
    timeout: Duration,
) -> Result<Vec<Station>, VendorError> {
    let raw = tokio::time::timeout(timeout, adapter.fetch_raw())
        .await
        .map_err(|_| VendorError::Timeout {
            vendor: adapter.source().to_string(),
            timeout,
        })??;
    adapter.normalize(&raw, names)
}
