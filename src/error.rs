//! Error types shared across the fetch and normalization pipeline.

use std::time::Duration;

/// A failure confined to one vendor feed.
///
/// These are caught at the vendor boundary by the aggregator and logged with
/// the vendor's identity; they never abort the process.
#[derive(Debug, thiserror::Error)]
pub enum VendorError {
    /// Login was rejected or the vendor returned no token.
    #[error("{vendor}: authentication failed: {message}")]
    Auth { vendor: String, message: String },

    /// The request could not be sent or the body could not be read.
    #[error("{vendor}: request failed: {source}")]
    Fetch {
        vendor: String,
        #[source]
        source: reqwest::Error,
    },

    /// The data endpoint answered with a non-2xx status.
    #[error("{vendor}: upstream returned status {status}: {body}")]
    Status {
        vendor: String,
        status: reqwest::StatusCode,
        body: String,
    },

    /// The response arrived but does not have the expected envelope.
    #[error("{vendor}: unexpected payload: {message}")]
    Payload { vendor: String, message: String },

    /// The vendor did not answer within the configured budget.
    #[error("{vendor}: no response within {timeout:?}")]
    Timeout { vendor: String, timeout: Duration },

    /// The fetch task panicked or was cancelled.
    #[error("{vendor}: fetch task failed: {message}")]
    Task { vendor: String, message: String },
}

impl VendorError {
    /// Source tag of the vendor that failed.
    pub fn vendor(&self) -> &str {
        match self {
            VendorError::Auth { vendor, .. }
            | VendorError::Fetch { vendor, .. }
            | VendorError::Status { vendor, .. }
            | VendorError::Payload { vendor, .. }
            | VendorError::Timeout { vendor, .. }
            | VendorError::Task { vendor, .. } => vendor,
        }
    }

    /// Short machine-friendly label, used in logs and fetch reports.
    pub fn kind(&self) -> &'static str {
        match self {
            VendorError::Auth { .. } => "auth_error",
            VendorError::Fetch { .. } => "fetch_error",
            VendorError::Status { .. } => "status_error",
            VendorError::Payload { .. } => "payload_error",
            VendorError::Timeout { .. } => "timeout",
            VendorError::Task { .. } => "task_error",
        }
    }
}

/// A single raw record that cannot become a station. Skipped, never propagated.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("record {index}: {reason}")]
pub struct MalformedRecord {
    pub index: usize,
    pub reason: String,
}

impl MalformedRecord {
    pub fn new(index: usize, reason: impl Into<String>) -> Self {
        Self {
            index,
            reason: reason.into(),
        }
    }
}

/// Returned when the aggregate fetch produced nothing usable.
#[derive(Debug, thiserror::Error)]
#[error("station fetch failed for {} vendor(s)", failures.len())]
pub struct AggregateFetchError {
    pub failures: Vec<VendorError>,
}

/// Errors raised while loading the static station name table.
#[derive(Debug, thiserror::Error)]
pub enum NameTableError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),
}
