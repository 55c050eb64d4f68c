use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::health::HealthState;

/// Vendor-agnostic station record, rebuilt from scratch on every fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub code: String,
    pub name: String,
    #[serde(rename = "type")]
    pub receiver_type: String,
    pub latitude: f64,
    pub longitude: f64,
    pub height: Option<f64>,
    pub health: HealthState,
    pub source: String,
}

/// Which vendor failed during a cycle that still produced stations.
///
/// Only the error category goes on the wire; the full error is logged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorFailure {
    pub vendor: String,
    pub kind: String,
}

/// Outcome of one aggregate fetch cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationReport {
    pub fetched_at: DateTime<Utc>,
    pub stations: Vec<Station>,
    pub failures: Vec<VendorFailure>,
}

impl StationReport {
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }
}
