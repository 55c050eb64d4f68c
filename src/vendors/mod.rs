//! Vendor feed adapters.
//!
//! Each vendor implements [`VendorAdapter`]: it knows how to pull its raw
//! payload over HTTP and how to turn that payload into canonical
//! [`Station`]s. The aggregator only ever sees this trait.

pub mod sbc;
pub mod trimble;

pub use sbc::{SbcAdapter, normalize_sbc_feed};
pub use trimble::{TrimbleAdapter, normalize_trimble_feed};

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{MalformedRecord, VendorError};
use crate::names::NameTable;
use crate::station::Station;

/// One upstream station feed.
#[async_trait]
pub trait VendorAdapter: Send + Sync {
    /// Tag written into [`Station::source`] and used in logs.
    fn source(&self) -> &str;

    /// Pulls the vendor's raw payload, logging in first if the vendor needs it.
    async fn fetch_raw(&self) -> Result<Value, VendorError>;

    /// Maps a raw payload to stations. Fails only when the payload envelope
    /// itself is wrong; bad individual records are skipped.
    fn normalize(&self, raw: &Value, names: &NameTable) -> Result<Vec<Station>, VendorError>;
}

/// Checks the status of a vendor response and decodes its JSON body.
pub(crate) async fn read_json(
    vendor: &str,
    response: reqwest::Result<reqwest::Response>,
) -> Result<Value, VendorError> {
    let response = response.map_err(|source| VendorError::Fetch {
        vendor: vendor.to_string(),
        source,
    })?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(VendorError::Status {
            vendor: vendor.to_string(),
            status,
            body,
        });
    }

    response.json().await.map_err(|source| VendorError::Fetch {
        vendor: vendor.to_string(),
        source,
    })
}

/// Runs `map` over every record, dropping the ones it rejects.
pub(crate) fn map_records<F>(vendor: &str, records: &[Value], map: F) -> Vec<Station>
where
    F: Fn(usize, &Value) -> Result<Station, MalformedRecord>,
{
    let stations: Vec<Station> = records
        .iter()
        .enumerate()
        .filter_map(|(index, record)| match map(index, record) {
            Ok(station) => Some(station),
            Err(e) => {
                warn!(vendor, error = %e, "Skipping malformed station record");
                None
            }
        })
        .collect();

    debug!(
        vendor,
        records = records.len(),
        stations = stations.len(),
        "Feed normalized"
    );
    stations
}

/// Reads a number that some vendors send as a JSON string.
pub(crate) fn number(value: &Value) -> Option<f64> {
    let n: Option<f64> = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    n.filter(|n| n.is_finite())
}

/// Reads an integer code, accepting integral floats and numeric strings.
pub(crate) fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Reads a status flag. Missing or unrecognised values count as `false`.
pub(crate) fn flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_i64().is_some_and(|n| n != 0),
        Value::String(s) => s.trim().eq_ignore_ascii_case("true") || s.trim() == "1",
        _ => false,
    }
}

/// Reads a string field, stringifying bare numbers (some codes arrive numeric).
pub(crate) fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Required angle field, or a [`MalformedRecord`] naming what is missing.
pub(crate) fn required_number(
    record: &Value,
    field: &str,
    index: usize,
) -> Result<f64, MalformedRecord> {
    number(&record[field])
        .ok_or_else(|| MalformedRecord::new(index, format!("missing or non-numeric '{field}'")))
}

/// Required identifier field; blank counts as missing.
pub(crate) fn required_code(
    record: &Value,
    field: &str,
    index: usize,
) -> Result<String, MalformedRecord> {
    text(&record[field])
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| MalformedRecord::new(index, format!("missing '{field}'")))
}
