//! Trimble-style station marker feed.
//!
//! A single unauthenticated `POST` with an empty JSON object returns
//! `{ "d": { "StationMarkerList": [...] } }`. Coordinates are already in
//! degrees; health is one integer code nested under
//! `HealthInfoObject.SensorHealth.Health`.

use async_trait::async_trait;
use reqwest::Method;
use serde_json::{Value, json};
use tracing::debug;

use super::{
    VendorAdapter, integer, map_records, number, read_json, required_code, required_number, text,
};
use crate::config::TrimbleConfig;
use crate::coords::{AngleUnit, normalize_coordinates};
use crate::error::{MalformedRecord, VendorError};
use crate::fetch::{HttpClient, json_request};
use crate::health::{HealthState, classify_coded};
use crate::names::{NameTable, resolve_name};
use crate::station::Station;

pub struct TrimbleAdapter<C> {
    client: C,
    config: TrimbleConfig,
}

impl<C: HttpClient> TrimbleAdapter<C> {
    pub fn new(client: C, config: TrimbleConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl<C: HttpClient> VendorAdapter for TrimbleAdapter<C> {
    fn source(&self) -> &str {
        &self.config.source
    }

    #[tracing::instrument(skip(self), fields(vendor = %self.config.source))]
    async fn fetch_raw(&self) -> Result<Value, VendorError> {
        let req = json_request(Method::POST, &self.config.url, &json!({}));
        read_json(&self.config.source, self.client.execute(req).await).await
    }

    fn normalize(&self, raw: &Value, names: &NameTable) -> Result<Vec<Station>, VendorError> {
        if raw["d"]["StationMarkerList"].is_array() {
            Ok(normalize_trimble_feed(
                raw,
                &self.config.source,
                self.config.healthy_code,
                names,
            ))
        } else {
            Err(VendorError::Payload {
                vendor: self.config.source.clone(),
                message: "response has no 'd.StationMarkerList' array".to_string(),
            })
        }
    }
}

/// Maps a full Trimble response to stations, skipping malformed markers.
///
/// A response without a marker list yields no stations.
pub fn normalize_trimble_feed(
    raw_feed: &Value,
    source: &str,
    healthy_code: i64,
    names: &NameTable,
) -> Vec<Station> {
    let markers = raw_feed["d"]["StationMarkerList"]
        .as_array()
        .map(Vec::as_slice)
        .unwrap_or_default();

    map_records(source, markers, |index, marker| {
        normalize_marker(index, marker, source, healthy_code, names)
    })
}

fn normalize_marker(
    index: usize,
    marker: &Value,
    source: &str,
    healthy_code: i64,
    names: &NameTable,
) -> Result<Station, MalformedRecord> {
    let code = required_code(marker, "StationCode", index)?;
    let raw_lat = required_number(marker, "Latitude", index)?;
    let raw_lon = required_number(marker, "Longitude", index)?;
    let (latitude, longitude) = normalize_coordinates(raw_lat, raw_lon, AngleUnit::Degrees);

    let station_name = text(&marker["StationName"]).unwrap_or_default();
    let health = marker_health(
        &marker["HealthInfoObject"]["SensorHealth"]["Health"],
        healthy_code,
    );

    Ok(Station {
        name: resolve_name(&code, &station_name, names),
        receiver_type: text(&marker["SensorType"]).unwrap_or_default(),
        latitude,
        longitude,
        height: number(&marker["Height"]),
        health,
        source: source.to_string(),
        code,
    })
}

/// A missing code is offline. A code that is present but not an integer
/// cannot be trusted as healthy, so it reads as degraded.
fn marker_health(value: &Value, healthy_code: i64) -> HealthState {
    if value.is_null() {
        return classify_coded(None, healthy_code);
    }
    match integer(value) {
        Some(code) => classify_coded(Some(code), healthy_code),
        None => {
            debug!(health = %value, "Unreadable health code");
            HealthState::Degraded
        }
    }
}
