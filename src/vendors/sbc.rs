//! SBC receiver-management feed.
//!
//! The SBC API wants a login handshake: `POST` credentials, read the session
//! token from the `x-sbc-auth` response header, then send it back in the same
//! header when listing sites. Coordinates come in radians and health as three
//! status flags.

use async_trait::async_trait;
use reqwest::Method;
use serde_json::{Value, json};
use tracing::debug;

use super::{
    VendorAdapter, flag, map_records, number, read_json, required_code, required_number, text,
};
use crate::config::SbcConfig;
use crate::coords::{AngleUnit, normalize_coordinates};
use crate::error::{MalformedRecord, VendorError};
use crate::fetch::auth::ApiKey;
use crate::fetch::{HttpClient, empty_request, json_request};
use crate::health::classify_flagged;
use crate::names::{NameTable, resolve_name};
use crate::station::Station;

/// Header carrying the SBC session token, both in the login response and on
/// authenticated requests.
pub const AUTH_HEADER: &str = "x-sbc-auth";

pub struct SbcAdapter<C> {
    client: C,
    config: SbcConfig,
}

impl<C: HttpClient + Clone> SbcAdapter<C> {
    pub fn new(client: C, config: SbcConfig) -> Self {
        Self { client, config }
    }

    /// Logs in and returns a fresh session token. Tokens are never reused.
    async fn login(&self) -> Result<String, VendorError> {
        let vendor = self.config.source.as_str();
        let body = json!({
            "username": self.config.username,
            "password": self.config.password,
        });
        let req = json_request(Method::POST, &self.config.login_url, &body);

        let response = self
            .client
            .execute(req)
            .await
            .map_err(|source| VendorError::Fetch {
                vendor: vendor.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(VendorError::Auth {
                vendor: vendor.to_string(),
                message: format!("login returned status {}", response.status()),
            });
        }

        response
            .headers()
            .get(AUTH_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_string)
            .ok_or_else(|| VendorError::Auth {
                vendor: vendor.to_string(),
                message: format!("login response carried no {AUTH_HEADER} token"),
            })
    }
}

#[async_trait]
impl<C: HttpClient + Clone> VendorAdapter for SbcAdapter<C> {
    fn source(&self) -> &str {
        &self.config.source
    }

    #[tracing::instrument(skip(self), fields(vendor = %self.config.source))]
    async fn fetch_raw(&self) -> Result<Value, VendorError> {
        let vendor = self.config.source.as_str();
        let token = self.login().await?;
        debug!("Login succeeded");

        let authed = ApiKey::new(self.client.clone(), AUTH_HEADER, &token).map_err(|e| {
            VendorError::Auth {
                vendor: vendor.to_string(),
                message: format!("unusable token: {e}"),
            }
        })?;

        let req = empty_request(Method::GET, &self.config.sites_url);
        read_json(vendor, authed.execute(req).await).await
    }

    fn normalize(&self, raw: &Value, names: &NameTable) -> Result<Vec<Station>, VendorError> {
        let sites = raw["sites"]
            .as_array()
            .ok_or_else(|| VendorError::Payload {
                vendor: self.config.source.clone(),
                message: "response has no 'sites' array".to_string(),
            })?;
        Ok(normalize_sbc_feed(sites, &self.config.source, names))
    }
}

/// Maps SBC `sites` records to stations, skipping malformed ones.
pub fn normalize_sbc_feed(raw_sites: &[Value], source: &str, names: &NameTable) -> Vec<Station> {
    map_records(source, raw_sites, |index, site| {
        normalize_sbc_site(index, site, source, names)
    })
}

fn normalize_sbc_site(
    index: usize,
    site: &Value,
    source: &str,
    names: &NameTable,
) -> Result<Station, MalformedRecord> {
    let code = required_code(site, "siteCode", index)?;
    let raw_lat = required_number(site, "latitude", index)?;
    let raw_lon = required_number(site, "longitude", index)?;
    let (latitude, longitude) = normalize_coordinates(raw_lat, raw_lon, AngleUnit::Radians);

    let server_name = text(&site["siteServerName"]).unwrap_or_default();

    Ok(Station {
        name: resolve_name(&code, &server_name, names),
        receiver_type: text(&site["receiverType"]).unwrap_or_default(),
        latitude,
        longitude,
        height: number(&site["height"]),
        health: classify_flagged(
            flag(&site["connected"]),
            flag(&site["usedForNetworkProcessing"]),
            flag(&site["receivingData"]),
        ),
        source: source.to_string(),
        code,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::BasicClient;
    use crate::health::HealthState;
    use httpmock::prelude::*;

    fn site(code: &str, lat: f64, lon: f64) -> Value {
        json!({
            "siteCode": code,
            "latitude": lat,
            "longitude": lon,
            "connected": true,
            "receivingData": true,
            "usedForNetworkProcessing": true,
            "height": 215.3,
            "receiverType": "SEPT POLARX5",
            "siteServerName": format!("{code}-srv"),
        })
    }

    fn adapter(server: &MockServer) -> SbcAdapter<BasicClient> {
        let config = SbcConfig::new(&server.base_url(), "ops", "secret").unwrap();
        SbcAdapter::new(BasicClient::new(), config)
    }

    #[test]
    fn test_normalize_site() {
        let names: NameTable = [("del1", "Delhi Base")].into_iter().collect();
        let stations = normalize_sbc_feed(&[site("DEL1", 0.5, 1.3)], "SBC", &names);

        assert_eq!(stations.len(), 1);
        let s = &stations[0];
        assert_eq!(s.code, "DEL1");
        assert_eq!(s.name, "Delhi Base");
        assert_eq!(s.receiver_type, "SEPT POLARX5");
        assert!((s.latitude - 0.5_f64.to_degrees()).abs() < 1e-9);
        assert!((s.longitude - 1.3_f64.to_degrees()).abs() < 1e-9);
        assert_eq!(s.height, Some(215.3));
        assert_eq!(s.health, HealthState::Online);
        assert_eq!(s.source, "SBC");
    }

    #[test]
    fn test_name_falls_back_to_server_name() {
        let stations = normalize_sbc_feed(&[site("MUM2", 0.3, 1.2)], "SBC", &NameTable::new());
        assert_eq!(stations[0].name, "MUM2-srv");
    }

    #[test]
    fn test_malformed_record_is_skipped() {
        let mut broken = site("BAD", 0.1, 0.1);
        broken.as_object_mut().unwrap().remove("latitude");
        let sites = vec![site("A", 0.1, 0.1), broken, site("C", 0.2, 0.2)];

        let stations = normalize_sbc_feed(&sites, "SBC", &NameTable::new());
        let codes: Vec<_> = stations.iter().map(|s| s.code.as_str()).collect();
        assert_eq!(codes, ["A", "C"]);
    }

    #[test]
    fn test_missing_flags_are_offline() {
        let bare = json!({ "siteCode": "X", "latitude": 0.1, "longitude": 0.2 });
        let stations = normalize_sbc_feed(&[bare], "SBC", &NameTable::new());

        assert_eq!(stations[0].health, HealthState::Offline);
        assert_eq!(stations[0].height, None);
        assert_eq!(stations[0].name, "X");
        assert_eq!(stations[0].receiver_type, "");
    }

    #[test]
    fn test_not_receiving_is_degraded() {
        let mut s = site("DEG", 0.1, 0.1);
        s["receivingData"] = json!(false);
        let stations = normalize_sbc_feed(&[s], "SBC", &NameTable::new());
        assert_eq!(stations[0].health, HealthState::Degraded);
    }

    #[tokio::test]
    async fn test_fetch_logs_in_and_sends_token() {
        let server = MockServer::start_async().await;
        let login = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/login")
                    .header("content-type", "application/json")
                    .json_body(json!({ "username": "ops", "password": "secret" }));
                then.status(200).header(AUTH_HEADER, "tok-123");
            })
            .await;
        let sites = server
            .mock_async(|when, then| {
                when.method(GET).path("/sites").header(AUTH_HEADER, "tok-123");
                let sites = [site("DEL1", 0.5, 1.3), site("MUM2", 0.33, 1.27)];
                then.status(200).json_body(json!({ "sites": sites }));
            })
            .await;

        let adapter = adapter(&server);
        let raw = adapter.fetch_raw().await.unwrap();
        let stations = adapter.normalize(&raw, &NameTable::new()).unwrap();

        login.assert_async().await;
        sites.assert_async().await;
        assert_eq!(stations.len(), 2);
    }

    #[tokio::test]
    async fn test_login_rejected_is_auth_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/login");
                then.status(401);
            })
            .await;

        let err = adapter(&server).fetch_raw().await.unwrap_err();
        assert!(matches!(err, VendorError::Auth { .. }));
    }

    #[tokio::test]
    async fn test_login_without_token_is_auth_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/login");
                then.status(200);
            })
            .await;

        let err = adapter(&server).fetch_raw().await.unwrap_err();
        assert!(matches!(err, VendorError::Auth { .. }));
        assert_eq!(err.vendor(), "SBC");
    }

    #[tokio::test]
    async fn test_sites_error_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/login");
                then.status(200).header(AUTH_HEADER, "tok");
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/sites");
                then.status(503).body("maintenance");
            })
            .await;

        let err = adapter(&server).fetch_raw().await.unwrap_err();
        match err {
            VendorError::Status { status, body, .. } => {
                assert_eq!(status.as_u16(), 503);
                assert_eq!(body, "maintenance");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_payload_without_sites_is_rejected() {
        let config = SbcConfig::new("http://localhost", "u", "p").unwrap();
        let adapter = SbcAdapter::new(BasicClient::new(), config);
        let err = adapter
            .normalize(&json!({ "data": [] }), &NameTable::new())
            .unwrap_err();
        assert!(matches!(err, VendorError::Payload { .. }));
    }
}
