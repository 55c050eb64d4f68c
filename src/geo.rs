//! GeoJSON views of the station list for the map client.
//!
//! Each station becomes a `Point` feature at `[longitude, latitude]` whose
//! `id` is the station code and whose properties carry the remaining fields.

use geojson::feature::Id;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use serde_json::json;

use crate::health::HealthState;
use crate::station::Station;

#[derive(Debug, thiserror::Error)]
pub enum FeatureError {
    #[error("feature has no point geometry")]
    NotAPoint,
    #[error("feature property '{0}' is missing or invalid")]
    Property(&'static str),
}

pub fn to_feature(station: &Station) -> Feature {
    let mut properties = JsonObject::new();
    properties.insert("code".to_string(), json!(station.code));
    properties.insert("name".to_string(), json!(station.name));
    properties.insert("type".to_string(), json!(station.receiver_type));
    properties.insert("height".to_string(), json!(station.height));
    properties.insert("health".to_string(), json!(station.health));
    properties.insert("color".to_string(), json!(station.health.marker_color()));
    properties.insert("source".to_string(), json!(station.source));

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Point(vec![
            station.longitude,
            station.latitude,
        ]))),
        id: Some(Id::String(station.code.clone())),
        properties: Some(properties),
        foreign_members: None,
    }
}

pub fn to_feature_collection(stations: &[Station]) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: stations.iter().map(to_feature).collect(),
        foreign_members: None,
    }
}

/// Rebuilds a station from a feature produced by [`to_feature`].
pub fn from_feature(feature: &Feature) -> Result<Station, FeatureError> {
    let (longitude, latitude) = match feature.geometry.as_ref().map(|g| &g.value) {
        Some(Value::Point(position)) if position.len() >= 2 => (position[0], position[1]),
        _ => return Err(FeatureError::NotAPoint),
    };

    let string = |key: &'static str| {
        feature
            .property(key)
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or(FeatureError::Property(key))
    };

    let health: HealthState = feature
        .property("health")
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .ok_or(FeatureError::Property("health"))?;

    Ok(Station {
        code: string("code")?,
        name: string("name")?,
        receiver_type: string("type")?,
        latitude,
        longitude,
        height: feature.property("height").and_then(|v| v.as_f64()),
        health,
        source: string("source")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use geojson::GeoJson;

    fn station(code: &str, lat: f64, lon: f64, health: HealthState) -> Station {
        Station {
            code: code.to_string(),
            name: format!("{code} name"),
            receiver_type: "LEICA GR50".to_string(),
            latitude: lat,
            longitude: lon,
            height: Some(12.5),
            health,
            source: "SBC".to_string(),
        }
    }

    #[test]
    fn test_point_is_lon_lat() {
        let feature = to_feature(&station("DEL1", 28.7041, 77.1025, HealthState::Online));
        match &feature.geometry.as_ref().unwrap().value {
            Value::Point(p) => assert_eq!(p, &vec![77.1025, 28.7041]),
            other => panic!("unexpected geometry {other:?}"),
        }
        assert_eq!(feature.id, Some(Id::String("DEL1".to_string())));
        assert_eq!(feature.property("color").unwrap(), "green");
    }

    #[test]
    fn test_round_trip_through_text() {
        let stations = vec![
            station("DEL1", 28.704_100_000_1, 77.102_5, HealthState::Online),
            station("MUM2", 19.076, 72.877_7, HealthState::Degraded),
            station("KOL3", -0.000_000_001, 179.999_999_999, HealthState::Offline),
        ];

        let text = serde_json::to_string(&to_feature_collection(&stations)).unwrap();
        let parsed: GeoJson = text.parse().unwrap();
        let GeoJson::FeatureCollection(collection) = parsed else {
            panic!("expected a feature collection");
        };

        assert_eq!(collection.features.len(), stations.len());
        for (original, feature) in stations.iter().zip(&collection.features) {
            let back = from_feature(feature).unwrap();
            assert_eq!(back.code, original.code);
            assert_eq!(back.health, original.health);
            assert!((back.latitude - original.latitude).abs() < 1e-9);
            assert!((back.longitude - original.longitude).abs() < 1e-9);
            assert_eq!(back.name, original.name);
            assert_eq!(back.source, original.source);
        }
    }

    #[test]
    fn test_missing_height_round_trips_as_none() {
        let mut s = station("X", 1.0, 2.0, HealthState::Offline);
        s.height = None;
        let back = from_feature(&to_feature(&s)).unwrap();
        assert_eq!(back.height, None);
    }

    #[test]
    fn test_from_feature_rejects_other_geometry() {
        let mut feature = to_feature(&station("X", 1.0, 2.0, HealthState::Online));
        feature.geometry = None;
        assert!(matches!(from_feature(&feature), Err(FeatureError::NotAPoint)));
    }
}
