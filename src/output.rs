//! Output formatting and persistence for station snapshots.
//!
//! Supports JSON printing and appending snapshot rows to a CSV log.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::health::HealthState;
use crate::station::Station;
use csv::WriterBuilder;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

/// One CSV row: a station as seen at `timestamp`.
#[derive(Debug, Serialize)]
struct SnapshotRow<'a> {
    timestamp: DateTime<Utc>,
    source: &'a str,
    code: &'a str,
    name: &'a str,
    #[serde(rename = "type")]
    receiver_type: &'a str,
    latitude: f64,
    longitude: f64,
    height: Option<f64>,
    health: HealthState,
}

/// Writes `value` as pretty-printed JSON followed by a newline.
pub fn write_json<W: Write>(mut writer: W, value: &impl Serialize) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, value)?;
    writeln!(writer)?;
    Ok(())
}

/// Appends one row per station to a CSV file, all stamped with `timestamp`.
///
/// Creates the file (and its parent directory) if needed. The header row is
/// written whenever the file is still empty. Returns the number of rows written.
pub fn append_snapshot(
    path: &str,
    timestamp: DateTime<Utc>,
    stations: &[Station],
) -> Result<usize> {
    let path_ref = Path::new(path);
    if let Some(parent) = path_ref.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new().append(true).create(true).open(path)?;
    let needs_header = file.metadata()?.len() == 0;
    debug!(path, needs_header, rows = stations.len(), "Appending CSV snapshot");

    // csv emits the header with the first serialized row, so an empty
    // snapshot leaves the file empty and the next append still writes it
    let mut writer = WriterBuilder::new().has_headers(needs_header).from_writer(file);

    for station in stations {
        writer.serialize(SnapshotRow {
            timestamp,
            source: &station.source,
            code: &station.code,
            name: &station.name,
            receiver_type: &station.receiver_type,
            latitude: station.latitude,
            longitude: station.longitude,
            height: station.height,
            health: station.health,
        })?;
    }
    writer.flush()?;

    Ok(stations.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn station(code: &str, height: Option<f64>) -> Station {
        Station {
            code: code.to_string(),
            name: format!("{code}, India"),
            receiver_type: "SEPT".to_string(),
            latitude: 28.7,
            longitude: 77.1,
            height,
            health: HealthState::Degraded,
            source: "SBC".to_string(),
        }
    }

    #[test]
    fn test_write_json() {
        let mut buf = Vec::new();
        write_json(&mut buf, &vec![station("A", None)]).unwrap();

        let text = String::from_utf8(buf).unwrap();
        assert!(text.ends_with('\n'));
        let parsed: Vec<Station> = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed[0].code, "A");
    }

    #[test]
    fn test_append_snapshot_creates_file_and_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/snapshots.csv");
        let path = path.to_str().unwrap();

        let written = append_snapshot(path, Utc::now(), &[station("A", Some(1.0))]).unwrap();

        assert_eq!(written, 1);
        let content = fs::read_to_string(path).unwrap();
        assert!(
            content.starts_with("timestamp,source,code,name,type,latitude,longitude,height,health")
        );
        assert!(content.contains("\"A, India\""));
        assert!(content.contains("DEGRADED"));
    }

    #[test]
    fn test_append_snapshot_writes_header_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshots.csv");
        let path = path.to_str().unwrap();

        append_snapshot(path, Utc::now(), &[station("A", None), station("B", None)]).unwrap();
        append_snapshot(path, Utc::now(), &[station("C", Some(3.0))]).unwrap();

        let content = fs::read_to_string(path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        // 1 header + 3 data rows
        assert_eq!(lines.len(), 4);
        let header_count = lines.iter().filter(|l| l.starts_with("timestamp")).count();
        assert_eq!(header_count, 1);
    }

    #[test]
    fn test_empty_snapshot_first_keeps_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshots.csv");
        let path = path.to_str().unwrap();

        assert_eq!(append_snapshot(path, Utc::now(), &[]).unwrap(), 0);
        append_snapshot(path, Utc::now(), &[station("A", Some(1.0))]).unwrap();
        append_snapshot(path, Utc::now(), &[station("B", None)]).unwrap();

        let content = fs::read_to_string(path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("timestamp,source,code"));
        assert!(lines[1].contains("\"A, India\""));
        assert!(!lines[2].starts_with("timestamp"));
    }
}
