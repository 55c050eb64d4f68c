//! Station health classification.
//!
//! Each vendor reports station health differently: SBC exposes three
//! independent flags, Trimble a single integer code. Both are folded into
//! one [`HealthState`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Trimble health code meaning "sensor healthy" unless configured otherwise.
pub const DEFAULT_TRIMBLE_HEALTHY_CODE: i64 = 1;

/// Operational state of a station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HealthState {
    /// Connected, used for processing and receiving data.
    Online,
    /// Connected and used for processing, but no data is arriving.
    Degraded,
    /// Not connected, or not enough signal to say anything better.
    Offline,
}

impl HealthState {
    pub const ALL: [HealthState; 3] = [
        HealthState::Online,
        HealthState::Degraded,
        HealthState::Offline,
    ];

    /// Display priority; higher is more urgent. Degraded outranks offline.
    pub fn urgency(self) -> u8 {
        match self {
            HealthState::Online => 0,
            HealthState::Offline => 1,
            HealthState::Degraded => 2,
        }
    }

    /// Wire label, identical to the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            HealthState::Online => "ONLINE",
            HealthState::Degraded => "DEGRADED",
            HealthState::Offline => "OFFLINE",
        }
    }

    /// Marker colour used by the map legend.
    pub fn marker_color(self) -> &'static str {
        match self {
            HealthState::Online => "green",
            HealthState::Degraded => "orange",
            HealthState::Offline => "red",
        }
    }
}

impl fmt::Display for HealthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies an SBC-style station from its three status flags.
///
/// | connected | used for processing | receiving data | state    |
/// |-----------|---------------------|----------------|----------|
/// | true      | true                | true           | ONLINE   |
/// | true      | true                | false          | DEGRADED |
/// | any other combination |                  |                | OFFLINE  |
pub fn classify_flagged(
    connected: bool,
    used_for_processing: bool,
    receiving_data: bool,
) -> HealthState {
    match (connected, used_for_processing, receiving_data) {
        (true, true, true) => HealthState::Online,
        (true, true, false) => HealthState::Degraded,
        _ => HealthState::Offline,
    }
}

/// Classifies a Trimble-style station from its sensor health code.
///
/// A missing code or `0` is offline, `healthy_code` is online, and anything
/// else is degraded so that unknown codes never show up as healthy.
pub fn classify_coded(code: Option<i64>, healthy_code: i64) -> HealthState {
    match code {
        None | Some(0) => HealthState::Offline,
        Some(c) if c == healthy_code => HealthState::Online,
        Some(_) => HealthState::Degraded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_flagged_named_cases() {
        assert_eq!(classify_flagged(true, true, true), HealthState::Online);
        assert_eq!(classify_flagged(true, true, false), HealthState::Degraded);
        assert_eq!(classify_flagged(false, false, false), HealthState::Offline);
    }

    #[test]
    fn test_classify_flagged_is_total() {
        let mut online = 0;
        let mut degraded = 0;
        let mut offline = 0;

        for connected in [false, true] {
            for processing in [false, true] {
                for receiving in [false, true] {
                    match classify_flagged(connected, processing, receiving) {
                        HealthState::Online => online += 1,
                        HealthState::Degraded => degraded += 1,
                        HealthState::Offline => offline += 1,
                    }
                }
            }
        }

        assert_eq!((online, degraded, offline), (1, 1, 6));
    }

    #[test]
    fn test_not_used_for_processing_is_offline() {
        assert_eq!(classify_flagged(true, false, true), HealthState::Offline);
        assert_eq!(classify_flagged(false, true, true), HealthState::Offline);
    }

    #[test]
    fn test_classify_coded() {
        assert_eq!(classify_coded(None, 1), HealthState::Offline);
        assert_eq!(classify_coded(Some(0), 1), HealthState::Offline);
        assert_eq!(classify_coded(Some(1), 1), HealthState::Online);
        assert_eq!(classify_coded(Some(2), 1), HealthState::Degraded);
        assert_eq!(classify_coded(Some(-7), 1), HealthState::Degraded);
        assert_eq!(classify_coded(Some(1), 3), HealthState::Degraded);
        assert_eq!(classify_coded(Some(3), 3), HealthState::Online);
    }

    #[test]
    fn test_degraded_is_most_urgent() {
        let most_urgent = HealthState::ALL
            .into_iter()
            .max_by_key(|h| h.urgency())
            .unwrap();
        assert_eq!(most_urgent, HealthState::Degraded);
    }

    #[test]
    fn test_serde_labels() {
        assert_eq!(
            serde_json::to_string(&HealthState::Degraded).unwrap(),
            "\"DEGRADED\""
        );
        let parsed: HealthState = serde_json::from_str("\"ONLINE\"").unwrap();
        assert_eq!(parsed, HealthState::Online);
        assert_eq!(HealthState::Offline.to_string(), "OFFLINE");
    }
}
