use std::collections::BTreeMap;

use serde::Serialize;

use crate::health::HealthState;
use crate::station::Station;

/// Legend counts for one station list.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StationSummary {
    pub total: usize,
    pub online: usize,
    pub degraded: usize,
    pub offline: usize,
    pub by_source: BTreeMap<String, usize>,
}

impl StationSummary {
    pub fn from_stations(stations: &[Station]) -> Self {
        let mut s = StationSummary {
            total: stations.len(),
            ..Default::default()
        };

        for station in stations {
            match station.health {
                HealthState::Online => s.online += 1,
                HealthState::Degraded => s.degraded += 1,
                HealthState::Offline => s.offline += 1,
            }
            *s.by_source.entry(station.source.clone()).or_insert(0) += 1;
        }

        s
    }

    pub fn count(&self, health: HealthState) -> usize {
        match health {
            HealthState::Online => self.online,
            HealthState::Degraded => self.degraded,
            HealthState::Offline => self.offline,
        }
    }

    pub fn pct(part: usize, total: usize) -> f64 {
        if total == 0 {
            0.0
        } else {
            (part as f64 / total as f64) * 100.0
        }
    }

    pub fn online_pct(&self) -> f64 {
        Self::pct(self.online, self.total)
    }
}
