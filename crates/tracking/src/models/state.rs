//! Tracker state snapshots and their motion classification

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{TrackerId, ZoneId};

/// A GPS fix
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    /// Build a location, rejecting non-finite coordinates
    pub fn new(lat: f64, lng: f64) -> Option<Self> {
        (lat.is_finite() && lng.is_finite()).then_some(Self { lat, lng })
    }
}

/// Latest reported state for a single tracker
///
/// A state without a location is valid ("no fix") and must never be dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerState {
    pub tracker_id: TrackerId,
    pub location: Option<Location>,
    /// Speed in km/h; always non-negative when present
    pub speed: Option<f64>,
    /// Raw `updated` timestamp as reported by the provider
    pub last_updated: Option<String>,
    pub zone_ids: Vec<ZoneId>,
}

impl TrackerState {
    pub fn new(tracker_id: impl Into<TrackerId>) -> Self {
        Self {
            tracker_id: tracker_id.into(),
            location: None,
            speed: None,
            last_updated: None,
            zone_ids: Vec::new(),
        }
    }

    pub fn with_location(mut self, lat: f64, lng: f64) -> Self {
        self.location = Location::new(lat, lng);
        self
    }

    /// Set the speed; negative or non-finite readings are treated as absent
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = (speed.is_finite() && speed >= 0.0).then_some(speed);
        self
    }

    pub fn with_last_updated(mut self, updated: impl Into<String>) -> Self {
        self.last_updated = Some(updated.into());
        self
    }

    pub fn with_zone_ids(mut self, zone_ids: Vec<ZoneId>) -> Self {
        self.zone_ids = zone_ids;
        self
    }

    /// Whether the tracker reported a usable GPS fix
    pub fn has_fix(&self) -> bool {
        self.location.is_some()
    }

    /// Parsed `last_updated`, or `None` if absent or unparseable
    pub fn last_updated_at(&self) -> Option<DateTime<Utc>> {
        self.last_updated
            .as_deref()
            .and_then(crate::classify::parse_timestamp)
    }
}

/// Motion status derived from speed and report age
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionStatus {
    Moving,
    Idle,
    Dwelling,
    Unknown,
}

impl MotionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MotionStatus::Moving => "moving",
            MotionStatus::Idle => "idle",
            MotionStatus::Dwelling => "dwelling",
            MotionStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for MotionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tracker state together with its computed motion status
///
/// Built by [`crate::classify::classify_state`]; the status is fixed at
/// construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedState {
    state: TrackerState,
    status: MotionStatus,
    minutes_since_update: Option<i64>,
    zone_labels: Vec<String>,
}

impl ClassifiedState {
    pub(crate) fn new(
        state: TrackerState,
        status: MotionStatus,
        minutes_since_update: Option<i64>,
    ) -> Self {
        Self {
            state,
            status,
            minutes_since_update,
            zone_labels: Vec::new(),
        }
    }

    pub(crate) fn with_zone_labels(mut self, zone_labels: Vec<String>) -> Self {
        self.zone_labels = zone_labels;
        self
    }

    pub fn state(&self) -> &TrackerState {
        &self.state
    }

    pub fn tracker_id(&self) -> &TrackerId {
        &self.state.tracker_id
    }

    pub fn status(&self) -> MotionStatus {
        self.status
    }

    /// Whole minutes since the last report, if the timestamp parsed
    pub fn minutes_since_update(&self) -> Option<i64> {
        self.minutes_since_update
    }

    /// Labels of the zones the tracker is currently in, in `zone_ids` order
    pub fn zone_labels(&self) -> &[String] {
        &self.zone_labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_finite_location_is_no_fix() {
        let state = TrackerState::new("1").with_location(f64::NAN, 30.0);
        assert!(!state.has_fix());

        let state = TrackerState::new("1").with_location(-29.95, 30.95);
        assert!(state.has_fix());
    }

    #[test]
    fn test_negative_speed_is_absent() {
        assert_eq!(TrackerState::new("1").with_speed(-3.0).speed, None);
        assert_eq!(TrackerState::new("1").with_speed(0.0).speed, Some(0.0));
    }

    #[test]
    fn test_status_display() {
        assert_eq!(MotionStatus::Dwelling.to_string(), "dwelling");
        assert_eq!(MotionStatus::Unknown.as_str(), "unknown");
    }

    #[test]
    fn test_last_updated_at_unparseable() {
        let state = TrackerState::new("1").with_last_updated("yesterday-ish");
        assert!(state.last_updated_at().is_none());
    }
}
