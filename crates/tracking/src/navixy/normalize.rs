//! Navixy API response normalization
//!
//! Converts API records to domain models. Provider data is noisy: fields go
//! missing, coordinates arrive partially, and speed may be negative on some
//! devices. Normalization never fails; bad values become `None`.

use super::api::{ApiState, ApiTracker, ApiZone};
use crate::models::{Location, Tracker, TrackerId, TrackerState, Zone};

/// Normalize a roster entry; `label` falls back to `name`
pub fn normalize_tracker(api: ApiTracker) -> Tracker {
    let label = [api.label, api.name]
        .into_iter()
        .flatten()
        .map(|l| l.trim().to_string())
        .find(|l| !l.is_empty());

    Tracker { id: api.id, label }
}

/// Normalize a state entry keyed by `tracker_id`
///
/// The top-level `updated` wins over `gps.updated`; zone ids are read from the
/// GPS block first, then from the top level.
pub fn normalize_state(tracker_id: TrackerId, api: ApiState) -> TrackerState {
    let gps = api.gps.unwrap_or_default();

    let location = gps
        .location
        .and_then(|loc| Location::new(loc.lat?, loc.lng?));

    let speed = gps.speed.filter(|s| s.is_finite() && *s >= 0.0);

    let present = |u: &String| !u.trim().is_empty();
    let last_updated = api.updated.filter(present).or(gps.updated.filter(present));

    let zone_ids = gps.zone_ids.or(api.zone_ids).unwrap_or_default();

    TrackerState {
        tracker_id,
        location,
        speed,
        last_updated,
        zone_ids,
    }
}

/// Normalize a zone entry; unlabeled zones are shown by id
pub fn normalize_zone(api: ApiZone) -> Zone {
    let label = api
        .label
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .unwrap_or_else(|| format!("Zone {}", api.id));

    Zone { id: api.id, label }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ZoneId;
    use serde_json::json;

    fn api_state(value: serde_json::Value) -> ApiState {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_tracker_label_falls_back_to_name() {
        let api: ApiTracker = serde_json::from_value(json!({"id": 5, "name": "Truck 5"})).unwrap();
        let tracker = normalize_tracker(api);
        assert_eq!(tracker.id.as_str(), "5");
        assert_eq!(tracker.label.as_deref(), Some("Truck 5"));

        let api: ApiTracker =
            serde_json::from_value(json!({"id": 6, "label": "", "name": ""})).unwrap();
        assert!(normalize_tracker(api).label.is_none());
    }

    #[test]
    fn test_full_state() {
        let state = normalize_state(
            TrackerId::new("1"),
            api_state(json!({
                "gps": {
                    "location": {"lat": -29.95, "lng": 30.95},
                    "speed": 62.0,
                    "updated": "2025-03-01 11:00:00",
                    "zone_ids": [3, 4]
                },
                "updated": "2025-03-01 11:05:00"
            })),
        );

        assert_eq!(state.location, Location::new(-29.95, 30.95));
        assert_eq!(state.speed, Some(62.0));
        assert_eq!(state.last_updated.as_deref(), Some("2025-03-01 11:05:00"));
        assert_eq!(state.zone_ids, vec![ZoneId::new("3"), ZoneId::new("4")]);
    }

    #[test]
    fn test_partial_state_is_kept_without_fix() {
        let state = normalize_state(
            TrackerId::new("2"),
            api_state(json!({"gps": {"location": {"lat": 1.0}, "speed": -5.0}})),
        );

        assert!(state.location.is_none());
        assert!(state.speed.is_none());
        assert!(state.last_updated.is_none());
        assert!(state.zone_ids.is_empty());
    }

    #[test]
    fn test_state_uses_gps_updated_when_top_level_missing() {
        let state = normalize_state(
            TrackerId::new("3"),
            api_state(json!({"gps": {"updated": "2025-03-01 10:00:00"}, "zone_ids": [9]})),
        );
        assert_eq!(state.last_updated.as_deref(), Some("2025-03-01 10:00:00"));
        assert_eq!(state.zone_ids, vec![ZoneId::new("9")]);
    }

    #[test]
    fn test_mistyped_fields_read_as_absent() {
        let state = normalize_state(
            TrackerId::new("4"),
            api_state(json!({
                "gps": {
                    "location": {"lat": 10.5, "lng": "east"},
                    "speed": null,
                    "updated": "2025-03-01 09:00:00"
                },
                "updated": 1700000000,
                "zone_ids": "none"
            })),
        );

        assert!(state.location.is_none());
        assert!(state.speed.is_none());
        assert_eq!(state.last_updated.as_deref(), Some("2025-03-01 09:00:00"));
        assert!(state.zone_ids.is_empty());

        let api: ApiTracker = serde_json::from_value(json!({"id": 8, "label": 42})).unwrap();
        assert!(normalize_tracker(api).label.is_none());
    }

    #[test]
    fn test_zone_without_label() {
        let zone = normalize_zone(serde_json::from_value(json!({"id": 12})).unwrap());
        assert_eq!(zone.label, "Zone 12");
    }
}
