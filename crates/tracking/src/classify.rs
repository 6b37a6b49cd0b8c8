//! Motion classification for tracker states
//!
//! Pure functions that can be tested without network or scheduler
//! dependencies. Rules, in order:
//! 1. Missing or unparseable `last_updated` → Unknown
//! 2. Minutes since update above the dwell threshold → Dwelling, at any speed
//! 3. Zero speed and minutes since update above the idle threshold → Idle
//! 4. Otherwise → Moving
//!
//! If the idle threshold is configured at or above the dwell threshold,
//! rule 2 is checked first and Dwelling wins. That precedence is intended;
//! [`Thresholds::is_ordered`] lets callers warn about such configurations.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{ClassifiedState, MotionStatus, TrackerState};

/// Provider timestamp format ("2024-03-01 14:05:09"), interpreted as UTC
const PROVIDER_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Classification thresholds in minutes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Reports older than this are Dwelling
    pub dwell_minutes: i64,
    /// Stationary trackers with reports older than this are Idle
    pub idle_minutes: i64,
}

impl Thresholds {
    pub const DEFAULT_DWELL_MINUTES: i64 = 30;
    pub const DEFAULT_IDLE_MINUTES: i64 = 10;

    pub fn new(dwell_minutes: i64, idle_minutes: i64) -> Self {
        Self {
            dwell_minutes,
            idle_minutes,
        }
    }

    /// `true` when idle < dwell, i.e. the Idle status is reachable
    pub fn is_ordered(&self) -> bool {
        self.idle_minutes < self.dwell_minutes
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DWELL_MINUTES, Self::DEFAULT_IDLE_MINUTES)
    }
}

/// Parse a provider timestamp
///
/// Accepts RFC 3339 and the provider's `YYYY-MM-DD HH:MM:SS` form.
/// Returns `None` for anything else; never panics.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(raw, PROVIDER_TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Whole minutes elapsed between `updated` and `now`, rounded down
pub fn minutes_since(updated: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - updated).num_seconds().div_euclid(60)
}

/// Motion status as a pure function of speed and report age
///
/// An absent speed counts as stationary.
pub fn motion_status(
    speed: Option<f64>,
    minutes_since_update: Option<i64>,
    thresholds: &Thresholds,
) -> MotionStatus {
    let Some(minutes) = minutes_since_update else {
        return MotionStatus::Unknown;
    };

    if minutes > thresholds.dwell_minutes {
        MotionStatus::Dwelling
    } else if speed.unwrap_or(0.0) == 0.0 && minutes > thresholds.idle_minutes {
        MotionStatus::Idle
    } else {
        MotionStatus::Moving
    }
}

/// Classify a tracker state at time `now`
pub fn classify(state: &TrackerState, now: DateTime<Utc>, thresholds: &Thresholds) -> MotionStatus {
    let minutes = state.last_updated_at().map(|at| minutes_since(at, now));
    motion_status(state.speed, minutes, thresholds)
}

/// Classify a tracker state and wrap it with the derived status
pub fn classify_state(
    state: TrackerState,
    now: DateTime<Utc>,
    thresholds: &Thresholds,
) -> ClassifiedState {
    let minutes = state.last_updated_at().map(|at| minutes_since(at, now));
    let status = motion_status(state.speed, minutes, thresholds);
    ClassifiedState::new(state, status, minutes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn state_updated_minutes_ago(now: DateTime<Utc>, minutes: i64, speed: f64) -> TrackerState {
        TrackerState::new("1")
            .with_speed(speed)
            .with_last_updated((now - Duration::minutes(minutes)).to_rfc3339())
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_stale_report_dwells_regardless_of_speed() {
        let state = state_updated_minutes_ago(now(), 31, 80.0);
        assert_eq!(classify(&state, now(), &Thresholds::default()), MotionStatus::Dwelling);
    }

    #[test]
    fn test_stationary_past_idle_threshold_is_idle() {
        let state = state_updated_minutes_ago(now(), 15, 0.0);
        assert_eq!(classify(&state, now(), &Thresholds::new(30, 10)), MotionStatus::Idle);
    }

    #[test]
    fn test_recent_moving_report() {
        let state = state_updated_minutes_ago(now(), 5, 40.0);
        assert_eq!(classify(&state, now(), &Thresholds::default()), MotionStatus::Moving);
    }

    #[test]
    fn test_stationary_within_idle_threshold_is_moving() {
        let state = state_updated_minutes_ago(now(), 10, 0.0);
        assert_eq!(classify(&state, now(), &Thresholds::default()), MotionStatus::Moving);
    }

    #[test]
    fn test_exactly_at_dwell_threshold_is_not_dwelling() {
        let state = state_updated_minutes_ago(now(), 30, 0.0);
        assert_eq!(classify(&state, now(), &Thresholds::default()), MotionStatus::Idle);
    }

    #[test]
    fn test_missing_speed_counts_as_stationary() {
        let state = TrackerState::new("1")
            .with_last_updated((now() - Duration::minutes(20)).to_rfc3339());
        assert_eq!(classify(&state, now(), &Thresholds::default()), MotionStatus::Idle);
    }

    #[test]
    fn test_unparseable_or_missing_timestamp_is_unknown() {
        let thresholds = Thresholds::default();
        for raw in ["", "not a date", "2025-13-45 99:99:99", "12/03/2025"] {
            let state = TrackerState::new("1").with_speed(0.0).with_last_updated(raw);
            assert_eq!(classify(&state, now(), &thresholds), MotionStatus::Unknown, "{raw}");
        }
        assert_eq!(
            classify(&TrackerState::new("1"), now(), &thresholds),
            MotionStatus::Unknown
        );
    }

    #[test]
    fn test_dwelling_wins_when_thresholds_inverted() {
        let thresholds = Thresholds::new(10, 30);
        assert!(!thresholds.is_ordered());

        let state = state_updated_minutes_ago(now(), 20, 0.0);
        assert_eq!(classify(&state, now(), &thresholds), MotionStatus::Dwelling);
    }

    #[test]
    fn test_parse_provider_format() {
        let parsed = parse_timestamp("2025-03-01 11:45:30").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 3, 1, 11, 45, 30).unwrap());
        assert_eq!(minutes_since(parsed, now()), 14);
    }

    #[test]
    fn test_minutes_since_rounds_down_for_future_reports() {
        let future = now() + Duration::seconds(30);
        assert_eq!(minutes_since(future, now()), -1);
        assert_eq!(motion_status(Some(0.0), Some(-1), &Thresholds::default()), MotionStatus::Moving);
    }

    #[test]
    fn test_classify_state_records_minutes() {
        let state = state_updated_minutes_ago(now(), 45, 12.0);
        let classified = classify_state(state, now(), &Thresholds::default());
        assert_eq!(classified.status(), MotionStatus::Dwelling);
        assert_eq!(classified.minutes_since_update(), Some(45));
    }
}
