//! One poll cycle: roster → states → zones → classify → reconcile

use chrono::{DateTime, Utc};
use log::{debug, error, warn};
use std::collections::{BTreeMap, HashMap};

use crate::classify::{Thresholds, classify_state};
use crate::error::ErrorRecord;
use crate::models::{ClassifiedState, CycleStatus, PollResult, TrackerId, TrackerState, Zone, ZoneId};
use crate::navixy::{TrackerFetcher, Transport};

/// Everything a cycle produces, before it is published
#[derive(Debug, Clone)]
pub struct CycleOutcome {
    pub result: PollResult,
    pub status: CycleStatus,
    /// Whether the roster call reached the backend successfully
    pub roster_ok: bool,
}

/// Run a single poll cycle
///
/// Steps run strictly in order because the state fetch needs the roster's id
/// set. A roster or state failure ends the cycle as `Failed` but still
/// returns whatever was gathered. A zone failure is non-fatal: `cached_zones`
/// (from the previous result) are used instead.
///
/// # Arguments
/// * `fetcher` - Tracker fetcher bound to the active cluster and credentials
/// * `thresholds` - Classification thresholds
/// * `cached_zones` - Zones from the last published result
pub async fn run_cycle<T: Transport>(
    fetcher: &TrackerFetcher<T>,
    thresholds: &Thresholds,
    cached_zones: &[Zone],
) -> CycleOutcome {
    let started = Utc::now();
    let mut result = PollResult::new(started);

    // 1. Roster
    let trackers = match fetcher.fetch_roster().await {
        Ok(trackers) => trackers,
        Err(e) => {
            error!("Roster fetch failed: {}", e);
            result.zones = cached_zones.to_vec();
            result.errors.push(ErrorRecord::from_request(&e));
            return CycleOutcome {
                result,
                status: CycleStatus::Failed,
                roster_ok: false,
            };
        }
    };
    result.trackers = trackers;

    // 2. States for the roster's ids
    let ids: Vec<TrackerId> = result.trackers.iter().map(|t| t.id.clone()).collect();
    let states = match fetcher.fetch_states(&ids).await {
        Ok(states) => states,
        Err(e) => {
            error!("State fetch failed: {}", e);
            result.zones = cached_zones.to_vec();
            result.errors.push(ErrorRecord::from_request(&e));
            return CycleOutcome {
                result,
                status: CycleStatus::Failed,
                roster_ok: true,
            };
        }
    };

    // 3. Zones, falling back to the cached list
    result.zones = match fetcher.fetch_zones().await {
        Ok(zones) => zones,
        Err(e) => {
            warn!("Zone fetch failed, keeping {} cached zones: {}", cached_zones.len(), e);
            result.errors.push(ErrorRecord::from_request(&e));
            cached_zones.to_vec()
        }
    };

    // 4. Classify and reconcile against the roster
    let now = Utc::now();
    let (classified, missing) = reconcile(&ids, states, &result.zones, thresholds, now);
    result.states = classified;
    result
        .errors
        .extend(missing.iter().map(ErrorRecord::partial_data));

    let status = if result.has_errors() {
        CycleStatus::Partial
    } else {
        CycleStatus::Ok
    };

    debug!(
        "Cycle finished: {} trackers, {} states, {} errors",
        result.trackers.len(),
        result.states.len(),
        result.errors.len()
    );

    CycleOutcome {
        result,
        status,
        roster_ok: true,
    }
}

/// Classify states and align them with the roster
///
/// States for ids not in the roster are dropped, so published ids are always
/// a subset of the roster. Returns the classified states and the roster ids
/// that had no state, in roster order.
fn reconcile(
    roster_ids: &[TrackerId],
    mut states: HashMap<TrackerId, TrackerState>,
    zones: &[Zone],
    thresholds: &Thresholds,
    now: DateTime<Utc>,
) -> (BTreeMap<TrackerId, ClassifiedState>, Vec<TrackerId>) {
    let labels: HashMap<&ZoneId, &str> = zones.iter().map(|z| (&z.id, z.label.as_str())).collect();

    let mut classified = BTreeMap::new();
    let mut missing = Vec::new();

    for id in roster_ids {
        match states.remove(id) {
            Some(state) => {
                let zone_labels = state
                    .zone_ids
                    .iter()
                    .filter_map(|zid| labels.get(zid).map(|l| l.to_string()))
                    .collect();
                let entry = classify_state(state, now, thresholds).with_zone_labels(zone_labels);
                classified.insert(id.clone(), entry);
            }
            None => missing.push(id.clone()),
        }
    }

    if !states.is_empty() {
        debug!("Dropping {} states for trackers not in the roster", states.len());
    }

    (classified, missing)
}
