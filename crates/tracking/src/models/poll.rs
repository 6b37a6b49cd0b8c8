//! Poll results published to rendering collaborators

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use super::{ClassifiedState, Tracker, TrackerId, Zone};
use crate::error::ErrorRecord;

/// Overall outcome of a poll cycle, shown as the status badge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleStatus {
    /// Every fetch succeeded and every tracker reported
    Ok,
    /// Data was published but some trackers or zones are missing
    Partial,
    /// Roster or state fetch failed
    Failed,
}

/// Result of one fetch + classify pass
#[derive(Debug, Clone, Serialize)]
pub struct PollResult {
    pub timestamp: DateTime<Utc>,
    /// Roster in the order the backend returned it
    pub trackers: Vec<Tracker>,
    /// Classified states keyed by tracker id; ids are a subset of `trackers`
    pub states: BTreeMap<TrackerId, ClassifiedState>,
    pub zones: Vec<Zone>,
    pub errors: Vec<ErrorRecord>,
}

impl PollResult {
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            trackers: Vec::new(),
            states: BTreeMap::new(),
            zones: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Trackers in the roster that have no state entry
    pub fn missing_trackers(&self) -> impl Iterator<Item = &Tracker> {
        self.trackers
            .iter()
            .filter(|t| !self.states.contains_key(&t.id))
    }

    /// One row per roster entry, in roster order
    ///
    /// Trackers without a state entry appear as [`RowData::NoData`] rather
    /// than being omitted.
    pub fn rows(&self) -> Vec<TrackerRow<'_>> {
        self.trackers
            .iter()
            .map(|tracker| TrackerRow {
                tracker,
                data: match self.states.get(&tracker.id) {
                    Some(state) => RowData::Reported(state),
                    None => RowData::NoData,
                },
            })
            .collect()
    }
}

/// State half of a [`TrackerRow`]
#[derive(Debug, Clone, Copy)]
pub enum RowData<'a> {
    Reported(&'a ClassifiedState),
    NoData,
}

/// A reconciled tracker + state pair for table, map and CSV consumers
#[derive(Debug, Clone, Copy)]
pub struct TrackerRow<'a> {
    pub tracker: &'a Tracker,
    pub data: RowData<'a>,
}

impl<'a> TrackerRow<'a> {
    pub fn state(&self) -> Option<&'a ClassifiedState> {
        match self.data {
            RowData::Reported(state) => Some(state),
            RowData::NoData => None,
        }
    }

    /// Short status text: motion status, "no fix" or "no data"
    pub fn status_text(&self) -> &'static str {
        match self.data {
            RowData::NoData => "no data",
            RowData::Reported(state) if !state.state().has_fix() => "no fix",
            RowData::Reported(state) => state.status().as_str(),
        }
    }
}
