//! Domain models for fleet tracking entities

mod poll;
mod state;
mod tracker;

pub use poll::{CycleStatus, PollResult, RowData, TrackerRow};
pub use state::{ClassifiedState, Location, MotionStatus, TrackerState};
pub use tracker::{Tracker, TrackerId, Zone, ZoneId};
