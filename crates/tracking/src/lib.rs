//! Tracking crate - Synchronization engine for fleet tracker dashboards
//!
//! This crate provides the platform-independent core of the dashboard:
//! - Credential resolution (session token, hash token, fallback key)
//! - Navixy API client with params/header auth fallback and timeouts
//! - Roster, state and zone fetching with response normalization
//! - Motion classification (moving / idle / dwelling)
//! - Poll scheduler with overlap prevention and published snapshots
//!
//! Rendering (map, table, CSV) lives outside this crate and consumes the
//! published [`Snapshot`] values.

pub mod classify;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod models;
pub mod navixy;
pub mod sync;

pub use classify::{Thresholds, classify, classify_state, minutes_since, motion_status, parse_timestamp};
pub use config::{AuthParams, Cluster, EngineOptions, Settings};
pub use diagnostics::{AttemptOutcome, DiagnosticsSink, LogDiagnostics, RecordingDiagnostics, RequestEvent};
pub use error::{ErrorKind, ErrorRecord, RequestError};
pub use models::{
    ClassifiedState, CycleStatus, Location, MotionStatus, PollResult, RowData, Tracker,
    TrackerId, TrackerRow, TrackerState, Zone, ZoneId,
};
pub use navixy::{
    AuthStrategy, Credentials, HttpRequest, Method, RequestClient, TrackerFetcher, Transport,
    UreqTransport, resolve,
};
pub use sync::{CycleOutcome, PollScheduler, SchedulerOptions, Snapshot, run_cycle};
