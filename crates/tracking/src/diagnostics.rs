//! Diagnostic events for API request attempts
//!
//! The request client reports every attempt (strategy used and outcome) to a
//! [`DiagnosticsSink`]. Events never carry credential material.

use chrono::{DateTime, Utc};
use log::{debug, warn};
use std::sync::RwLock;

use crate::navixy::{AuthStrategy, Method};

/// Outcome of a single request attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// Response did not carry a failure marker
    Succeeded,
    /// Response carried `success: false`
    Rejected,
    /// Network failure or unreadable response
    TransportFailed(String),
    /// The call's timeout elapsed while this attempt was in flight
    TimedOut,
}

impl AttemptOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, AttemptOutcome::Succeeded)
    }
}

/// One request attempt as reported to diagnostics
#[derive(Debug, Clone, PartialEq)]
pub struct RequestEvent {
    pub at: DateTime<Utc>,
    pub method: Method,
    pub path: String,
    pub strategy: AuthStrategy,
    pub outcome: AttemptOutcome,
}

impl RequestEvent {
    pub fn new(method: Method, path: &str, strategy: AuthStrategy, outcome: AttemptOutcome) -> Self {
        Self {
            at: Utc::now(),
            method,
            path: path.to_string(),
            strategy,
            outcome,
        }
    }
}

/// Receiver of request diagnostics (debug panel, log, test recorder)
pub trait DiagnosticsSink: Send + Sync {
    fn on_event(&self, event: &RequestEvent);
}

/// Sink that forwards events to the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDiagnostics;

impl DiagnosticsSink for LogDiagnostics {
    fn on_event(&self, event: &RequestEvent) {
        match &event.outcome {
            AttemptOutcome::Succeeded => debug!(
                "{} {} via {} auth: ok",
                event.method, event.path, event.strategy
            ),
            AttemptOutcome::Rejected => warn!(
                "{} {} via {} auth: rejected by backend",
                event.method, event.path, event.strategy
            ),
            AttemptOutcome::TransportFailed(message) => warn!(
                "{} {} via {} auth: transport failure: {}",
                event.method, event.path, event.strategy, message
            ),
            AttemptOutcome::TimedOut => warn!(
                "{} {} via {} auth: timed out",
                event.method, event.path, event.strategy
            ),
        }
    }
}

/// Sink that keeps events in memory
///
/// Used by tests and by UI debug panels that show recent request history.
#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
    events: RwLock<Vec<RequestEvent>>,
}

impl RecordingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded events, oldest first
    pub fn events(&self) -> Vec<RequestEvent> {
        self.events.read().map(|e| e.clone()).unwrap_or_default()
    }

    /// Number of recorded attempts that used `strategy`
    pub fn attempts_with(&self, strategy: AuthStrategy) -> usize {
        self.events
            .read()
            .map(|e| e.iter().filter(|ev| ev.strategy == strategy).count())
            .unwrap_or(0)
    }
}

impl DiagnosticsSink for RecordingDiagnostics {
    fn on_event(&self, event: &RequestEvent) {
        if let Ok(mut guard) = self.events.write() {
            guard.push(event.clone());
        }
    }
}
