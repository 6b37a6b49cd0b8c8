//! Polling engine for tracker data
//!
//! A cycle fetches the roster, states and zones, classifies every state and
//! publishes the result. The scheduler runs cycles on an interval, never more
//! than one at a time.

mod cycle;
mod scheduler;

pub use cycle::{CycleOutcome, run_cycle};
pub use scheduler::{PollScheduler, SchedulerOptions, Snapshot};
