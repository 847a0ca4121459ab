//! Periodic scheduling of fan-out cycles.

mod cycle;
mod service;

pub use cycle::{Collaborators, CycleConfig, CycleReport, CycleSkip, FeedCycle, TenantOutcome};
pub use service::{CycleRunner, Scheduler, SchedulerConfig, SchedulerState};
