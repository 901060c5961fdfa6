//! Deterministic doubles for the collaborator traits, used by unit and
//! behaviour tests across the workspace.

mod clock;
mod providers;
mod scheduler;
mod surface;

pub use clock::ManualClock;
pub use providers::{
    CountingReputationProvider, FnScorer, GatedFeatureFlags, StubRoutingProvider,
};
pub use scheduler::ManualScheduler;
pub use surface::RecordingSurface;

use chrono::{DateTime, FixedOffset, TimeDelta};

/// `at + delta`, saturating instead of overflowing.
pub(crate) fn add_std(at: DateTime<FixedOffset>, delta: std::time::Duration) -> DateTime<FixedOffset> {
    TimeDelta::from_std(delta)
        .ok()
        .and_then(|delta| at.checked_add_signed(delta))
        .unwrap_or(at)
}
