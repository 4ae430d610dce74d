//! Specialty coordination.
//!
//! The fan-out/fan-in engine: partition the working context by specialist
//! profile, run one model call per specialty concurrently, parse each
//! reply, and reduce the results into a single report or priority
//! decision. Fan-out is join-all with propagate-first-error semantics;
//! there is no partial-results path.

pub mod health;
pub mod triage;

pub use health::HealthCoordinator;
pub use triage::{HealthTrends, TriageCoordinator};
