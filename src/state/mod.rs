//! State module for tracking run progress
//!
//! # Components
//!
//! - `RunPhase`: lifecycle of a run (idle, running, cancelling, done)
//! - `RunControl`: cancellation flag and phase shared with the controller
//! - `RunState`: per-community counters owned by the orchestrator

mod run_phase;
mod run_state;

// Re-export main types
pub use run_phase::RunPhase;
pub use run_state::{RunControl, RunState};
