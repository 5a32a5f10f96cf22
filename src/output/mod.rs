//! Output module for VK Relink
//!
//! This module turns what the crawler does into something a shell can show:
//! - Progress events delivered through a pluggable sink
//! - Per-community reports and the final run summary

mod progress;
mod stats;

pub use progress::{ProgressSink, Reporter, RunEvent};
pub use stats::{CommunityReport, CommunityStatus, RunSummary};
