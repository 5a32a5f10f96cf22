//! Crawler module for walking community walls and rewriting links
//!
//! This module contains the core run logic, including:
//! - Paginated traversal of posts, comments and threads
//! - Literal link substitution and conditional edits
//! - Sequencing of communities with cooperative cancellation
//! - The start/stop boundary used by shells

mod committer;
mod coordinator;
mod walker;

pub use committer::{attachment_list, substitute, Committer, EditOutcome, EditTarget, TargetKind};
pub use coordinator::{Orchestrator, RunHandle, Runner};
pub use walker::Walker;

use crate::config::{Config, RunParams};
use crate::output::RunSummary;
use crate::Result;

/// Runs a complete link replacement and waits for its summary
///
/// This is the simplest entry point: it starts a run over HTTP and
/// discards progress events (they are still logged through `tracing`).
///
/// # Arguments
///
/// * `config` - Endpoint, limits and retry configuration
/// * `params` - Token, links and community identifiers
///
/// # Returns
///
/// * `Ok(RunSummary)` - The run reached its end (possibly with per-community failures)
/// * `Err(RelinkError)` - The run could not start
pub async fn relink(config: Config, params: RunParams) -> Result<RunSummary> {
    let runner = Runner::new(config);
    let handle = runner.start(params)?;
    handle.wait().await
}
