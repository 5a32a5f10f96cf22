use crate::output::{CommunityReport, RunSummary};
use crate::state::RunPhase;
use crate::RelinkError;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Cancellation flag and phase shared between a run and its controller
///
/// A fresh control is created for every run, so the flag starts cleared.
/// The flag is only polled between communities.
#[derive(Debug)]
pub struct RunControl {
    cancel: AtomicBool,
    phase: Mutex<RunPhase>,
}

impl RunControl {
    pub fn new() -> Self {
        Self {
            cancel: AtomicBool::new(false),
            phase: Mutex::new(RunPhase::Idle),
        }
    }

    /// Asks the run to stop before its next community
    pub fn request_stop(&self) {
        self.cancel.store(true, Ordering::SeqCst);
        let mut phase = self.lock_phase();
        if *phase == RunPhase::Running {
            *phase = RunPhase::Cancelling;
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    pub fn phase(&self) -> RunPhase {
        *self.lock_phase()
    }

    /// Moves to `next`, rejecting illegal steps
    pub fn transition(&self, next: RunPhase) -> Result<(), RelinkError> {
        let mut phase = self.lock_phase();
        if *phase == next {
            return Ok(());
        }
        if !phase.can_transition_to(next) {
            return Err(RelinkError::InvalidTransition {
                from: *phase,
                to: next,
            });
        }
        *phase = next;
        Ok(())
    }

    fn lock_phase(&self) -> MutexGuard<'_, RunPhase> {
        self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for RunControl {
    fn default() -> Self {
        Self::new()
    }
}

/// Counters accumulated by the orchestrator during one run
#[derive(Debug, Clone)]
pub struct RunState {
    started_at: DateTime<Utc>,
    communities_total: usize,
    reports: Vec<CommunityReport>,
    stopped_by_user: bool,
}

impl RunState {
    pub fn new(communities_total: usize) -> Self {
        Self {
            started_at: Utc::now(),
            communities_total,
            reports: Vec::with_capacity(communities_total),
            stopped_by_user: false,
        }
    }

    pub fn record(&mut self, report: CommunityReport) {
        self.reports.push(report);
    }

    pub fn mark_stopped(&mut self) {
        self.stopped_by_user = true;
    }

    pub fn into_summary(self) -> RunSummary {
        RunSummary {
            started_at: self.started_at,
            finished_at: Utc::now(),
            communities_total: self.communities_total,
            reports: self.reports,
            stopped_by_user: self.stopped_by_user,
        }
    }
}
