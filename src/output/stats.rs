//! Per-community and per-run statistics

use crate::community::OwnerId;
use crate::crawler::{EditOutcome, TargetKind};
use chrono::{DateTime, Utc};
use std::fmt;

/// How processing of one community ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommunityStatus {
    /// Every page of posts was walked
    Completed,
    /// The identifier could not be turned into an owner id
    Unresolved(String),
    /// Fetching a page of posts failed; pagination stopped there
    Aborted(String),
}

/// Counts collected while crawling one community
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommunityReport {
    pub identifier: String,
    pub owner_id: Option<OwnerId>,
    pub status: CommunityStatus,
    pub posts_seen: u64,
    pub posts_edited: u64,
    pub comments_seen: u64,
    pub comments_edited: u64,
    /// Edits that were needed but could not be committed
    pub edits_failed: u64,
    /// Posts whose comment pagination was abandoned after a failed fetch
    pub comment_fetch_failures: u64,
}

impl CommunityReport {
    pub fn new(identifier: impl Into<String>, owner_id: OwnerId) -> Self {
        Self {
            identifier: identifier.into(),
            owner_id: Some(owner_id),
            status: CommunityStatus::Completed,
            posts_seen: 0,
            posts_edited: 0,
            comments_seen: 0,
            comments_edited: 0,
            edits_failed: 0,
            comment_fetch_failures: 0,
        }
    }

    pub fn unresolved(identifier: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            owner_id: None,
            status: CommunityStatus::Unresolved(reason.into()),
            ..Self::new(identifier, OwnerId::new(0))
        }
    }

    /// Folds one edit outcome into the counters
    pub fn record(&mut self, outcome: &EditOutcome) {
        match outcome.kind {
            TargetKind::Post => self.posts_seen += 1,
            TargetKind::Comment => self.comments_seen += 1,
        }
        if !outcome.changed {
            return;
        }
        match (outcome.committed, outcome.kind) {
            (true, TargetKind::Post) => self.posts_edited += 1,
            (true, TargetKind::Comment) => self.comments_edited += 1,
            (false, _) => self.edits_failed += 1,
        }
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self.status, CommunityStatus::Unresolved(_))
    }
}

/// Outcome of a whole run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Communities requested, including those never reached
    pub communities_total: usize,
    /// One report per community reached, in input order
    pub reports: Vec<CommunityReport>,
    pub stopped_by_user: bool,
}

impl Default for RunSummary {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            started_at: now,
            finished_at: now,
            communities_total: 0,
            reports: Vec::new(),
            stopped_by_user: false,
        }
    }
}

impl RunSummary {
    pub fn posts_edited(&self) -> u64 {
        self.reports.iter().map(|r| r.posts_edited).sum()
    }

    pub fn comments_edited(&self) -> u64 {
        self.reports.iter().map(|r| r.comments_edited).sum()
    }

    pub fn edits_failed(&self) -> u64 {
        self.reports.iter().map(|r| r.edits_failed).sum()
    }

    pub fn unresolved(&self) -> usize {
        self.reports.iter().filter(|r| !r.is_resolved()).count()
    }

    pub fn aborted(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| matches!(r.status, CommunityStatus::Aborted(_)))
            .count()
    }

    /// Communities never started because the run was stopped
    pub fn skipped(&self) -> usize {
        self.communities_total.saturating_sub(self.reports.len())
    }

    pub fn report_for(&self, identifier: &str) -> Option<&CommunityReport> {
        self.reports.iter().find(|r| r.identifier == identifier)
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let elapsed = self.finished_at - self.started_at;
        write!(
            f,
            "{} of {} communities processed in {}s: {} posts and {} comments edited",
            self.reports.len(),
            self.communities_total,
            elapsed.num_seconds(),
            self.posts_edited(),
            self.comments_edited()
        )?;
        if self.edits_failed() > 0 {
            write!(f, ", {} edits failed", self.edits_failed())?;
        }
        if self.unresolved() > 0 {
            write!(f, ", {} unresolved", self.unresolved())?;
        }
        if self.aborted() > 0 {
            write!(f, ", {} interrupted by errors", self.aborted())?;
        }
        if self.stopped_by_user {
            write!(f, " (stopped by user, {} skipped)", self.skipped())?;
        }
        Ok(())
    }
}
