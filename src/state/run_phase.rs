/// Run phase definitions
///
/// A run moves `Idle -> Running -> (Cancelling) -> Done`.
use std::fmt;

/// Lifecycle phase of one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunPhase {
    /// Created, worker not started yet
    Idle,
    /// Walking communities
    Running,
    /// Stop requested; the current community finishes first
    Cancelling,
    /// Summary emitted
    Done,
}

impl RunPhase {
    /// Returns true if moving from `self` to `next` is a legal step
    pub fn can_transition_to(&self, next: RunPhase) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Running)
                | (Self::Running, Self::Cancelling)
                | (Self::Running, Self::Done)
                | (Self::Cancelling, Self::Done)
        )
    }

    /// Returns true while the worker may still issue remote calls
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Running | Self::Cancelling)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Cancelling => "cancelling",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
