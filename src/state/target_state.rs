/// Target state definitions for tracking crawl progress
///
/// Every URL identity moves forward only: `Unseen` → `Queued` → `Fetched`
/// (or `Failed`). `Rejected` is reached directly from `Unseen` when the scope
/// refuses a link.
use std::fmt;

/// Represents the state of a URL identity within one crawl session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetState {
    /// Never encountered in this session
    Unseen,

    /// Accepted into the frontier and waiting to be (or being) fetched
    Queued,

    /// Successfully fetched and extracted
    Fetched,

    /// Fetch attempted once and failed; never retried
    Failed,

    /// Discarded by the scope rule; never re-evaluated
    Rejected,
}

impl TargetState {
    /// Returns true if an identity in this state may be enqueued
    pub fn is_enqueueable(&self) -> bool {
        matches!(self, Self::Unseen)
    }

    /// Returns true if no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Fetched | Self::Failed | Self::Rejected)
    }

    /// Returns true if the forward-only state machine allows `self -> next`
    pub fn can_transition_to(&self, next: TargetState) -> bool {
        matches!(
            (self, next),
            (Self::Unseen, Self::Queued)
                | (Self::Unseen, Self::Rejected)
                | (Self::Queued, Self::Fetched)
                | (Self::Queued, Self::Failed)
        )
    }

    /// Short lowercase label used in logs and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unseen => "unseen",
            Self::Queued => "queued",
            Self::Fetched => "fetched",
            Self::Failed => "failed",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for TargetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
