use thiserror::Error;

/// Everything the core can refuse to do. All variants are recoverable and
/// carry enough context for a user-facing message; none abort the process.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchedulerError {
    #[error("invalid judging window: {reason}")]
    InvalidWindow { reason: String },

    #[error("malformed match data: {reason}")]
    MalformedMatchData { reason: String },

    #[error("schedule is locked after printing")]
    ScheduleLocked,

    #[error("no-show schedule is locked after printing")]
    NoShowScheduleLocked,

    #[error("status edits are only allowed after the schedule has been printed")]
    EditBeforePrint,

    #[error("team {0} has no slot in the active schedule")]
    UnknownTeam(String),

    #[error("no schedule with id {0}")]
    UnknownSchedule(String),

    #[error("no schedule has been generated yet")]
    NoScheduleGenerated,

    #[error("no schedule to snapshot")]
    NothingToPrint,

    #[error("no no-show teams to schedule")]
    NoShowQueueEmpty,

    #[error("no gaps available for no-show teams")]
    NoGapsAvailable,
}

impl SchedulerError {
    pub fn invalid_window(reason: impl Into<String>) -> Self {
        SchedulerError::InvalidWindow {
            reason: reason.into(),
        }
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        SchedulerError::MalformedMatchData {
            reason: reason.into(),
        }
    }
}
