pub mod assign;
pub mod error;
pub mod gaps;
pub mod lifecycle;
pub mod match_index;
pub mod slot_grid;
pub mod types;

pub use assign::{assign, AssignOutcome};
pub use error::SchedulerError;
pub use gaps::{build_noshow_slots, find_gaps};
pub use lifecycle::{LifecycleState, OutcomeKind};
pub use match_index::MatchIndex;
pub use slot_grid::build_slots;
pub use types::{
    Gap, GapSuggestion, MatchBlock, MatchRecord, Schedule, ScheduleKind, SchedulerConfig, Slot,
    SlotStatus, TeamId,
};
