use chrono::Duration;

use super::error::SchedulerError;
use super::types::{SchedulerConfig, Slot};

/// Generates the full slot grid: one contiguous run of slots per judge pair,
/// spanning the judging window. Slot k starts at `start + k * slot_minutes`.
/// If the window is not an even multiple of the slot length, the final slot
/// is truncated to the window end and kept as usable capacity.
pub fn build_slots(config: &SchedulerConfig) -> Result<Vec<Slot>, SchedulerError> {
    if config.judge_pairs == 0 {
        return Err(SchedulerError::invalid_window(
            "at least one judge pair is required",
        ));
    }
    if config.slot_minutes <= 0 {
        return Err(SchedulerError::invalid_window(
            "slot length must be positive",
        ));
    }
    if config.end_time <= config.start_time {
        return Err(SchedulerError::invalid_window(
            "judging end time must be after the start time",
        ));
    }

    let step = Duration::minutes(config.slot_minutes);
    let mut slots = Vec::new();
    for judge_id in 1..=config.judge_pairs {
        let mut start = config.start_time;
        while start < config.end_time {
            let end = std::cmp::min(start + step, config.end_time);
            slots.push(Slot::new(judge_id, start, end));
            start = end;
        }
    }
    Ok(slots)
}
