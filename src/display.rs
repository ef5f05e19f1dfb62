use std::fs::File;
use std::io::Write;

use crate::schedule::{Schedule, Slot, SlotStatus, TeamId};

fn slot_time(slot: &Slot) -> String {
    format!(
        "{}-{}",
        slot.start.format("%H:%M"),
        slot.end.format("%H:%M")
    )
}

fn slot_line(slot: &Slot) -> String {
    match &slot.team {
        Some(team) => {
            let marker = match slot.status {
                SlotStatus::Scheduled => "",
                SlotStatus::Checked => " [CHECKED]",
                SlotStatus::NoShow => " [NO-SHOW]",
                SlotStatus::Rescheduled => " [RESCHEDULED]",
            };
            format!("{} {}{}", slot_time(slot), team, marker)
        }
        None => format!("{} [EMPTY]", slot_time(slot)),
    }
}

/// Prints a schedule in a readable per-judge-pair format.
pub fn print_schedule(schedule: &Schedule, unassigned: &[TeamId]) {
    println!("\n=== {} ===", schedule.label);
    let assigned = schedule.slots.iter().filter(|s| s.team.is_some()).count();
    println!("Teams scheduled: {}", assigned);

    if !unassigned.is_empty() {
        println!("Unassigned teams ({}):", unassigned.len());
        for team in unassigned {
            println!("  - {}", team);
        }
    }

    let judge_ids: Vec<u32> = {
        let mut ids: Vec<u32> = schedule.slots.iter().map(|s| s.judge_id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    };
    for judge_id in judge_ids {
        println!("\nJudge pair {}:", judge_id);
        for slot in schedule.slots.iter().filter(|s| s.judge_id == judge_id) {
            println!("  {}", slot_line(slot));
        }
    }
}

/// Writes a schedule to a file, one slot per line, grouped by judge pair.
pub fn write_schedule_to_file(schedule: &Schedule, filename: &str) -> std::io::Result<()> {
    let mut file = File::create(filename)?;

    writeln!(file, "** {} **", schedule.label)?;

    let mut judge_ids: Vec<u32> = schedule.slots.iter().map(|s| s.judge_id).collect();
    judge_ids.sort_unstable();
    judge_ids.dedup();
    for judge_id in judge_ids {
        writeln!(file, "\nJudge pair {}", judge_id)?;
        for slot in schedule.slots.iter().filter(|s| s.judge_id == judge_id) {
            writeln!(file, "{}", slot_line(slot))?;
        }
    }

    Ok(())
}
