use std::collections::{BTreeMap, HashMap};

use super::error::SchedulerError;
use super::match_index::MatchIndex;
use super::types::{team_sort_key, Gap, Slot, SlotStatus, TeamId};

/// A slot that can be reclaimed for a relocated team: empty, or held by a
/// team that has since been marked not competing.
fn reclaimable(slot: &Slot, not_competing: &[TeamId]) -> bool {
    match &slot.team {
        None => true,
        Some(team) => not_competing.contains(team),
    }
}

fn neighbor_label(slot: Option<&&Slot>, boundary: &str) -> String {
    match slot.and_then(|s| s.team.as_deref()) {
        Some(team) => team.to_string(),
        None => boundary.to_string(),
    }
}

/// Scans each judge pair's timeline for maximal runs of reclaimable slots
/// and returns them as ranked gap candidates for the given team.
///
/// Judge pairs the team has already visited are skipped, candidates
/// overlapping the team's own match blocks are dropped, and the survivors
/// are ranked largest duration first, ties broken by earliest start. The
/// full ranked list comes back; the caller (a human operator) picks one.
/// A team marked not competing gets no suggestions at all.
pub fn find_gaps(
    team: &str,
    slots: &[Slot],
    index: &MatchIndex,
    not_competing: &[TeamId],
) -> Vec<Gap> {
    if not_competing.iter().any(|t| t == team) {
        return Vec::new();
    }

    let mut by_judge: BTreeMap<u32, Vec<&Slot>> = BTreeMap::new();
    for slot in slots {
        by_judge.entry(slot.judge_id).or_default().push(slot);
    }

    let mut gaps = Vec::new();
    for (judge_id, mut lane) in by_judge {
        if lane.iter().any(|s| s.team.as_deref() == Some(team)) {
            continue;
        }
        lane.sort_by_key(|s| s.start);

        let mut run_start: Option<usize> = None;
        for i in 0..=lane.len() {
            let open = i < lane.len() && reclaimable(lane[i], not_competing);
            if open {
                run_start.get_or_insert(i);
                continue;
            }
            if let Some(first) = run_start.take() {
                let start = lane[first].start;
                let end = lane[i - 1].end;
                let before = if first == 0 {
                    "start of day".to_string()
                } else {
                    neighbor_label(lane.get(first - 1), "start of day")
                };
                let after = neighbor_label(lane.get(i), "end of day");
                gaps.push(Gap {
                    judge_id,
                    start,
                    end,
                    minutes: (end - start).num_minutes(),
                    between: format!("{} and {}", before, after),
                });
            }
        }
    }

    gaps.retain(|gap| !index.conflicts_with(team, gap.start, gap.end));
    gaps.sort_by(|a, b| b.minutes.cmp(&a.minutes).then(a.start.cmp(&b.start)));
    gaps
}

/// Places every pending no-show team into its best gap on the active
/// schedule and returns the rescheduled slots (the body of a "noshow"
/// schedule). Placements balance across judge pairs: `len / N` per pair,
/// remainder going to the lowest judge ids. Teams are handled in
/// team-number order so the result is deterministic.
pub fn build_noshow_slots(
    pending: &[TeamId],
    base_slots: &[Slot],
    index: &MatchIndex,
    not_competing: &[TeamId],
    judge_pairs: u32,
) -> Result<Vec<Slot>, SchedulerError> {
    let mut teams: Vec<TeamId> = pending
        .iter()
        .filter(|t| !not_competing.contains(*t))
        .cloned()
        .collect();
    teams.sort_by_key(|t| team_sort_key(t));
    if teams.is_empty() {
        return Err(SchedulerError::NoShowQueueEmpty);
    }

    let base = teams.len() / judge_pairs.max(1) as usize;
    let remainder = teams.len() % judge_pairs.max(1) as usize;
    let target = |judge_id: u32| base + usize::from((judge_id as usize) <= remainder);

    let mut scratch: Vec<Slot> = base_slots.to_vec();
    let mut placed: HashMap<u32, usize> = HashMap::new();
    let mut rescheduled = Vec::new();

    for team in &teams {
        let gaps = find_gaps(team, &scratch, index, not_competing);
        let chosen = gaps
            .iter()
            .find(|g| placed.get(&g.judge_id).copied().unwrap_or(0) < target(g.judge_id))
            .or_else(|| gaps.first())
            .cloned();
        let Some(gap) = chosen else { continue };

        // Claim the first grid slot inside the gap.
        let slot = scratch.iter_mut().find(|s| {
            s.judge_id == gap.judge_id
                && s.start >= gap.start
                && s.end <= gap.end
                && reclaimable(s, not_competing)
        });
        if let Some(slot) = slot {
            slot.team = Some(team.clone());
            slot.status = SlotStatus::Rescheduled;
            *placed.entry(gap.judge_id).or_insert(0) += 1;
            rescheduled.push(Slot {
                judge_id: gap.judge_id,
                start: slot.start,
                end: slot.end,
                team: Some(team.clone()),
                status: SlotStatus::Rescheduled,
                between: Some(gap.between.clone()),
            });
        }
    }

    if rescheduled.is_empty() {
        return Err(SchedulerError::NoGapsAvailable);
    }
    Ok(rescheduled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::slot_grid::build_slots;
    use crate::schedule::types::{MatchRecord, SchedulerConfig};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    // Minutes may run past 59 (e.g. a window ending at 9:60 == 10:00).
    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 0, 0, 0).unwrap()
            + Duration::minutes(i64::from(hour * 60 + minute))
    }

    fn grid(judge_pairs: u32, slot_minutes: i64, end_minute: u32) -> Vec<Slot> {
        build_slots(&SchedulerConfig {
            judge_pairs,
            slot_minutes,
            block_minutes: 0,
            start_time: at(9, 0),
            end_time: at(9, end_minute),
        })
        .unwrap()
    }

    fn occupy(slots: &mut [Slot], judge_id: u32, start: DateTime<Utc>, team: &str) {
        let slot = slots
            .iter_mut()
            .find(|s| s.judge_id == judge_id && s.start == start)
            .unwrap();
        slot.team = Some(team.to_string());
    }

    fn empty_index() -> MatchIndex {
        MatchIndex::build(&[], 0).unwrap()
    }

    #[test]
    fn larger_gap_ranks_first() {
        // One occupied slot at 09:20 splits judge 1's lane into a
        // 20-minute gap and a 35-minute gap.
        let mut slots = grid(1, 5, 60);
        occupy(&mut slots, 1, at(9, 20), "11");
        let gaps = find_gaps("99", &slots, &empty_index(), &[]);

        assert_eq!(gaps.len(), 2);
        assert_eq!(gaps[0].minutes, 35);
        assert_eq!(gaps[0].start, at(9, 25));
        assert_eq!(gaps[1].minutes, 20);
        assert_eq!(gaps[1].between, "start of day and 11");
    }

    #[test]
    fn visited_judge_pairs_are_skipped() {
        let mut slots = grid(2, 10, 30);
        occupy(&mut slots, 1, at(9, 0), "42");
        let gaps = find_gaps("42", &slots, &empty_index(), &[]);
        assert!(gaps.iter().all(|g| g.judge_id == 2));
    }

    #[test]
    fn not_competing_occupants_are_reclaimable() {
        let mut slots = grid(1, 10, 30);
        occupy(&mut slots, 1, at(9, 0), "7");
        occupy(&mut slots, 1, at(9, 10), "8");
        occupy(&mut slots, 1, at(9, 20), "9");

        let withdrawn = vec!["8".to_string()];
        let gaps = find_gaps("42", &slots, &empty_index(), &withdrawn);
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].start, at(9, 10));
        assert_eq!(gaps[0].between, "7 and 9");
    }

    #[test]
    fn not_competing_team_gets_no_suggestions() {
        let slots = grid(1, 10, 30);
        let withdrawn = vec!["42".to_string()];
        assert!(find_gaps("42", &slots, &empty_index(), &withdrawn).is_empty());
    }

    #[test]
    fn gaps_overlapping_own_matches_are_dropped() {
        let slots = grid(1, 10, 30);
        let index = MatchIndex::build(
            &[MatchRecord {
                time: at(9, 15),
                label: "Q3".to_string(),
                teams: vec!["42".to_string()],
            }],
            60,
        )
        .unwrap();
        // The whole window sits inside the 08:45-09:45 block.
        assert!(find_gaps("42", &slots, &index, &[]).is_empty());
    }

    #[test]
    fn noshow_placement_balances_and_blocks_reuse() {
        let mut slots = grid(2, 10, 40);
        occupy(&mut slots, 1, at(9, 0), "1");
        occupy(&mut slots, 2, at(9, 0), "2");

        let pending = vec!["10".to_string(), "11".to_string()];
        let rescheduled =
            build_noshow_slots(&pending, &slots, &empty_index(), &[], 2).unwrap();

        assert_eq!(rescheduled.len(), 2);
        assert_ne!(rescheduled[0].judge_id, rescheduled[1].judge_id);
        assert_ne!(
            (rescheduled[0].judge_id, rescheduled[0].start),
            (rescheduled[1].judge_id, rescheduled[1].start)
        );
        assert!(rescheduled
            .iter()
            .all(|s| s.status == SlotStatus::Rescheduled && s.between.is_some()));
    }

    #[test]
    fn noshow_with_no_pending_teams_is_an_error() {
        let slots = grid(1, 10, 30);
        assert_eq!(
            build_noshow_slots(&[], &slots, &empty_index(), &[], 1),
            Err(SchedulerError::NoShowQueueEmpty)
        );
    }

    #[test]
    fn noshow_with_no_open_gaps_is_an_error() {
        let mut slots = grid(1, 10, 30);
        occupy(&mut slots, 1, at(9, 0), "1");
        occupy(&mut slots, 1, at(9, 10), "2");
        occupy(&mut slots, 1, at(9, 20), "3");

        let pending = vec!["42".to_string()];
        assert_eq!(
            build_noshow_slots(&pending, &slots, &empty_index(), &[], 1),
            Err(SchedulerError::NoGapsAvailable)
        );
    }
}
