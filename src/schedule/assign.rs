use std::collections::HashMap;

use super::match_index::MatchIndex;
use super::types::{team_sort_key, Slot, SlotStatus, TeamId};

/// Result of one assignment run. Teams that fit nowhere land in
/// `unassigned`; that is a normal outcome, never an error.
#[derive(Debug, Clone)]
pub struct AssignOutcome {
    pub slots: Vec<Slot>,
    pub unassigned: Vec<TeamId>,
}

/// Greedy initial assignment, deterministic for identical inputs.
///
/// 1. Teams are ordered most-constrained-first (fewest conflict-free slots),
///    ties broken by team number.
/// 2. For each team, empty slots are scanned in (ascending judge load,
///    ascending start time, ascending judge id) order so load stays balanced
///    across judge pairs.
/// 3. The first empty slot that does not intersect any of the team's match
///    blocks wins.
pub fn assign(teams: &[TeamId], index: &MatchIndex, mut slots: Vec<Slot>) -> AssignOutcome {
    let mut ordered: Vec<(usize, &TeamId)> = teams
        .iter()
        .map(|team| {
            let free = slots
                .iter()
                .filter(|slot| !index.conflicts_with(team, slot.start, slot.end))
                .count();
            (free, team)
        })
        .collect();
    ordered.sort_by(|a, b| {
        a.0.cmp(&b.0)
            .then_with(|| team_sort_key(a.1).cmp(&team_sort_key(b.1)))
    });

    let mut load: HashMap<u32, usize> = slots.iter().map(|slot| (slot.judge_id, 0)).collect();
    let mut unassigned = Vec::new();

    for (_, team) in ordered {
        let mut candidates: Vec<usize> = (0..slots.len())
            .filter(|&i| slots[i].team.is_none())
            .collect();
        candidates.sort_by(|&a, &b| {
            let (sa, sb) = (&slots[a], &slots[b]);
            let load_a = load.get(&sa.judge_id).copied().unwrap_or(0);
            let load_b = load.get(&sb.judge_id).copied().unwrap_or(0);
            load_a
                .cmp(&load_b)
                .then(sa.start.cmp(&sb.start))
                .then(sa.judge_id.cmp(&sb.judge_id))
        });

        let placed = candidates.into_iter().find(|&i| {
            let slot = &slots[i];
            !index.conflicts_with(team, slot.start, slot.end)
        });

        match placed {
            Some(i) => {
                slots[i].team = Some(team.clone());
                slots[i].status = SlotStatus::Scheduled;
                *load.entry(slots[i].judge_id).or_insert(0) += 1;
            }
            None => unassigned.push(team.clone()),
        }
    }

    AssignOutcome { slots, unassigned }
}
