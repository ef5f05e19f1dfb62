use chrono::Utc;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::assign::assign;
use super::error::SchedulerError;
use super::gaps::{build_noshow_slots, find_gaps};
use super::match_index::MatchIndex;
use super::slot_grid::build_slots;
use super::types::{
    schedule_id, GapSuggestion, MatchRecord, Schedule, ScheduleKind, SchedulerConfig, Slot,
    SlotStatus, TeamId,
};

/// The three outcomes an operator can record against a team once the
/// governing schedule has been printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutcomeKind {
    Checkoff,
    NoShow,
    NotCompeting,
}

/// Single source of truth for one scheduling session. Owns every schedule
/// snapshot; the assignment and gap engines are pure functions over its
/// contents. The host serializes this whole struct as the API state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LifecycleState {
    pub config: Option<SchedulerConfig>,
    pub schedules: Vec<Schedule>,
    pub active_schedule_id: Option<String>,
    /// True once the initial schedule has been printed; blocks regeneration.
    pub locked: bool,
    /// Same, for the no-show variant.
    pub noshow_locked: bool,
    pub team_count: usize,
    pub unassigned: Vec<TeamId>,
    pub no_shows: Vec<TeamId>,
    pub not_competing: Vec<TeamId>,
    pub no_show_suggestions: Vec<GapSuggestion>,
    pub match_index: MatchIndex,
}

impl LifecycleState {
    pub fn new() -> Self {
        LifecycleState::default()
    }

    pub fn active_schedule(&self) -> Option<&Schedule> {
        let id = self.active_schedule_id.as_deref()?;
        self.schedules.iter().find(|s| s.id == id)
    }

    fn active_schedule_mut(&mut self) -> Option<&mut Schedule> {
        let id = self.active_schedule_id.clone()?;
        self.schedules.iter_mut().find(|s| s.id == id)
    }

    /// Builds the initial schedule from scratch: match index, slot grid,
    /// greedy assignment. Replaces all previous schedules and bookkeeping
    /// (teams already marked not competing survive and are kept off the
    /// roster). Rejected once the initial schedule has been printed.
    pub fn generate(
        &mut self,
        config: SchedulerConfig,
        matches: &[MatchRecord],
    ) -> Result<(), SchedulerError> {
        if self.locked {
            return Err(SchedulerError::ScheduleLocked);
        }

        let index = MatchIndex::build(matches, config.block_minutes)?;
        let slots = build_slots(&config)?;
        let not_competing = std::mem::take(&mut self.not_competing);
        let roster: Vec<TeamId> = index
            .teams()
            .into_iter()
            .filter(|t| !not_competing.contains(t))
            .collect();

        let outcome = assign(&roster, &index, slots);
        if !outcome.unassigned.is_empty() {
            warn!(
                "{} of {} teams could not be placed: {:?}",
                outcome.unassigned.len(),
                roster.len(),
                outcome.unassigned
            );
        }

        // Teams that did not fit go straight onto the no-show queue with
        // gap suggestions, so the operator sees candidate windows at once.
        let suggestions: Vec<GapSuggestion> = outcome
            .unassigned
            .iter()
            .filter_map(|team| {
                let gaps = find_gaps(team, &outcome.slots, &index, &not_competing);
                (!gaps.is_empty()).then(|| GapSuggestion {
                    team: team.clone(),
                    gaps,
                })
            })
            .collect();

        let id = schedule_id("schedule");
        info!(
            "generated initial schedule {} ({} teams, {} unassigned)",
            id,
            roster.len(),
            outcome.unassigned.len()
        );
        let schedule = Schedule {
            id: id.clone(),
            label: "Initial schedule".to_string(),
            kind: ScheduleKind::Initial,
            slots: outcome.slots,
            created_at: Utc::now(),
        };

        *self = LifecycleState {
            config: Some(config),
            schedules: vec![schedule],
            active_schedule_id: Some(id),
            locked: false,
            noshow_locked: false,
            team_count: roster.len(),
            unassigned: outcome.unassigned.clone(),
            no_shows: outcome.unassigned,
            not_competing,
            no_show_suggestions: suggestions,
            match_index: index,
        };
        Ok(())
    }

    /// Builds the no-show recovery schedule from the pending no-show queue
    /// and the open gaps of the active schedule. Allowed any time before
    /// the no-show variant has been printed; the initial lock is not
    /// required.
    pub fn generate_noshow(&mut self) -> Result<(), SchedulerError> {
        if self.noshow_locked {
            return Err(SchedulerError::NoShowScheduleLocked);
        }
        let judge_pairs = self
            .config
            .as_ref()
            .map(|c| c.judge_pairs)
            .ok_or(SchedulerError::NoScheduleGenerated)?;
        let base = self
            .active_schedule()
            .ok_or(SchedulerError::NoScheduleGenerated)?;

        let slots = build_noshow_slots(
            &self.no_shows,
            &base.slots,
            &self.match_index,
            &self.not_competing,
            judge_pairs,
        )?;
        info!("built no-show recovery schedule with {} slots", slots.len());

        let id = self.upsert_by_kind(
            ScheduleKind::NoShow,
            "No-show recovery",
            "noshow_schedule",
            slots,
        );
        self.active_schedule_id = Some(id);
        Ok(())
    }

    pub fn record_outcome(&mut self, kind: OutcomeKind, team: &str) -> Result<(), SchedulerError> {
        match kind {
            OutcomeKind::Checkoff => self.checkoff(team),
            OutcomeKind::NoShow => self.noshow(team),
            OutcomeKind::NotCompeting => self.mark_not_competing(team),
        }
    }

    /// The team showed up and was judged.
    pub fn checkoff(&mut self, team: &str) -> Result<(), SchedulerError> {
        self.outcome_gate()?;
        self.update_slot_status(team, SlotStatus::Checked)?;
        self.no_shows.retain(|t| t != team);
        self.no_show_suggestions.retain(|s| s.team != team);
        Ok(())
    }

    /// The team failed to appear: mark its slot, queue it for recovery and
    /// cache fresh gap suggestions for the operator.
    pub fn noshow(&mut self, team: &str) -> Result<(), SchedulerError> {
        self.outcome_gate()?;
        self.update_slot_status(team, SlotStatus::NoShow)?;
        if !self.no_shows.iter().any(|t| t == team) {
            self.no_shows.push(team.to_string());
        }

        let gaps = match self.active_schedule() {
            Some(active) => find_gaps(team, &active.slots, &self.match_index, &self.not_competing),
            None => Vec::new(),
        };
        self.no_show_suggestions.retain(|s| s.team != team);
        self.no_show_suggestions.push(GapSuggestion {
            team: team.to_string(),
            gaps,
        });
        Ok(())
    }

    /// The team has withdrawn entirely: excluded from future assignment and
    /// from all gap suggestion runs. No slot is required, the team may have
    /// been unassigned to begin with.
    pub fn mark_not_competing(&mut self, team: &str) -> Result<(), SchedulerError> {
        self.outcome_gate()?;
        if !self.not_competing.iter().any(|t| t == team) {
            self.not_competing.push(team.to_string());
        }
        self.no_shows.retain(|t| t != team);
        self.no_show_suggestions.retain(|s| s.team != team);
        Ok(())
    }

    /// Freezes the active schedule as a printed copy and makes the copy
    /// active. Sets the lock flag of the matching schedule family; printing
    /// an already-locked family is a no-op returning the existing snapshot.
    pub fn snapshot_print(&mut self, label: Option<&str>) -> Result<String, SchedulerError> {
        let active = self
            .active_schedule()
            .cloned()
            .ok_or(SchedulerError::NothingToPrint)?;

        match active.kind {
            ScheduleKind::NoShow | ScheduleKind::PrintedNoShow => {
                if self.noshow_locked {
                    return Ok(self
                        .find_id_by_kind(ScheduleKind::PrintedNoShow)
                        .unwrap_or(active.id));
                }
                let id = self.push_printed_copy(
                    ScheduleKind::PrintedNoShow,
                    label.unwrap_or("Printed no-show recovery"),
                    "printed-noshow",
                    active.slots,
                );
                self.noshow_locked = true;
                Ok(id)
            }
            ScheduleKind::Initial | ScheduleKind::Printed => {
                if self.locked {
                    return Ok(self
                        .find_id_by_kind(ScheduleKind::Printed)
                        .unwrap_or(active.id));
                }
                let id = self.push_printed_copy(
                    ScheduleKind::Printed,
                    label.unwrap_or("Printed schedule"),
                    "printed",
                    active.slots,
                );
                self.locked = true;
                Ok(id)
            }
        }
    }

    pub fn switch_active(&mut self, id: &str) -> Result<(), SchedulerError> {
        if self.schedules.iter().any(|s| s.id == id) {
            self.active_schedule_id = Some(id.to_string());
            Ok(())
        } else {
            Err(SchedulerError::UnknownSchedule(id.to_string()))
        }
    }

    /// Back to the empty default. The only way out of a locked family.
    pub fn reset(&mut self) {
        info!("scheduler state reset");
        *self = LifecycleState::default();
    }

    /// Status edits are gated behind printing: the in-memory schedule must
    /// not diverge from the paper copies judges are holding, so the order
    /// is always finalize, print, record outcomes.
    fn outcome_gate(&self) -> Result<(), SchedulerError> {
        let printed = match self.active_schedule().map(|s| s.kind) {
            Some(ScheduleKind::Initial) | Some(ScheduleKind::Printed) => self.locked,
            Some(ScheduleKind::NoShow) | Some(ScheduleKind::PrintedNoShow) => self.noshow_locked,
            None => false,
        };
        if printed {
            Ok(())
        } else {
            Err(SchedulerError::EditBeforePrint)
        }
    }

    fn update_slot_status(&mut self, team: &str, status: SlotStatus) -> Result<(), SchedulerError> {
        let schedule = self
            .active_schedule_mut()
            .ok_or_else(|| SchedulerError::UnknownTeam(team.to_string()))?;
        match schedule
            .slots
            .iter_mut()
            .find(|s| s.team.as_deref() == Some(team))
        {
            Some(slot) => {
                slot.status = status;
                Ok(())
            }
            None => Err(SchedulerError::UnknownTeam(team.to_string())),
        }
    }

    fn find_id_by_kind(&self, kind: ScheduleKind) -> Option<String> {
        self.schedules
            .iter()
            .find(|s| s.kind == kind)
            .map(|s| s.id.clone())
    }

    fn upsert_by_kind(
        &mut self,
        kind: ScheduleKind,
        label: &str,
        prefix: &str,
        slots: Vec<Slot>,
    ) -> String {
        if let Some(existing) = self.schedules.iter_mut().find(|s| s.kind == kind) {
            existing.label = label.to_string();
            existing.slots = slots;
            existing.created_at = Utc::now();
            existing.id.clone()
        } else {
            let id = schedule_id(prefix);
            self.schedules.push(Schedule {
                id: id.clone(),
                label: label.to_string(),
                kind,
                slots,
                created_at: Utc::now(),
            });
            id
        }
    }

    fn push_printed_copy(
        &mut self,
        kind: ScheduleKind,
        label: &str,
        prefix: &str,
        slots: Vec<Slot>,
    ) -> String {
        let id = schedule_id(prefix);
        info!("printed schedule snapshot {}", id);
        self.schedules.push(Schedule {
            id: id.clone(),
            label: label.to_string(),
            kind,
            slots,
            created_at: Utc::now(),
        });
        self.active_schedule_id = Some(id.clone());
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, hour, minute, 0).unwrap()
    }

    fn config() -> SchedulerConfig {
        SchedulerConfig {
            judge_pairs: 2,
            slot_minutes: 10,
            block_minutes: 10,
            start_time: at(9, 0),
            end_time: at(10, 0),
        }
    }

    // Matches sit in the afternoon, far away from the judging window.
    fn matches() -> Vec<MatchRecord> {
        vec![
            MatchRecord {
                time: at(13, 0),
                label: "Q1".to_string(),
                teams: vec!["1".to_string(), "2".to_string()],
            },
            MatchRecord {
                time: at(13, 10),
                label: "Q2".to_string(),
                teams: vec!["3".to_string(), "4".to_string()],
            },
        ]
    }

    fn generated() -> LifecycleState {
        let mut state = LifecycleState::new();
        state.generate(config(), &matches()).unwrap();
        state
    }

    fn printed() -> LifecycleState {
        let mut state = generated();
        state.snapshot_print(None).unwrap();
        state
    }

    #[test]
    fn generate_populates_state() {
        let state = generated();
        assert_eq!(state.team_count, 4);
        assert!(state.unassigned.is_empty());
        assert!(!state.locked);
        let active = state.active_schedule().unwrap();
        assert_eq!(active.kind, ScheduleKind::Initial);
        assert_eq!(active.slots.len(), 12);
    }

    #[test]
    fn generate_twice_yields_the_same_mapping() {
        let first = generated();
        let mut second = generated();
        // Regenerating before printing is allowed and deterministic.
        second.generate(config(), &matches()).unwrap();

        let mapping = |state: &LifecycleState, team: &str| {
            state
                .active_schedule()
                .unwrap()
                .slots
                .iter()
                .find(|s| s.team.as_deref() == Some(team))
                .map(|s| (s.judge_id, s.start))
        };
        for team in ["1", "2", "3", "4"] {
            assert_eq!(mapping(&first, team), mapping(&second, team));
        }
    }

    #[test]
    fn generate_is_rejected_after_printing() {
        let mut state = printed();
        assert_eq!(
            state.generate(config(), &matches()),
            Err(SchedulerError::ScheduleLocked)
        );
    }

    #[test]
    fn outcome_edits_are_gated_behind_printing() {
        let mut state = generated();
        assert_eq!(state.checkoff("1"), Err(SchedulerError::EditBeforePrint));
        assert_eq!(state.noshow("1"), Err(SchedulerError::EditBeforePrint));
        assert_eq!(
            state.mark_not_competing("1"),
            Err(SchedulerError::EditBeforePrint)
        );

        state.snapshot_print(None).unwrap();
        assert!(state.record_outcome(OutcomeKind::Checkoff, "1").is_ok());
        assert!(state.record_outcome(OutcomeKind::NoShow, "2").is_ok());
        assert!(state
            .record_outcome(OutcomeKind::NotCompeting, "3")
            .is_ok());
    }

    #[test]
    fn printing_is_idempotent() {
        let mut state = generated();
        let first = state.snapshot_print(None).unwrap();
        let count = state.schedules.len();
        let second = state.snapshot_print(None).unwrap();
        assert_eq!(first, second);
        assert_eq!(state.schedules.len(), count);
        assert!(state.locked);
        assert_eq!(
            state.active_schedule().unwrap().kind,
            ScheduleKind::Printed
        );
    }

    #[test]
    fn checkoff_of_unknown_team_fails() {
        let mut state = printed();
        assert_eq!(
            state.checkoff("9999"),
            Err(SchedulerError::UnknownTeam("9999".to_string()))
        );
    }

    #[test]
    fn noshow_marks_slot_and_caches_suggestions() {
        let mut state = printed();
        state.noshow("3").unwrap();

        let active = state.active_schedule().unwrap();
        let slot = active
            .slots
            .iter()
            .find(|s| s.team.as_deref() == Some("3"))
            .unwrap();
        assert_eq!(slot.status, SlotStatus::NoShow);
        assert_eq!(state.no_shows, vec!["3".to_string()]);
        let suggestion = &state.no_show_suggestions[0];
        assert_eq!(suggestion.team, "3");
        assert!(!suggestion.gaps.is_empty());

        state.checkoff("3").unwrap();
        assert!(state.no_shows.is_empty());
        assert!(state.no_show_suggestions.is_empty());
    }

    #[test]
    fn noshow_recovery_schedule_lifecycle() {
        let mut state = printed();
        state.noshow("3").unwrap();

        state.generate_noshow().unwrap();
        let active = state.active_schedule().unwrap();
        assert_eq!(active.kind, ScheduleKind::NoShow);
        assert_eq!(active.slots.len(), 1);
        assert_eq!(active.slots[0].team.as_deref(), Some("3"));
        assert_eq!(active.slots[0].status, SlotStatus::Rescheduled);

        // The no-show variant has its own print gate.
        assert_eq!(state.checkoff("3"), Err(SchedulerError::EditBeforePrint));
        state.snapshot_print(None).unwrap();
        assert!(state.noshow_locked);
        assert_eq!(
            state.active_schedule().unwrap().kind,
            ScheduleKind::PrintedNoShow
        );
        state.checkoff("3").unwrap();

        assert_eq!(
            state.generate_noshow(),
            Err(SchedulerError::NoShowScheduleLocked)
        );
    }

    #[test]
    fn generate_noshow_requires_pending_teams() {
        let mut state = printed();
        assert_eq!(state.generate_noshow(), Err(SchedulerError::NoShowQueueEmpty));
    }

    #[test]
    fn generate_noshow_before_any_schedule_exists_fails() {
        let mut state = LifecycleState::new();
        assert_eq!(
            state.generate_noshow(),
            Err(SchedulerError::NoScheduleGenerated)
        );
    }

    #[test]
    fn not_competing_team_is_excluded_from_regeneration() {
        let mut state = printed();
        state.mark_not_competing("4").unwrap();
        state.reset();
        // Reset clears everything, including withdrawals.
        assert!(state.not_competing.is_empty());

        let mut state = printed();
        state.mark_not_competing("4").unwrap();
        // Withdrawals survive a regenerate; only reset clears them. A new
        // schedule therefore never seats team 4 again.
        let mut regenerated = LifecycleState {
            not_competing: state.not_competing.clone(),
            ..LifecycleState::default()
        };
        regenerated.generate(config(), &matches()).unwrap();
        assert_eq!(regenerated.team_count, 3);
        assert!(regenerated
            .active_schedule()
            .unwrap()
            .slots
            .iter()
            .all(|s| s.team.as_deref() != Some("4")));
    }

    #[test]
    fn switch_active_validates_the_id() {
        let mut state = generated();
        let id = state.active_schedule().unwrap().id.clone();
        assert!(state.switch_active(&id).is_ok());
        assert_eq!(
            state.switch_active("schedule-19700101-000000"),
            Err(SchedulerError::UnknownSchedule(
                "schedule-19700101-000000".to_string()
            ))
        );
    }

    #[test]
    fn reset_clears_everything_and_unlocks() {
        let mut state = printed();
        state.noshow("2").unwrap();
        state.reset();

        assert!(state.schedules.is_empty());
        assert!(state.active_schedule_id.is_none());
        assert!(!state.locked);
        assert!(!state.noshow_locked);
        assert!(state.no_shows.is_empty());
        assert!(state.no_show_suggestions.is_empty());
        assert_eq!(state.team_count, 0);

        state.generate(config(), &matches()).unwrap();
        assert_eq!(state.team_count, 4);
    }
}
