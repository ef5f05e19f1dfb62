use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Team identifier as it appears in the match log (e.g. "1234" or "1234A").
pub type TeamId = String;

/// One entry of the parsed match list: when the match runs and who plays in it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRecord {
    pub time: DateTime<Utc>,
    pub label: String,
    pub teams: Vec<TeamId>,
}

/// A window of time during which a team is unavailable for judging,
/// centered on one of its match times.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchBlock {
    pub label: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SlotStatus {
    Scheduled,
    Checked,
    NoShow,
    Rescheduled,
}

/// One fixed-length time unit on one judge pair's timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    pub judge_id: u32,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub team: Option<TeamId>,
    pub status: SlotStatus,
    /// Only set on rescheduled slots: names the neighbors of the gap used.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub between: Option<String>,
}

impl Slot {
    pub fn new(judge_id: u32, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Slot {
            judge_id,
            start,
            end,
            team: None,
            status: SlotStatus::Scheduled,
            between: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduleKind {
    #[serde(rename = "initial")]
    Initial,
    #[serde(rename = "noshow")]
    NoShow,
    #[serde(rename = "printed")]
    Printed,
    #[serde(rename = "printed-noshow")]
    PrintedNoShow,
}

/// A named schedule snapshot. Once the kind is a printed variant the
/// slot/team layout is frozen; only slot statuses change afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: ScheduleKind,
    pub slots: Vec<Slot>,
    pub created_at: DateTime<Utc>,
}

/// One ranked candidate window for relocating a no-show team.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gap {
    pub judge_id: u32,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub minutes: i64,
    pub between: String,
}

/// Cached GapFinder output for one team.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GapSuggestion {
    pub team: TeamId,
    pub gaps: Vec<Gap>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    pub judge_pairs: u32,
    pub slot_minutes: i64,
    pub block_minutes: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// Sort key so numeric team numbers order numerically and everything
/// else falls back to lexical order after them.
pub fn team_sort_key(team: &str) -> (u8, String) {
    match team.parse::<u32>() {
        Ok(number) => (0, format!("{:06}", number)),
        Err(_) => (1, team.to_string()),
    }
}

/// Timestamped schedule id, e.g. "schedule-20260825-093015".
pub fn schedule_id(prefix: &str) -> String {
    format!("{}-{}", prefix, Utc::now().format("%Y%m%d-%H%M%S"))
}
