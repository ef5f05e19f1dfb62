use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::error::SchedulerError;
use super::types::{team_sort_key, MatchBlock, MatchRecord, TeamId};

/// Maps each team to its ordered conflict blocks, derived from the parsed
/// match schedule. Teams that play no matches have no entry and are
/// unconstrained.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchIndex {
    blocks: HashMap<TeamId, Vec<MatchBlock>>,
}

impl MatchIndex {
    /// Builds the index. Each block spans the match time extended by
    /// `block_minutes / 2` on each side; for odd widths the shorter half
    /// goes on the earlier side. Input order does not matter.
    pub fn build(
        matches: &[MatchRecord],
        block_minutes: i64,
    ) -> Result<MatchIndex, SchedulerError> {
        let before = Duration::minutes(block_minutes / 2);
        let after = Duration::minutes(block_minutes - block_minutes / 2);

        let mut blocks: HashMap<TeamId, Vec<MatchBlock>> = HashMap::new();
        for record in matches {
            if record.teams.is_empty() {
                return Err(SchedulerError::malformed(format!(
                    "match {} has no team list",
                    record.label
                )));
            }
            for team in &record.teams {
                blocks.entry(team.clone()).or_default().push(MatchBlock {
                    label: record.label.clone(),
                    start: record.time - before,
                    end: record.time + after,
                });
            }
        }

        for team_blocks in blocks.values_mut() {
            team_blocks.sort_by_key(|b| b.start);
        }

        Ok(MatchIndex { blocks })
    }

    /// All teams that appear in the match schedule, in team-number order.
    pub fn teams(&self) -> Vec<TeamId> {
        let mut teams: Vec<TeamId> = self.blocks.keys().cloned().collect();
        teams.sort_by_key(|t| team_sort_key(t));
        teams
    }

    pub fn blocks_for(&self, team: &str) -> &[MatchBlock] {
        self.blocks.get(team).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Half-open interval test: does `[start, end)` intersect any of the
    /// team's conflict blocks?
    pub fn conflicts_with(&self, team: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.blocks_for(team)
            .iter()
            .any(|block| start < block.end && block.start < end)
    }
}
