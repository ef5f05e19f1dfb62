use chrono::{DateTime, Local, NaiveTime, TimeZone, Utc};
use serde_json::Value;

use crate::schedule::{MatchRecord, SchedulerError, TeamId};

/// Parses the raw tournament-manager match export into structured records.
/// Accepts a bare JSON array, an object with a "Matches" key, or log text
/// with a JSON array embedded in extra lines.
pub fn parse_matches(raw: &str) -> Result<Vec<MatchRecord>, SchedulerError> {
    let payload = parse_json_payload(raw)?;
    let entries = payload
        .as_array()
        .ok_or_else(|| SchedulerError::malformed("match list is not an array"))?;

    let mut records = Vec::new();
    for (i, entry) in entries.iter().enumerate() {
        let info = entry.get("matchInfo").unwrap_or(entry);
        let label = match_label(info);
        let seconds = info
            .get("timeScheduled")
            .and_then(timestamp_seconds)
            .ok_or_else(|| {
                SchedulerError::malformed(format!(
                    "match {} ({}) has no scheduled time",
                    i + 1,
                    label
                ))
            })?;
        let time = Utc.timestamp_opt(seconds, 0).single().ok_or_else(|| {
            SchedulerError::malformed(format!("match {} has an out-of-range timestamp", i + 1))
        })?;
        records.push(MatchRecord {
            time,
            label,
            teams: collect_teams(info),
        });
    }
    Ok(records)
}

fn parse_json_payload(raw: &str) -> Result<Value, SchedulerError> {
    if let Ok(value) = serde_json::from_str::<Value>(raw) {
        match value {
            Value::Object(ref map) if map.contains_key("Matches") => {
                return Ok(map["Matches"].clone())
            }
            Value::Array(_) => return Ok(value),
            _ => {}
        }
    }

    // Log exports wrap the array in extra lines; take the outermost array.
    if let (Some(start), Some(end)) = (raw.find('['), raw.rfind(']')) {
        if start < end {
            if let Ok(value) = serde_json::from_str::<Value>(&raw[start..=end]) {
                if value.is_array() {
                    return Ok(value);
                }
            }
        }
    }

    Err(SchedulerError::malformed(
        "could not find a JSON match array in the input",
    ))
}

fn timestamp_seconds(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Human match name from the round/match tuple: "Q3", "SF1", "Match 7".
fn match_label(info: &Value) -> String {
    let tuple = info.get("matchTuple");
    let round = tuple
        .and_then(|t| t.get("round"))
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_uppercase();
    let number = tuple.and_then(|t| t.get("match")).and_then(Value::as_i64);

    match (round.as_str(), number) {
        ("QUAL", Some(n)) => format!("Q{}", n),
        ("", Some(n)) => format!("Match {}", n),
        (round, Some(n)) => format!("{}{}", round, n),
        _ => "Match".to_string(),
    }
}

fn collect_teams(info: &Value) -> Vec<TeamId> {
    let mut teams = Vec::new();
    let alliances = info.get("alliances").and_then(Value::as_array);
    for alliance in alliances.into_iter().flatten() {
        let list = alliance.get("teams").and_then(Value::as_array);
        for team in list.into_iter().flatten() {
            let number = match team.get("number") {
                Some(Value::String(s)) => s.trim().to_string(),
                Some(Value::Number(n)) => n.to_string(),
                _ => String::new(),
            };
            if !number.is_empty() {
                teams.push(number);
            }
        }
    }
    teams
}

/// Parses a clock time like "9:00 AM" or "14:30" into an instant on
/// today's date, for the judging-window configuration. Clock strings are
/// wall time in the machine's timezone; match timestamps are true
/// instants, so the result is converted to UTC here.
pub fn parse_clock_time(raw: &str, label: &str) -> Result<DateTime<Utc>, SchedulerError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(SchedulerError::invalid_window(format!("missing {}", label)));
    }

    let upper = text.to_uppercase();
    let time = NaiveTime::parse_from_str(&upper, "%I:%M %p")
        .or_else(|_| NaiveTime::parse_from_str(&upper, "%I:%M%p"))
        .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M"))
        .map_err(|_| {
            SchedulerError::invalid_window(format!("{} must be like 9:00 AM", label))
        })?;

    let today = Local::now().date_naive().and_time(time);
    let resolved = Local
        .from_local_datetime(&today)
        .earliest()
        .ok_or_else(|| {
            SchedulerError::invalid_window(format!("{} does not exist today", label))
        })?;
    Ok(resolved.with_timezone(&Utc))
}
