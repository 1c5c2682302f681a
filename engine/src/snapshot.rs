use crate::{Match, MatchFormat, MatchStatus, Player, SetRecord, TiebreakScore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Snapshot types
//
// Field names are addressed by display bindings as dotted paths
// (`score.player1Points`, `player2.name`, `sets.set1.player1`) and must not
// change.
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSnapshot {
    pub match_id: String,
    pub format: MatchFormat,
    pub player1: PlayerSnapshot,
    pub player2: PlayerSnapshot,
    pub score: ScoreSnapshot,
    /// Finished sets keyed `set1`, `set2`, ...
    pub sets: BTreeMap<String, SetSnapshot>,
    pub current_set: u32,
    /// 1 or 2
    pub serving_player: u8,
    pub is_tiebreak: bool,
    pub tiebreak_score: Option<TiebreakScore>,
    pub match_status: MatchStatus,
    pub tournament: Option<String>,
    pub round: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    pub name: String,
    pub country: Option<String>,
    pub seed: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSnapshot {
    pub player1_sets: u32,
    pub player2_sets: u32,
    pub player1_games: u32,
    pub player2_games: u32,
    /// "0", "15", "30", "40", "D" or "A"
    pub player1_points: String,
    pub player2_points: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetSnapshot {
    pub player1: u32,
    pub player2: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tiebreak: Option<TiebreakScore>,
}

pub fn set_key(set_number: u32) -> String {
    format!("set{set_number}")
}

impl From<&Player> for PlayerSnapshot {
    fn from(player: &Player) -> Self {
        Self {
            name: player.name.clone(),
            country: player.country.clone(),
            seed: player.seed,
        }
    }
}

impl From<&SetRecord> for SetSnapshot {
    fn from(record: &SetRecord) -> Self {
        Self {
            player1: record.player1_games,
            player2: record.player2_games,
            tiebreak: record.tiebreak,
        }
    }
}

impl From<&Match> for MatchSnapshot {
    fn from(m: &Match) -> Self {
        Self {
            match_id: m.id.clone(),
            format: m.format,
            player1: PlayerSnapshot::from(&m.player1),
            player2: PlayerSnapshot::from(&m.player2),
            score: ScoreSnapshot {
                player1_sets: m.score.player1_sets,
                player2_sets: m.score.player2_sets,
                player1_games: m.score.player1_games,
                player2_games: m.score.player2_games,
                player1_points: m.score.player1_point.label().to_owned(),
                player2_points: m.score.player2_point.label().to_owned(),
            },
            sets: m
                .sets
                .iter()
                .map(|record| (set_key(record.set_number), SetSnapshot::from(record)))
                .collect(),
            current_set: m.current_set_number,
            serving_player: m.serving_player.number(),
            is_tiebreak: m.is_tiebreak,
            tiebreak_score: m.tiebreak_score,
            match_status: m.status,
            tournament: m.tournament.clone(),
            round: m.round.clone(),
            created_at: m.created_at,
            updated_at: m.updated_at,
            started_at: m.started_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Binding path resolution
// ---------------------------------------------------------------------------

impl MatchSnapshot {
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// JSON value at a dotted path, or `None` when the path does not exist.
    pub fn resolve(&self, path: &str) -> Option<Value> {
        resolve_path(&self.to_json(), path).cloned()
    }

    /// Display text at a dotted path. Null and missing paths render empty.
    pub fn resolve_display(&self, path: &str) -> String {
        resolve_path(&self.to_json(), path)
            .map(display_value)
            .unwrap_or_default()
    }

    /// Finished sets in play order.
    pub fn set_history(&self) -> Vec<(u32, &SetSnapshot)> {
        let mut sets: Vec<(u32, &SetSnapshot)> = self
            .sets
            .iter()
            .filter_map(|(key, set)| {
                key.strip_prefix("set")
                    .and_then(|n| n.parse().ok())
                    .map(|n| (n, set))
            })
            .collect();
        sets.sort_by_key(|(n, _)| *n);
        sets
    }
}

pub fn resolve_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let path = path.trim();
    if path.is_empty() {
        return None;
    }
    path.split('.').try_fold(root, |node, key| match node {
        Value::Object(map) => map.get(key),
        Value::Array(items) => key.parse::<usize>().ok().and_then(|idx| items.get(idx)),
        _ => None,
    })
}

pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}
