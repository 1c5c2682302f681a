//! Normalization of loosely-shaped tennis feed JSON into a [`MatchSnapshot`],
//! and rebuilding a [`Match`] from a snapshot.
//!
//! Feeds disagree on key casing (`player1Games` vs `player1_games`), on what
//! a side is called (`player1` vs `team1`) and on point spellings (`ad`,
//! `love`, `deuce`). Everything missing gets a neutral default.

use crate::invariants::{self, InvariantViolation};
use crate::snapshot::{MatchSnapshot, PlayerSnapshot, ScoreSnapshot, SetSnapshot, set_key};
use crate::{
    Match, MatchStatus, ParseError, Player, PlayerSlot, PointValue, Score, SetRecord,
    TiebreakScore,
};
use chrono::Utc;
use log::{debug, warn};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// Raw feed types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawTennisData {
    pub id: Option<String>,
    #[serde(alias = "matchId")]
    pub match_id: Option<String>,
    pub player1: Option<RawPlayerData>,
    pub player2: Option<RawPlayerData>,
    pub team1: Option<RawPlayerData>,
    pub team2: Option<RawPlayerData>,
    pub score: Option<RawScoreData>,
    pub sets: Option<BTreeMap<String, RawSetData>>,
    #[serde(alias = "servingPlayer")]
    pub serving_player: Option<i64>,
    #[serde(alias = "currentSet")]
    pub current_set: Option<i64>,
    #[serde(alias = "isTiebreak")]
    pub is_tiebreak: Option<bool>,
    #[serde(alias = "tiebreakScore")]
    pub tiebreak_score: Option<TiebreakScore>,
    #[serde(alias = "matchStatus")]
    pub match_status: Option<String>,
    pub format: Option<String>,
    pub tournament: Option<String>,
    pub round: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawPlayerData {
    pub name: Option<String>,
    pub country: Option<String>,
    pub seed: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawScoreData {
    #[serde(alias = "player1Sets")]
    pub player1_sets: Option<i64>,
    #[serde(alias = "player2Sets")]
    pub player2_sets: Option<i64>,
    #[serde(alias = "player1Games")]
    pub player1_games: Option<i64>,
    #[serde(alias = "player2Games")]
    pub player2_games: Option<i64>,
    #[serde(alias = "player1Points")]
    pub player1_points: Option<String>,
    #[serde(alias = "player2Points")]
    pub player2_points: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawSetData {
    pub player1: Option<i64>,
    pub player2: Option<i64>,
    pub tiebreak: Option<TiebreakScore>,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum IngestError {
    Json(serde_json::Error),
    UnexpectedShape(&'static str),
}

impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestError::Json(e) => write!(f, "feed is not valid JSON: {e}"),
            IngestError::UnexpectedShape(found) => {
                write!(f, "feed must be a match object or a list of them, found {found}")
            }
        }
    }
}

impl std::error::Error for IngestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IngestError::Json(e) => Some(e),
            IngestError::UnexpectedShape(_) => None,
        }
    }
}

impl From<serde_json::Error> for IngestError {
    fn from(e: serde_json::Error) -> Self {
        IngestError::Json(e)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreError {
    BadPoint(ParseError),
    BadServe(u8),
    Invariant(InvariantViolation),
}

impl fmt::Display for RestoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RestoreError::BadPoint(e) => write!(f, "cannot restore match: {e}"),
            RestoreError::BadServe(n) => write!(f, "cannot restore match: no player {n} to serve"),
            RestoreError::Invariant(v) => write!(f, "restored match would be inconsistent: {v}"),
        }
    }
}

impl std::error::Error for RestoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RestoreError::BadPoint(e) => Some(e),
            RestoreError::BadServe(_) => None,
            RestoreError::Invariant(v) => Some(v),
        }
    }
}

impl From<ParseError> for RestoreError {
    fn from(e: ParseError) -> Self {
        RestoreError::BadPoint(e)
    }
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// A feed entry is usable once it names the match and at least player one.
pub fn validate(raw: &RawTennisData) -> bool {
    let has_id = raw.id.is_some() || raw.match_id.is_some();
    let has_player = raw.player1.is_some() || raw.team1.is_some();
    has_id && has_player
}

pub fn process(raw: RawTennisData) -> MatchSnapshot {
    let match_id = raw
        .match_id
        .or(raw.id)
        .unwrap_or_else(|| "unknown".to_owned());
    let now = Utc::now();

    let is_tiebreak = raw.is_tiebreak.unwrap_or(false);
    let tiebreak_score = if is_tiebreak {
        Some(raw.tiebreak_score.unwrap_or_default())
    } else {
        None
    };

    let snapshot = MatchSnapshot {
        player1: normalize_player(raw.player1.or(raw.team1), "Player 1"),
        player2: normalize_player(raw.player2.or(raw.team2), "Player 2"),
        score: normalize_score(raw.score.unwrap_or_default()),
        sets: normalize_sets(raw.sets.unwrap_or_default()),
        // A finished best-of-5 sits on set 6.
        current_set: raw.current_set.map(|n| n.clamp(1, 6) as u32).unwrap_or(1),
        serving_player: normalize_serving_player(raw.serving_player),
        is_tiebreak,
        tiebreak_score,
        match_status: normalize_status(raw.match_status.as_deref()),
        format: raw
            .format
            .as_deref()
            .and_then(|f| f.parse().ok())
            .unwrap_or_default(),
        tournament: raw.tournament,
        round: raw.round,
        created_at: now,
        updated_at: now,
        started_at: None,
        match_id,
    };
    debug!(
        "normalized feed match {} ({} vs {})",
        snapshot.match_id, snapshot.player1.name, snapshot.player2.name
    );
    snapshot
}

/// Process every entry that deserializes; the rest are logged and skipped.
pub fn process_batch(entries: Vec<Value>) -> Vec<MatchSnapshot> {
    let total = entries.len();
    let processed: Vec<MatchSnapshot> = entries
        .into_iter()
        .enumerate()
        .filter_map(|(idx, entry)| match serde_json::from_value::<RawTennisData>(entry) {
            Ok(raw) => Some(process(raw)),
            Err(e) => {
                warn!("skipping feed entry {idx}: {e}");
                None
            }
        })
        .collect();
    debug!("processed {}/{} feed entries", processed.len(), total);
    processed
}

/// Parse a feed document holding one match object or an array of them.
pub fn parse_feed(text: &str) -> Result<Vec<MatchSnapshot>, IngestError> {
    match serde_json::from_str::<Value>(text)? {
        Value::Array(entries) => Ok(process_batch(entries)),
        entry @ Value::Object(_) => {
            let raw: RawTennisData = serde_json::from_value(entry)?;
            Ok(vec![process(raw)])
        }
        Value::Null => Err(IngestError::UnexpectedShape("null")),
        Value::Bool(_) => Err(IngestError::UnexpectedShape("a boolean")),
        Value::Number(_) => Err(IngestError::UnexpectedShape("a number")),
        Value::String(_) => Err(IngestError::UnexpectedShape("a string")),
    }
}

fn normalize_player(raw: Option<RawPlayerData>, default_name: &str) -> PlayerSnapshot {
    let raw = raw.unwrap_or_default();
    PlayerSnapshot {
        name: raw
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| default_name.to_owned()),
        country: raw.country,
        seed: raw.seed.and_then(|s| u32::try_from(s).ok()),
    }
}

fn normalize_score(raw: RawScoreData) -> ScoreSnapshot {
    let count = |v: Option<i64>| v.unwrap_or(0).clamp(0, i64::from(u32::MAX)) as u32;
    let (player1_points, player2_points) = match (
        normalize_points(raw.player1_points.as_deref()),
        normalize_points(raw.player2_points.as_deref()),
    ) {
        (PointValue::Forty, PointValue::Forty) => (PointValue::Deuce, PointValue::Deuce),
        pair => pair,
    };
    ScoreSnapshot {
        player1_sets: count(raw.player1_sets),
        player2_sets: count(raw.player2_sets),
        player1_games: count(raw.player1_games),
        player2_games: count(raw.player2_games),
        player1_points: player1_points.label().to_owned(),
        player2_points: player2_points.label().to_owned(),
    }
}

/// Unknown spellings read as love.
fn normalize_points(raw: Option<&str>) -> PointValue {
    match raw {
        Some(s) => s.parse().unwrap_or_else(|_| {
            debug!("unrecognized point value {s:?}, using 0");
            PointValue::Love
        }),
        None => PointValue::Love,
    }
}

/// Keys may be `set1` or a bare `1`; anything else is dropped.
fn normalize_sets(raw: BTreeMap<String, RawSetData>) -> BTreeMap<String, SetSnapshot> {
    raw.into_iter()
        .filter_map(|(key, set)| {
            let number = key
                .strip_prefix("set")
                .unwrap_or(&key)
                .parse::<u32>()
                .ok()
                .filter(|n| *n >= 1);
            let Some(number) = number else {
                warn!("ignoring set entry with key {key:?}");
                return None;
            };
            let games = |v: Option<i64>| v.unwrap_or(0).clamp(0, 99) as u32;
            Some((
                set_key(number),
                SetSnapshot {
                    player1: games(set.player1),
                    player2: games(set.player2),
                    tiebreak: set.tiebreak,
                },
            ))
        })
        .collect()
}

fn normalize_serving_player(raw: Option<i64>) -> u8 {
    raw.unwrap_or(1).clamp(1, 2) as u8
}

fn normalize_status(raw: Option<&str>) -> MatchStatus {
    let Some(raw) = raw else {
        return MatchStatus::InProgress;
    };
    match raw.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
        "not_started" | "notstarted" | "scheduled" | "upcoming" => MatchStatus::NotStarted,
        "completed" | "complete" | "finished" | "final" | "ended" => MatchStatus::Completed,
        _ => MatchStatus::InProgress,
    }
}

// ---------------------------------------------------------------------------
// Snapshot -> Match
// ---------------------------------------------------------------------------

/// Rebuild a Match from a snapshot. The result is marked `adjusted`: its
/// history was not scored here.
pub fn match_from_snapshot(snapshot: &MatchSnapshot) -> Result<Match, RestoreError> {
    let player1_point: PointValue = snapshot.score.player1_points.parse()?;
    let player2_point: PointValue = snapshot.score.player2_points.parse()?;
    let (player1_point, player2_point) = match (player1_point, player2_point) {
        (PointValue::Forty, PointValue::Forty) => (PointValue::Deuce, PointValue::Deuce),
        pair => pair,
    };

    let serving_player = PlayerSlot::from_number(i64::from(snapshot.serving_player))
        .ok_or(RestoreError::BadServe(snapshot.serving_player))?;

    let sets = snapshot
        .set_history()
        .into_iter()
        .map(|(set_number, set)| SetRecord {
            set_number,
            player1_games: set.player1,
            player2_games: set.player2,
            tiebreak: set.tiebreak,
        })
        .collect();

    let restored = Match {
        id: snapshot.match_id.clone(),
        player1: restore_player(&snapshot.player1),
        player2: restore_player(&snapshot.player2),
        format: snapshot.format,
        score: Score {
            player1_sets: snapshot.score.player1_sets,
            player2_sets: snapshot.score.player2_sets,
            player1_games: snapshot.score.player1_games,
            player2_games: snapshot.score.player2_games,
            player1_point,
            player2_point,
        },
        sets,
        current_set_number: snapshot.current_set.max(1),
        serving_player,
        is_tiebreak: snapshot.is_tiebreak,
        tiebreak_score: if snapshot.is_tiebreak {
            Some(snapshot.tiebreak_score.unwrap_or_default())
        } else {
            None
        },
        status: snapshot.match_status,
        tournament: snapshot.tournament.clone(),
        round: snapshot.round.clone(),
        adjusted: true,
        created_at: snapshot.created_at,
        updated_at: Utc::now(),
        started_at: snapshot.started_at,
    };

    invariants::check(&restored).map_err(RestoreError::Invariant)?;
    Ok(restored)
}

fn restore_player(snapshot: &PlayerSnapshot) -> Player {
    Player {
        name: snapshot.name.clone(),
        country: snapshot.country.clone(),
        seed: snapshot.seed,
    }
}
