pub mod engine;
pub mod ingest;
pub mod invariants;
pub mod snapshot;

pub use engine::{MatchScoringEngine, Outcome, Rejection};
pub use snapshot::MatchSnapshot;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Players
// ---------------------------------------------------------------------------

/// One side of the net. Replaces the `player${n}` string keys a display
/// binding would use; the snapshot layer converts back to 1/2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerSlot {
    P1,
    P2,
}

impl PlayerSlot {
    pub fn opponent(self) -> Self {
        match self {
            PlayerSlot::P1 => PlayerSlot::P2,
            PlayerSlot::P2 => PlayerSlot::P1,
        }
    }

    pub fn number(self) -> u8 {
        match self {
            PlayerSlot::P1 => 1,
            PlayerSlot::P2 => 2,
        }
    }

    pub fn from_number(n: i64) -> Option<Self> {
        match n {
            1 => Some(PlayerSlot::P1),
            2 => Some(PlayerSlot::P2),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    pub country: Option<String>, // "SRB", "ESP", ...
    pub seed: Option<u32>,
}

impl Player {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Partial update for `update_player_info`. `None` leaves a field alone;
/// `Some(None)` clears an optional field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerUpdate {
    pub name: Option<String>,
    pub country: Option<Option<String>>,
    pub seed: Option<Option<u32>>,
}

impl PlayerUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.country.is_none() && self.seed.is_none()
    }

    fn apply(self, player: &mut Player) {
        if let Some(name) = self.name {
            player.name = name;
        }
        if let Some(country) = self.country {
            player.country = country;
        }
        if let Some(seed) = self.seed {
            player.seed = seed;
        }
    }
}

// ---------------------------------------------------------------------------
// Points
// ---------------------------------------------------------------------------

/// Point score within a regular game. Deuce and Advantage are explicit
/// states rather than "40 + something", so 40–40 never appears on display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointValue {
    #[default]
    Love,
    Fifteen,
    Thirty,
    Forty,
    Deuce,
    Advantage,
}

impl PointValue {
    pub fn label(&self) -> &'static str {
        match self {
            PointValue::Love => "0",
            PointValue::Fifteen => "15",
            PointValue::Thirty => "30",
            PointValue::Forty => "40",
            PointValue::Deuce => "D",
            PointValue::Advantage => "A",
        }
    }

    /// Love → Fifteen → Thirty → Forty. Forty and the deuce states have no
    /// plain successor; the engine resolves those from the opponent's point.
    pub fn next(self) -> Option<Self> {
        match self {
            PointValue::Love => Some(PointValue::Fifteen),
            PointValue::Fifteen => Some(PointValue::Thirty),
            PointValue::Thirty => Some(PointValue::Forty),
            _ => None,
        }
    }

    /// One step back, floored at Love.
    pub fn prev(self) -> Self {
        match self {
            PointValue::Love | PointValue::Fifteen => PointValue::Love,
            PointValue::Thirty => PointValue::Fifteen,
            PointValue::Forty => PointValue::Thirty,
            PointValue::Deuce => PointValue::Forty,
            PointValue::Advantage => PointValue::Deuce,
        }
    }

    pub fn is_deuce_marker(&self) -> bool {
        matches!(self, PointValue::Deuce | PointValue::Advantage)
    }
}

impl fmt::Display for PointValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PointValue {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "0" | "love" => Ok(PointValue::Love),
            "15" => Ok(PointValue::Fifteen),
            "30" => Ok(PointValue::Thirty),
            "40" => Ok(PointValue::Forty),
            "d" | "deuce" => Ok(PointValue::Deuce),
            "a" | "ad" | "adv" | "advantage" => Ok(PointValue::Advantage),
            _ => Err(ParseError::Point(s.to_owned())),
        }
    }
}

// ---------------------------------------------------------------------------
// Match format / status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchFormat {
    #[default]
    BestOf3,
    BestOf5,
}

impl MatchFormat {
    /// ceil(best_of / 2)
    pub fn sets_to_win(&self) -> u32 {
        match self {
            MatchFormat::BestOf3 => 2,
            MatchFormat::BestOf5 => 3,
        }
    }

    pub fn max_sets(&self) -> u32 {
        match self {
            MatchFormat::BestOf3 => 3,
            MatchFormat::BestOf5 => 5,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MatchFormat::BestOf3 => "Best of 3",
            MatchFormat::BestOf5 => "Best of 5",
        }
    }
}

impl FromStr for MatchFormat {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "3" | "bo3" | "best-of-3" | "bestof3" => Ok(MatchFormat::BestOf3),
            "5" | "bo5" | "best-of-5" | "bestof5" => Ok(MatchFormat::BestOf5),
            _ => Err(ParseError::Format(s.to_owned())),
        }
    }
}

/// Moves forward only. `Completed` is terminal until `reset_match`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
}

impl MatchStatus {
    pub fn label(&self) -> &'static str {
        match self {
            MatchStatus::NotStarted => "NOT STARTED",
            MatchStatus::InProgress => "LIVE",
            MatchStatus::Completed => "FINAL",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    Point(String),
    Format(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Point(s) => write!(f, "not a point value: {s:?}"),
            ParseError::Format(s) => write!(f, "not a match format: {s:?}"),
        }
    }
}

impl std::error::Error for ParseError {}

// ---------------------------------------------------------------------------
// Score
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Score {
    pub player1_sets: u32,
    pub player2_sets: u32,
    pub player1_games: u32,
    pub player2_games: u32,
    pub player1_point: PointValue,
    pub player2_point: PointValue,
}

impl Score {
    pub fn sets(&self, slot: PlayerSlot) -> u32 {
        match slot {
            PlayerSlot::P1 => self.player1_sets,
            PlayerSlot::P2 => self.player2_sets,
        }
    }

    pub fn sets_mut(&mut self, slot: PlayerSlot) -> &mut u32 {
        match slot {
            PlayerSlot::P1 => &mut self.player1_sets,
            PlayerSlot::P2 => &mut self.player2_sets,
        }
    }

    pub fn games(&self, slot: PlayerSlot) -> u32 {
        match slot {
            PlayerSlot::P1 => self.player1_games,
            PlayerSlot::P2 => self.player2_games,
        }
    }

    pub fn games_mut(&mut self, slot: PlayerSlot) -> &mut u32 {
        match slot {
            PlayerSlot::P1 => &mut self.player1_games,
            PlayerSlot::P2 => &mut self.player2_games,
        }
    }

    pub fn point(&self, slot: PlayerSlot) -> PointValue {
        match slot {
            PlayerSlot::P1 => self.player1_point,
            PlayerSlot::P2 => self.player2_point,
        }
    }

    pub fn set_point(&mut self, slot: PlayerSlot, value: PointValue) {
        match slot {
            PlayerSlot::P1 => self.player1_point = value,
            PlayerSlot::P2 => self.player2_point = value,
        }
    }

    pub fn set_points(&mut self, slot: PlayerSlot, mine: PointValue, theirs: PointValue) {
        self.set_point(slot, mine);
        self.set_point(slot.opponent(), theirs);
    }

    pub fn reset_points(&mut self) {
        self.player1_point = PointValue::Love;
        self.player2_point = PointValue::Love;
    }

    pub fn reset_games(&mut self) {
        self.player1_games = 0;
        self.player2_games = 0;
    }
}

/// A finished set. Written once, when the set winner is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetRecord {
    pub set_number: u32,
    pub player1_games: u32,
    pub player2_games: u32,
    /// Final tiebreak points, for sets decided 7–6.
    pub tiebreak: Option<TiebreakScore>,
}

impl SetRecord {
    pub fn winner(&self) -> Option<PlayerSlot> {
        match self.player1_games.cmp(&self.player2_games) {
            std::cmp::Ordering::Greater => Some(PlayerSlot::P1),
            std::cmp::Ordering::Less => Some(PlayerSlot::P2),
            std::cmp::Ordering::Equal => None,
        }
    }

    pub fn games(&self, slot: PlayerSlot) -> u32 {
        match slot {
            PlayerSlot::P1 => self.player1_games,
            PlayerSlot::P2 => self.player2_games,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TiebreakScore {
    pub player1: u32,
    pub player2: u32,
}

impl TiebreakScore {
    pub fn points(&self, slot: PlayerSlot) -> u32 {
        match slot {
            PlayerSlot::P1 => self.player1,
            PlayerSlot::P2 => self.player2,
        }
    }

    pub fn points_mut(&mut self, slot: PlayerSlot) -> &mut u32 {
        match slot {
            PlayerSlot::P1 => &mut self.player1,
            PlayerSlot::P2 => &mut self.player2,
        }
    }

    /// First to 7 with a two-point margin.
    pub fn winner(&self) -> Option<PlayerSlot> {
        [PlayerSlot::P1, PlayerSlot::P2].into_iter().find(|&slot| {
            let mine = self.points(slot);
            let theirs = self.points(slot.opponent());
            mine >= 7 && mine >= theirs + 2
        })
    }
}

// ---------------------------------------------------------------------------
// Match
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    pub id: String,
    pub player1: Player,
    pub player2: Player,
    pub format: MatchFormat,
    pub score: Score,
    pub sets: Vec<SetRecord>,
    pub current_set_number: u32,
    pub serving_player: PlayerSlot,
    pub is_tiebreak: bool,
    pub tiebreak_score: Option<TiebreakScore>,
    pub status: MatchStatus,
    pub tournament: Option<String>,
    pub round: Option<String>,
    /// Set once an operator override has moved the state off the scored path.
    pub adjusted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
}

impl Match {
    pub fn new(player1: Player, player2: Player, format: MatchFormat) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::now_v7().to_string(),
            player1,
            player2,
            format,
            score: Score::default(),
            sets: Vec::new(),
            current_set_number: 1,
            serving_player: PlayerSlot::P1,
            is_tiebreak: false,
            tiebreak_score: None,
            status: MatchStatus::NotStarted,
            tournament: None,
            round: None,
            adjusted: false,
            created_at: now,
            updated_at: now,
            started_at: None,
        }
    }

    pub fn player(&self, slot: PlayerSlot) -> &Player {
        match slot {
            PlayerSlot::P1 => &self.player1,
            PlayerSlot::P2 => &self.player2,
        }
    }

    pub fn player_mut(&mut self, slot: PlayerSlot) -> &mut Player {
        match slot {
            PlayerSlot::P1 => &mut self.player1,
            PlayerSlot::P2 => &mut self.player2,
        }
    }

    pub fn is_in_progress(&self) -> bool {
        self.status == MatchStatus::InProgress
    }

    /// Winner of the match, once `status` is Completed by reaching the
    /// format's set count. A match ended early by `end_match` has none.
    pub fn winner(&self) -> Option<PlayerSlot> {
        if self.status != MatchStatus::Completed {
            return None;
        }
        let needed = self.format.sets_to_win();
        [PlayerSlot::P1, PlayerSlot::P2]
            .into_iter()
            .find(|&slot| self.score.sets(slot) >= needed)
    }

    /// Back to a zeroed NotStarted state; identity, players, format and
    /// event labels survive.
    pub fn reset(&mut self) {
        self.score = Score::default();
        self.sets.clear();
        self.current_set_number = 1;
        self.serving_player = PlayerSlot::P1;
        self.is_tiebreak = false;
        self.tiebreak_score = None;
        self.status = MatchStatus::NotStarted;
        self.adjusted = false;
        self.started_at = None;
    }
}
