use crate::ingest::{self, RestoreError};
use crate::invariants;
use crate::snapshot::MatchSnapshot;
use crate::{
    Match, MatchFormat, MatchStatus, Player, PlayerSlot, PlayerUpdate, PointValue, SetRecord,
    TiebreakScore,
};
use chrono::Utc;
use log::{debug, info, warn};
use std::fmt;

/// Result of a command. A rejected command leaves the match untouched,
/// `updated_at` included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Ignored(Rejection),
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    NoMatch,
    NotInProgress(MatchStatus),
    MatchCompleted,
    InvalidTransition { from: MatchStatus, to: MatchStatus },
    NotInTiebreak,
    AlreadyInTiebreak,
    InTiebreak,
    InvalidPointPair(PointValue, PointValue),
    AtFloor,
    NoSetLeader,
    EmptyUpdate,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::NoMatch => write!(f, "no match has been created"),
            Rejection::NotInProgress(status) => {
                write!(f, "match is not in progress ({})", status.label())
            }
            Rejection::MatchCompleted => write!(f, "match is completed"),
            Rejection::InvalidTransition { from, to } => {
                write!(f, "cannot move match from {} to {}", from.label(), to.label())
            }
            Rejection::NotInTiebreak => write!(f, "no tiebreak in progress"),
            Rejection::AlreadyInTiebreak => write!(f, "tiebreak already in progress"),
            Rejection::InTiebreak => write!(f, "game points are not used during a tiebreak"),
            Rejection::InvalidPointPair(p1, p2) => write!(f, "{p1}-{p2} is not a valid point score"),
            Rejection::AtFloor => write!(f, "nothing to remove"),
            Rejection::NoSetLeader => write!(f, "games are level, no set winner"),
            Rejection::EmptyUpdate => write!(f, "no fields to update"),
        }
    }
}

type Step = Result<(), Rejection>;

/// Single owner of the Match state. Every command works on a copy and swaps
/// it in only when the whole transition succeeded.
#[derive(Debug, Clone, Default)]
pub struct MatchScoringEngine {
    current: Option<Match>,
}

impl MatchScoringEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&Match> {
        self.current.as_ref()
    }

    /// Read-only projection for display bindings. `None` until a match exists.
    pub fn current_data(&self) -> Option<MatchSnapshot> {
        self.current.as_ref().map(MatchSnapshot::from)
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    pub fn create_new_match(&mut self, player1: Player, player2: Player, format: MatchFormat) -> Outcome {
        let new_match = Match::new(player1, player2, format);
        info!(
            "new match {}: {} vs {} ({})",
            new_match.id,
            new_match.player1.name,
            new_match.player2.name,
            format.label()
        );
        self.current = Some(new_match);
        Outcome::Applied
    }

    pub fn update_player_info(&mut self, slot: PlayerSlot, update: PlayerUpdate) -> Outcome {
        self.mutate("update_player_info", |m| {
            if update.is_empty() {
                return Err(Rejection::EmptyUpdate);
            }
            update.apply(m.player_mut(slot));
            Ok(())
        })
    }

    pub fn set_event_info(&mut self, tournament: Option<String>, round: Option<String>) -> Outcome {
        self.mutate("set_event_info", |m| {
            m.tournament = tournament;
            m.round = round;
            Ok(())
        })
    }

    pub fn start_match(&mut self) -> Outcome {
        self.mutate("start_match", |m| {
            if m.status != MatchStatus::NotStarted {
                return Err(Rejection::InvalidTransition {
                    from: m.status,
                    to: MatchStatus::InProgress,
                });
            }
            m.status = MatchStatus::InProgress;
            m.started_at = Some(Utc::now());
            Ok(())
        })
    }

    pub fn end_match(&mut self) -> Outcome {
        self.mutate("end_match", |m| {
            if m.status != MatchStatus::InProgress {
                return Err(Rejection::InvalidTransition {
                    from: m.status,
                    to: MatchStatus::Completed,
                });
            }
            m.status = MatchStatus::Completed;
            Ok(())
        })
    }

    pub fn reset_match(&mut self) -> Outcome {
        self.mutate("reset_match", |m| {
            m.reset();
            Ok(())
        })
    }

    /// Replace the owned match with one rebuilt from a snapshot.
    pub fn restore(&mut self, snapshot: &MatchSnapshot) -> Result<(), RestoreError> {
        let restored = ingest::match_from_snapshot(snapshot)?;
        info!("restored match {} ({})", restored.id, restored.status.label());
        self.current = Some(restored);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Scoring
    // -----------------------------------------------------------------------

    pub fn add_point(&mut self, slot: PlayerSlot) -> Outcome {
        self.scoring("add_point", |m| {
            if m.is_tiebreak {
                score_tiebreak_point(m, slot);
            } else {
                score_point(m, slot);
            }
            Ok(())
        })
    }

    /// Undoing a point from deuce leaves the remover on 30 and the opponent
    /// on 40, never a bare 40-40.
    pub fn remove_point(&mut self, slot: PlayerSlot) -> Outcome {
        self.scoring("remove_point", |m| {
            if m.is_tiebreak {
                unscore_tiebreak_point(m, slot)
            } else {
                unscore_point(m, slot)
            }
        })
    }

    pub fn add_game(&mut self, slot: PlayerSlot) -> Outcome {
        self.scoring("add_game", |m| {
            win_game(m, slot);
            Ok(())
        })
    }

    /// Plain decrement for corrections. A set, tiebreak, or match result the
    /// removed game had triggered stays in place.
    pub fn remove_game(&mut self, slot: PlayerSlot) -> Outcome {
        self.scoring("remove_game", |m| {
            let games = m.score.games_mut(slot);
            if *games == 0 {
                return Err(Rejection::AtFloor);
            }
            *games -= 1;
            if m.is_tiebreak {
                m.adjusted = true;
            }
            Ok(())
        })
    }

    pub fn add_tiebreak_point(&mut self, slot: PlayerSlot) -> Outcome {
        self.scoring("add_tiebreak_point", |m| {
            if !m.is_tiebreak {
                return Err(Rejection::NotInTiebreak);
            }
            score_tiebreak_point(m, slot);
            Ok(())
        })
    }

    /// Plain decrement; a tiebreak already won is not reopened.
    pub fn remove_tiebreak_point(&mut self, slot: PlayerSlot) -> Outcome {
        self.scoring("remove_tiebreak_point", |m| {
            if !m.is_tiebreak {
                return Err(Rejection::NotInTiebreak);
            }
            unscore_tiebreak_point(m, slot)
        })
    }

    pub fn start_tiebreak(&mut self) -> Outcome {
        self.scoring("start_tiebreak", |m| {
            if m.is_tiebreak {
                return Err(Rejection::AlreadyInTiebreak);
            }
            m.is_tiebreak = true;
            m.tiebreak_score = Some(TiebreakScore::default());
            m.score.reset_points();
            m.adjusted = true;
            Ok(())
        })
    }

    pub fn end_tiebreak(&mut self) -> Outcome {
        self.scoring("end_tiebreak", |m| {
            if !m.is_tiebreak {
                return Err(Rejection::NotInTiebreak);
            }
            m.is_tiebreak = false;
            m.tiebreak_score = None;
            m.adjusted = true;
            Ok(())
        })
    }

    /// Close the open set in favor of whoever leads on games.
    pub fn start_new_set(&mut self) -> Outcome {
        self.scoring("start_new_set", |m| {
            let leader = match m.score.player1_games.cmp(&m.score.player2_games) {
                std::cmp::Ordering::Greater => PlayerSlot::P1,
                std::cmp::Ordering::Less => PlayerSlot::P2,
                std::cmp::Ordering::Equal => return Err(Rejection::NoSetLeader),
            };
            complete_set(m, leader);
            m.adjusted = true;
            Ok(())
        })
    }

    // -----------------------------------------------------------------------
    // Direct overrides: raw edits, no win detection
    // -----------------------------------------------------------------------

    pub fn set_game_score(&mut self, player1: i64, player2: i64) -> Outcome {
        self.override_edit("set_game_score", |m| {
            m.score.player1_games = clamp_count(player1);
            m.score.player2_games = clamp_count(player2);
            m.adjusted = true;
            Ok(())
        })
    }

    pub fn set_point_score(&mut self, player1: PointValue, player2: PointValue) -> Outcome {
        self.override_edit("set_point_score", |m| {
            let (player1, player2) = match (player1, player2) {
                (PointValue::Forty, PointValue::Forty) => (PointValue::Deuce, PointValue::Deuce),
                pair => pair,
            };
            if invariants::check_point_pairing(player1, player2).is_err() {
                warn!("rejected point override {player1}-{player2}");
                return Err(Rejection::InvalidPointPair(player1, player2));
            }
            if m.is_tiebreak && (player1, player2) != (PointValue::Love, PointValue::Love) {
                return Err(Rejection::InTiebreak);
            }
            m.score.player1_point = player1;
            m.score.player2_point = player2;
            Ok(())
        })
    }

    pub fn set_set_score(&mut self, player1: i64, player2: i64) -> Outcome {
        self.override_edit("set_set_score", |m| {
            m.score.player1_sets = clamp_count(player1);
            m.score.player2_sets = clamp_count(player2);
            m.adjusted = true;
            Ok(())
        })
    }

    /// Unconditional, in any match state.
    pub fn set_serve(&mut self, slot: PlayerSlot) -> Outcome {
        self.mutate("set_serve", |m| {
            m.serving_player = slot;
            Ok(())
        })
    }

    // -----------------------------------------------------------------------
    // Command plumbing
    // -----------------------------------------------------------------------

    fn scoring<F>(&mut self, command: &'static str, step: F) -> Outcome
    where
        F: FnOnce(&mut Match) -> Step,
    {
        self.mutate(command, |m| {
            if !m.is_in_progress() {
                return Err(Rejection::NotInProgress(m.status));
            }
            step(m)
        })
    }

    /// Overrides are allowed before and during play, not after completion.
    fn override_edit<F>(&mut self, command: &'static str, step: F) -> Outcome
    where
        F: FnOnce(&mut Match) -> Step,
    {
        self.mutate(command, |m| {
            if m.status == MatchStatus::Completed {
                return Err(Rejection::MatchCompleted);
            }
            step(m)
        })
    }

    fn mutate<F>(&mut self, command: &'static str, step: F) -> Outcome
    where
        F: FnOnce(&mut Match) -> Step,
    {
        let Some(current) = self.current.as_ref() else {
            debug!("{command} ignored: {}", Rejection::NoMatch);
            return Outcome::Ignored(Rejection::NoMatch);
        };

        let mut next = current.clone();
        if let Err(rejection) = step(&mut next) {
            debug!("{command} ignored: {rejection}");
            return Outcome::Ignored(rejection);
        }
        next.updated_at = Utc::now();

        #[cfg(debug_assertions)]
        if let Err(violation) = invariants::check(&next) {
            panic!("{command} left match {} inconsistent: {violation}", next.id);
        }

        debug!(
            "{command}: sets {}-{} games {}-{} points {}-{}{}",
            next.score.player1_sets,
            next.score.player2_sets,
            next.score.player1_games,
            next.score.player2_games,
            next.score.player1_point,
            next.score.player2_point,
            next.tiebreak_score
                .map(|tb| format!(" tiebreak {}-{}", tb.player1, tb.player2))
                .unwrap_or_default()
        );
        self.current = Some(next);
        Outcome::Applied
    }
}

/// Highest games or sets count an override can write.
pub const MAX_OVERRIDE_COUNT: u32 = 99;

fn clamp_count(value: i64) -> u32 {
    value.clamp(0, i64::from(MAX_OVERRIDE_COUNT)) as u32
}

// ---------------------------------------------------------------------------
// Regular game points
// ---------------------------------------------------------------------------

fn score_point(m: &mut Match, slot: PlayerSlot) {
    use PointValue::*;

    let mine = m.score.point(slot);
    let theirs = m.score.point(slot.opponent());

    match (mine, theirs) {
        (Advantage, _) => win_game(m, slot),
        (Deuce, Advantage) => m.score.set_points(slot, Deuce, Deuce),
        (Deuce, _) | (Forty, Forty) => m.score.set_points(slot, Advantage, Deuce),
        (Forty, _) => win_game(m, slot),
        (_, _) => {
            let next = mine.next().unwrap_or(Forty);
            if next == Forty && theirs == Forty {
                m.score.set_points(slot, Deuce, Deuce);
            } else {
                m.score.set_point(slot, next);
            }
        }
    }
}

fn unscore_point(m: &mut Match, slot: PlayerSlot) -> Step {
    use PointValue::*;

    let mine = m.score.point(slot);
    let theirs = m.score.point(slot.opponent());

    match (mine, theirs) {
        (Advantage, _) | (_, Advantage) => m.score.set_points(slot, Deuce, Deuce),
        // Undo the point that made it deuce: the remover drops back a step.
        (Deuce, _) => m.score.set_points(slot, Thirty, Forty),
        (Love, _) => return Err(Rejection::AtFloor),
        (_, _) => m.score.set_point(slot, mine.prev()),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tiebreak points
// ---------------------------------------------------------------------------

fn score_tiebreak_point(m: &mut Match, slot: PlayerSlot) {
    let won = {
        let tiebreak = m.tiebreak_score.get_or_insert_with(TiebreakScore::default);
        *tiebreak.points_mut(slot) += 1;
        tiebreak.winner() == Some(slot)
    };
    if won {
        win_game(m, slot);
        m.is_tiebreak = false;
        m.tiebreak_score = None;
    }
}

fn unscore_tiebreak_point(m: &mut Match, slot: PlayerSlot) -> Step {
    let tiebreak = m.tiebreak_score.get_or_insert_with(TiebreakScore::default);
    let points = tiebreak.points_mut(slot);
    if *points == 0 {
        return Err(Rejection::AtFloor);
    }
    *points -= 1;
    Ok(())
}

// ---------------------------------------------------------------------------
// Games, sets, match
// ---------------------------------------------------------------------------

fn win_game(m: &mut Match, slot: PlayerSlot) {
    let games = m.score.games_mut(slot);
    *games = games.saturating_add(1);
    m.score.reset_points();

    let won = m.score.games(slot);
    let lost = m.score.games(slot.opponent());

    if (won >= 6 && won >= lost.saturating_add(2)) || (won == 7 && lost == 6) {
        complete_set(m, slot);
    } else if won == 6 && lost == 6 {
        info!("set {} goes to a tiebreak", m.current_set_number);
        m.is_tiebreak = true;
        m.tiebreak_score = Some(TiebreakScore::default());
    } else {
        m.serving_player = m.serving_player.opponent();
    }
}

fn complete_set(m: &mut Match, winner: PlayerSlot) {
    let tiebreak = if m.is_tiebreak { m.tiebreak_score.take() } else { None };
    let record = SetRecord {
        set_number: m.current_set_number,
        player1_games: m.score.player1_games,
        player2_games: m.score.player2_games,
        tiebreak,
    };
    info!(
        "set {} to player {}: {}-{}",
        record.set_number,
        winner.number(),
        record.player1_games,
        record.player2_games
    );
    m.sets.push(record);
    let sets = m.score.sets_mut(winner);
    *sets = sets.saturating_add(1);
    m.score.reset_games();
    m.score.reset_points();
    m.is_tiebreak = false;
    m.tiebreak_score = None;
    m.current_set_number += 1;

    if m.score.sets(winner) >= m.format.sets_to_win() {
        info!(
            "match {} won by {} {}-{}",
            m.id,
            m.player(winner).name,
            m.score.sets(winner),
            m.score.sets(winner.opponent())
        );
        m.status = MatchStatus::Completed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use PointValue::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn live() -> MatchScoringEngine {
        started_match()
    }

    fn started_match() -> MatchScoringEngine {
        let mut engine = MatchScoringEngine::new();
        engine.create_new_match(
            Player::named("Novak Djokovic"),
            Player::named("Rafael Nadal"),
            MatchFormat::BestOf3,
        );
        engine.start_match();
        engine
    }

    fn points(engine: &MatchScoringEngine) -> (PointValue, PointValue) {
        let m = engine.current().expect("match exists");
        (m.score.player1_point, m.score.player2_point)
    }

    fn games(engine: &MatchScoringEngine) -> (u32, u32) {
        let m = engine.current().expect("match exists");
        (m.score.player1_games, m.score.player2_games)
    }

    fn win_games(engine: &mut MatchScoringEngine, slot: PlayerSlot, n: usize) {
        for _ in 0..n {
            assert!(engine.add_game(slot).is_applied());
        }
    }

    #[rstest]
    #[case(Love, Love, PlayerSlot::P1, (Fifteen, Love))]
    #[case(Thirty, Love, PlayerSlot::P1, (Forty, Love))]
    #[case(Forty, Fifteen, PlayerSlot::P2, (Forty, Thirty))]
    #[case(Thirty, Forty, PlayerSlot::P1, (Deuce, Deuce))]
    #[case(Forty, Thirty, PlayerSlot::P2, (Deuce, Deuce))]
    #[case(Deuce, Deuce, PlayerSlot::P1, (Advantage, Deuce))]
    #[case(Deuce, Deuce, PlayerSlot::P2, (Deuce, Advantage))]
    #[case(Advantage, Deuce, PlayerSlot::P2, (Deuce, Deuce))]
    #[case(Deuce, Advantage, PlayerSlot::P1, (Deuce, Deuce))]
    fn add_point_transitions(
        mut live: MatchScoringEngine,
        #[case] p1: PointValue,
        #[case] p2: PointValue,
        #[case] scorer: PlayerSlot,
        #[case] expected: (PointValue, PointValue),
    ) {
        assert!(live.set_point_score(p1, p2).is_applied());
        assert!(live.add_point(scorer).is_applied());
        assert_eq!(points(&live), expected);
        assert_eq!(games(&live), (0, 0));
    }

    #[rstest]
    #[case(Forty, Thirty, PlayerSlot::P1)]
    #[case(Forty, Love, PlayerSlot::P1)]
    #[case(Advantage, Deuce, PlayerSlot::P1)]
    #[case(Fifteen, Forty, PlayerSlot::P2)]
    #[case(Deuce, Advantage, PlayerSlot::P2)]
    fn add_point_wins_game(
        mut live: MatchScoringEngine,
        #[case] p1: PointValue,
        #[case] p2: PointValue,
        #[case] scorer: PlayerSlot,
    ) {
        live.set_point_score(p1, p2);
        live.add_point(scorer);
        assert_eq!(points(&live), (Love, Love));
        let expected = match scorer {
            PlayerSlot::P1 => (1, 0),
            PlayerSlot::P2 => (0, 1),
        };
        assert_eq!(games(&live), expected);
    }

    #[rstest]
    #[case(Advantage, Deuce, PlayerSlot::P1, (Deuce, Deuce))]
    #[case(Advantage, Deuce, PlayerSlot::P2, (Deuce, Deuce))]
    #[case(Deuce, Deuce, PlayerSlot::P1, (Thirty, Forty))]
    #[case(Deuce, Deuce, PlayerSlot::P2, (Forty, Thirty))]
    #[case(Forty, Fifteen, PlayerSlot::P1, (Thirty, Fifteen))]
    #[case(Fifteen, Love, PlayerSlot::P1, (Love, Love))]
    #[case(Love, Thirty, PlayerSlot::P2, (Love, Fifteen))]
    fn remove_point_transitions(
        mut live: MatchScoringEngine,
        #[case] p1: PointValue,
        #[case] p2: PointValue,
        #[case] slot: PlayerSlot,
        #[case] expected: (PointValue, PointValue),
    ) {
        live.set_point_score(p1, p2);
        assert!(live.remove_point(slot).is_applied());
        assert_eq!(points(&live), expected);
    }

    #[rstest]
    fn remove_point_at_love_is_ignored(mut live: MatchScoringEngine) {
        live.set_point_score(Love, Thirty);
        let before = live.current().cloned();
        assert_eq!(live.remove_point(PlayerSlot::P1), Outcome::Ignored(Rejection::AtFloor));
        assert_eq!(live.current().cloned(), before);
    }

    // add then remove returns to the starting points, for every state that
    // neither wins the game nor cancels an advantage.
    #[rstest]
    #[case(Love, Love, PlayerSlot::P1)]
    #[case(Thirty, Love, PlayerSlot::P1)]
    #[case(Thirty, Thirty, PlayerSlot::P2)]
    #[case(Thirty, Forty, PlayerSlot::P1)]
    #[case(Forty, Thirty, PlayerSlot::P2)]
    #[case(Deuce, Deuce, PlayerSlot::P1)]
    #[case(Deuce, Deuce, PlayerSlot::P2)]
    fn add_then_remove_round_trips(
        mut live: MatchScoringEngine,
        #[case] p1: PointValue,
        #[case] p2: PointValue,
        #[case] slot: PlayerSlot,
    ) {
        live.set_point_score(p1, p2);
        live.add_point(slot);
        live.remove_point(slot);
        assert_eq!(points(&live), (p1, p2));
    }

    #[rstest]
    fn four_straight_points_win_a_game(mut live: MatchScoringEngine) {
        for _ in 0..4 {
            live.add_point(PlayerSlot::P2);
        }
        assert_eq!(points(&live), (Love, Love));
        assert_eq!(games(&live), (0, 1));
    }

    #[rstest]
    fn ordinary_game_rotates_serve(mut live: MatchScoringEngine) {
        assert_eq!(live.current().unwrap().serving_player, PlayerSlot::P1);
        live.add_game(PlayerSlot::P1);
        assert_eq!(live.current().unwrap().serving_player, PlayerSlot::P2);
        live.add_game(PlayerSlot::P1);
        assert_eq!(live.current().unwrap().serving_player, PlayerSlot::P1);
    }

    #[rstest]
    fn six_all_starts_tiebreak(mut live: MatchScoringEngine) {
        for _ in 0..6 {
            live.add_game(PlayerSlot::P1);
            live.add_game(PlayerSlot::P2);
        }
        let m = live.current().unwrap();
        assert!(m.is_tiebreak);
        assert_eq!(m.tiebreak_score, Some(TiebreakScore::default()));
        assert_eq!(games(&live), (6, 6));
    }

    #[rstest]
    fn points_during_tiebreak_go_to_tiebreak_score(mut live: MatchScoringEngine) {
        live.set_game_score(6, 6);
        live.start_tiebreak();
        live.add_point(PlayerSlot::P2);
        live.add_point(PlayerSlot::P2);
        live.remove_point(PlayerSlot::P2);
        let m = live.current().unwrap();
        assert_eq!(m.tiebreak_score, Some(TiebreakScore { player1: 0, player2: 1 }));
        assert_eq!(points(&live), (Love, Love));
    }

    #[rstest]
    fn tiebreak_needs_two_clear_points(mut live: MatchScoringEngine) {
        for _ in 0..6 {
            live.add_game(PlayerSlot::P1);
            live.add_game(PlayerSlot::P2);
        }
        for _ in 0..6 {
            live.add_tiebreak_point(PlayerSlot::P1);
            live.add_tiebreak_point(PlayerSlot::P2);
        }
        live.add_tiebreak_point(PlayerSlot::P1);
        assert!(live.current().unwrap().is_tiebreak);
        live.add_tiebreak_point(PlayerSlot::P1);

        let m = live.current().unwrap();
        assert!(!m.is_tiebreak);
        assert_eq!(m.tiebreak_score, None);
        assert_eq!(m.sets.len(), 1);
        assert_eq!(m.sets[0].player1_games, 7);
        assert_eq!(m.sets[0].player2_games, 6);
        assert_eq!(m.sets[0].tiebreak, Some(TiebreakScore { player1: 8, player2: 6 }));
        assert_eq!(m.score.player1_sets, 1);
        assert_eq!(m.current_set_number, 2);
    }

    #[rstest]
    fn tiebreak_point_outside_tiebreak_is_ignored(mut live: MatchScoringEngine) {
        assert_eq!(
            live.add_tiebreak_point(PlayerSlot::P1),
            Outcome::Ignored(Rejection::NotInTiebreak)
        );
        assert_eq!(
            live.remove_tiebreak_point(PlayerSlot::P1),
            Outcome::Ignored(Rejection::NotInTiebreak)
        );
    }

    #[rstest]
    fn seven_five_wins_set_without_tiebreak(mut live: MatchScoringEngine) {
        win_games(&mut live, PlayerSlot::P1, 5);
        win_games(&mut live, PlayerSlot::P2, 5);
        win_games(&mut live, PlayerSlot::P1, 2);
        let m = live.current().unwrap();
        assert_eq!(m.sets.len(), 1);
        assert_eq!((m.sets[0].player1_games, m.sets[0].player2_games), (7, 5));
        assert_eq!(m.sets[0].tiebreak, None);
    }

    #[rstest]
    fn scoring_before_start_is_ignored() {
        let mut engine = MatchScoringEngine::new();
        assert_eq!(engine.add_point(PlayerSlot::P1), Outcome::Ignored(Rejection::NoMatch));
        engine.create_new_match(Player::named("A"), Player::named("B"), MatchFormat::BestOf3);
        assert_eq!(
            engine.add_point(PlayerSlot::P1),
            Outcome::Ignored(Rejection::NotInProgress(MatchStatus::NotStarted))
        );
    }

    #[rstest]
    fn rejected_command_keeps_updated_at(mut live: MatchScoringEngine) {
        let before = live.current().unwrap().updated_at;
        live.remove_game(PlayerSlot::P1);
        assert_eq!(live.current().unwrap().updated_at, before);
    }

    #[rstest]
    fn lifecycle_only_moves_forward(mut live: MatchScoringEngine) {
        assert_eq!(
            live.start_match(),
            Outcome::Ignored(Rejection::InvalidTransition {
                from: MatchStatus::InProgress,
                to: MatchStatus::InProgress,
            })
        );
        assert!(live.end_match().is_applied());
        assert!(!live.end_match().is_applied());
        assert!(!live.start_match().is_applied());
        assert_eq!(live.current().unwrap().status, MatchStatus::Completed);
        assert!(live.reset_match().is_applied());
        assert_eq!(live.current().unwrap().status, MatchStatus::NotStarted);
    }

    #[rstest]
    fn remove_game_floors_and_keeps_set_results(mut live: MatchScoringEngine) {
        win_games(&mut live, PlayerSlot::P1, 6);
        assert_eq!(live.current().unwrap().score.player1_sets, 1);
        assert_eq!(live.remove_game(PlayerSlot::P1), Outcome::Ignored(Rejection::AtFloor));
        live.add_game(PlayerSlot::P2);
        assert!(live.remove_game(PlayerSlot::P2).is_applied());
        let m = live.current().unwrap();
        assert_eq!(m.score.player1_sets, 1);
        assert_eq!(m.sets.len(), 1);
    }

    #[rstest]
    fn remove_game_during_tiebreak_leaves_tiebreak_running(mut live: MatchScoringEngine) {
        for _ in 0..6 {
            live.add_game(PlayerSlot::P1);
            live.add_game(PlayerSlot::P2);
        }
        assert!(live.remove_game(PlayerSlot::P2).is_applied());
        let m = live.current().unwrap();
        assert!(m.is_tiebreak);
        assert!(m.adjusted);
        assert_eq!(games(&live), (6, 5));
    }

    #[rstest]
    fn overrides_clamp_negative_values(mut live: MatchScoringEngine) {
        live.set_game_score(-3, 4);
        live.set_set_score(1, -1);
        let m = live.current().unwrap();
        assert_eq!((m.score.player1_games, m.score.player2_games), (0, 4));
        assert_eq!((m.score.player1_sets, m.score.player2_sets), (1, 0));
        assert!(m.adjusted);
    }

    #[rstest]
    fn overrides_skip_win_detection(mut live: MatchScoringEngine) {
        live.set_game_score(6, 0);
        let m = live.current().unwrap();
        assert!(m.sets.is_empty());
        assert_eq!(m.current_set_number, 1);
    }

    #[rstest]
    fn huge_game_override_is_capped_and_play_continues(mut live: MatchScoringEngine) {
        assert!(live.set_game_score(i64::MAX, -3).is_applied());
        assert_eq!(games(&live), (MAX_OVERRIDE_COUNT, 0));

        assert!(live.add_game(PlayerSlot::P1).is_applied());
        let m = live.current().unwrap();
        assert_eq!(m.sets.len(), 1);
        assert_eq!(m.sets[0].player1_games, MAX_OVERRIDE_COUNT + 1);
        assert_eq!(m.score.player1_sets, 1);
        assert_eq!(games(&live), (0, 0));
    }

    #[rstest]
    fn huge_set_override_is_capped_and_next_set_ends_match(mut live: MatchScoringEngine) {
        assert!(live.set_set_score(i64::MAX, 0).is_applied());
        assert_eq!(live.current().unwrap().score.player1_sets, MAX_OVERRIDE_COUNT);

        win_games(&mut live, PlayerSlot::P1, 6);
        let m = live.current().unwrap();
        assert_eq!(m.score.player1_sets, MAX_OVERRIDE_COUNT + 1);
        assert_eq!(m.status, MatchStatus::Completed);
    }

    #[test]
    fn overrides_apply_before_first_serve() {
        let mut engine = MatchScoringEngine::new();
        engine.create_new_match(
            Player::named("Novak Djokovic"),
            Player::named("Rafael Nadal"),
            MatchFormat::BestOf3,
        );
        assert!(engine.set_game_score(2, 1).is_applied());
        assert!(engine.set_point_score(Thirty, Love).is_applied());
        assert!(engine.set_set_score(1, 0).is_applied());
        assert_eq!(
            engine.add_point(PlayerSlot::P1),
            Outcome::Ignored(Rejection::NotInProgress(MatchStatus::NotStarted))
        );

        let m = engine.current().unwrap();
        assert_eq!(m.status, MatchStatus::NotStarted);
        assert_eq!(games(&engine), (2, 1));
        assert_eq!(points(&engine), (Thirty, Love));
        assert_eq!(m.score.player1_sets, 1);
    }

    #[rstest]
    fn deciding_set_still_advances_current_set(mut live: MatchScoringEngine) {
        win_games(&mut live, PlayerSlot::P1, 12);
        let m = live.current().unwrap();
        assert_eq!(m.status, MatchStatus::Completed);
        assert_eq!(m.sets.len(), 2);
        assert_eq!(m.current_set_number, 3);
    }

    #[rstest]
    fn point_override_shows_forty_all_as_deuce(mut live: MatchScoringEngine) {
        live.set_point_score(Forty, Forty);
        assert_eq!(points(&live), (Deuce, Deuce));
        assert_eq!(
            live.set_point_score(Advantage, Thirty),
            Outcome::Ignored(Rejection::InvalidPointPair(Advantage, Thirty))
        );
    }

    #[rstest]
    fn overrides_rejected_after_completion(mut live: MatchScoringEngine) {
        live.end_match();
        assert_eq!(live.set_game_score(1, 1), Outcome::Ignored(Rejection::MatchCompleted));
        assert!(live.set_serve(PlayerSlot::P2).is_applied());
    }

    #[rstest]
    fn manual_tiebreak_does_not_touch_games(mut live: MatchScoringEngine) {
        win_games(&mut live, PlayerSlot::P1, 3);
        live.set_point_score(Thirty, Fifteen);
        assert!(live.start_tiebreak().is_applied());
        assert_eq!(live.start_tiebreak(), Outcome::Ignored(Rejection::AlreadyInTiebreak));
        assert_eq!(games(&live), (3, 0));
        assert_eq!(points(&live), (Love, Love));
        assert!(live.end_tiebreak().is_applied());
        let m = live.current().unwrap();
        assert!(!m.is_tiebreak);
        assert_eq!(m.tiebreak_score, None);
        assert_eq!(games(&live), (3, 0));
    }

    #[rstest]
    fn start_new_set_credits_games_leader(mut live: MatchScoringEngine) {
        assert_eq!(live.start_new_set(), Outcome::Ignored(Rejection::NoSetLeader));
        win_games(&mut live, PlayerSlot::P2, 3);
        assert!(live.start_new_set().is_applied());
        let m = live.current().unwrap();
        assert_eq!(m.score.player2_sets, 1);
        assert_eq!((m.sets[0].player1_games, m.sets[0].player2_games), (0, 3));
        assert_eq!(m.current_set_number, 2);
        assert_eq!(games(&live), (0, 0));
    }

    #[rstest]
    fn player_info_updates_in_any_state(mut live: MatchScoringEngine) {
        live.end_match();
        let update = PlayerUpdate {
            country: Some(Some("ESP".into())),
            seed: Some(Some(2)),
            ..Default::default()
        };
        assert!(live.update_player_info(PlayerSlot::P2, update).is_applied());
        assert_eq!(
            live.update_player_info(PlayerSlot::P2, PlayerUpdate::default()),
            Outcome::Ignored(Rejection::EmptyUpdate)
        );
        let player = &live.current().unwrap().player2;
        assert_eq!(player.name, "Rafael Nadal");
        assert_eq!(player.country.as_deref(), Some("ESP"));
        assert_eq!(player.seed, Some(2));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn slot() -> impl Strategy<Value = PlayerSlot> {
            prop_oneof![Just(PlayerSlot::P1), Just(PlayerSlot::P2)]
        }

        proptest! {
            /// Any run of add_point keeps displayable, consistently paired points.
            #[test]
            fn add_point_sequences_stay_consistent(scorers in prop::collection::vec(slot(), 0..400)) {
                let mut engine = started_match();
                for scorer in scorers {
                    engine.add_point(scorer);
                    let m = engine.current().unwrap();
                    prop_assert!(invariants::check(m).is_ok());
                    let labels = ["0", "15", "30", "40", "D", "A"];
                    prop_assert!(labels.contains(&m.score.player1_point.label()));
                    prop_assert!(labels.contains(&m.score.player2_point.label()));
                }
            }

            /// Once completed, no scoring command changes the match.
            #[test]
            fn completed_match_is_frozen(
                scorers in prop::collection::vec(slot(), 0..2000),
                after in prop::collection::vec(slot(), 1..20),
            ) {
                let mut engine = started_match();
                for scorer in scorers {
                    engine.add_point(scorer);
                }
                engine.end_match();
                let frozen = engine.current().cloned();
                for scorer in after {
                    engine.add_point(scorer);
                    engine.add_game(scorer);
                    engine.remove_point(scorer);
                }
                prop_assert_eq!(engine.current().cloned(), frozen);
            }
        }
    }
}
