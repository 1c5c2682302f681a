use crate::{Match, MatchStatus, PlayerSlot, PointValue};
use std::fmt;

/// A Match state the scoring commands should never produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    PointPairing { player1: PointValue, player2: PointValue },
    TiebreakScoreMismatch { is_tiebreak: bool },
    PointsDuringTiebreak,
    TiebreakOutsideSixAll { player1_games: u32, player2_games: u32 },
    SetCountMismatch { slot: PlayerSlot, counted: u32, recorded: u32 },
    SetNumbering { expected: u32, found: u32 },
    CurrentSetBehind { current: u32, recorded: usize },
    NotStartedWithScore,
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvariantViolation::PointPairing { player1, player2 } => {
                write!(f, "inconsistent point pairing {player1}-{player2}")
            }
            InvariantViolation::TiebreakScoreMismatch { is_tiebreak } => write!(
                f,
                "tiebreak score presence does not match isTiebreak={is_tiebreak}"
            ),
            InvariantViolation::PointsDuringTiebreak => {
                write!(f, "regular game points recorded during a tiebreak")
            }
            InvariantViolation::TiebreakOutsideSixAll { player1_games, player2_games } => write!(
                f,
                "tiebreak active at {player1_games}-{player2_games} games"
            ),
            InvariantViolation::SetCountMismatch { slot, counted, recorded } => write!(
                f,
                "player {} has {counted} sets but {recorded} set records",
                slot.number()
            ),
            InvariantViolation::SetNumbering { expected, found } => {
                write!(f, "set record numbered {found}, expected {expected}")
            }
            InvariantViolation::CurrentSetBehind { current, recorded } => write!(
                f,
                "current set {current} is not past the {recorded} recorded sets"
            ),
            InvariantViolation::NotStartedWithScore => {
                write!(f, "match not started but carries score")
            }
        }
    }
}

impl std::error::Error for InvariantViolation {}

/// Verify the Match invariants. Structural checks always run; checks on
/// state derived from scored events are skipped once an operator override
/// has marked the match `adjusted`.
pub fn check(m: &Match) -> Result<(), InvariantViolation> {
    check_point_pairing(m.score.player1_point, m.score.player2_point)?;

    if m.is_tiebreak != m.tiebreak_score.is_some() {
        return Err(InvariantViolation::TiebreakScoreMismatch {
            is_tiebreak: m.is_tiebreak,
        });
    }
    if m.is_tiebreak
        && (m.score.player1_point != PointValue::Love || m.score.player2_point != PointValue::Love)
    {
        return Err(InvariantViolation::PointsDuringTiebreak);
    }

    if m.adjusted {
        return Ok(());
    }

    if m.is_tiebreak && (m.score.player1_games != 6 || m.score.player2_games != 6) {
        return Err(InvariantViolation::TiebreakOutsideSixAll {
            player1_games: m.score.player1_games,
            player2_games: m.score.player2_games,
        });
    }

    for (idx, record) in m.sets.iter().enumerate() {
        let expected = idx as u32 + 1;
        if record.set_number != expected {
            return Err(InvariantViolation::SetNumbering {
                expected,
                found: record.set_number,
            });
        }
    }

    for slot in [PlayerSlot::P1, PlayerSlot::P2] {
        let recorded = m.sets.iter().filter(|r| r.winner() == Some(slot)).count() as u32;
        let counted = m.score.sets(slot);
        if counted != recorded {
            return Err(InvariantViolation::SetCountMismatch { slot, counted, recorded });
        }
    }

    // The current set always follows the last record, even once the match
    // is over.
    if (m.current_set_number as usize) <= m.sets.len() {
        return Err(InvariantViolation::CurrentSetBehind {
            current: m.current_set_number,
            recorded: m.sets.len(),
        });
    }

    if m.status == MatchStatus::NotStarted && (!m.sets.is_empty() || m.score.player1_games + m.score.player2_games > 0) {
        return Err(InvariantViolation::NotStartedWithScore);
    }

    Ok(())
}

/// Deuce markers only ever appear as D–D, A–D or D–A, and a bare 40–40 is
/// always shown as deuce instead.
pub fn check_point_pairing(player1: PointValue, player2: PointValue) -> Result<(), InvariantViolation> {
    use PointValue::*;
    let ok = match (player1, player2) {
        (Deuce, Deuce) | (Advantage, Deuce) | (Deuce, Advantage) => true,
        (Forty, Forty) => false,
        (a, b) => !a.is_deuce_marker() && !b.is_deuce_marker(),
    };
    if ok {
        Ok(())
    } else {
        Err(InvariantViolation::PointPairing { player1, player2 })
    }
}
