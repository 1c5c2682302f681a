use tennis_engine::{
    MatchFormat, MatchScoringEngine, MatchStatus, Outcome, Player, PlayerSlot, PointValue,
    Rejection, TiebreakScore, invariants,
};

use PlayerSlot::{P1, P2};

fn new_match(format: MatchFormat) -> MatchScoringEngine {
    let mut engine = MatchScoringEngine::new();
    engine.create_new_match(
        Player::named("Novak Djokovic"),
        Player::named("Rafael Nadal"),
        format,
    );
    engine.start_match();
    engine
}

fn points_label(engine: &MatchScoringEngine) -> (String, String) {
    let snap = engine.current_data().unwrap();
    (snap.score.player1_points, snap.score.player2_points)
}

fn win_game_on_points(engine: &mut MatchScoringEngine, slot: PlayerSlot) {
    for _ in 0..4 {
        engine.add_point(slot);
    }
}

fn win_set_on_points(engine: &mut MatchScoringEngine, slot: PlayerSlot) {
    for _ in 0..6 {
        win_game_on_points(engine, slot);
    }
}

#[test]
fn four_points_from_love_win_a_game() {
    let mut engine = new_match(MatchFormat::BestOf3);
    win_game_on_points(&mut engine, P1);

    let snap = engine.current_data().unwrap();
    assert_eq!(snap.score.player1_games, 1);
    assert_eq!(snap.score.player2_games, 0);
    assert_eq!(points_label(&engine), ("0".into(), "0".into()));
}

#[test]
fn deuce_advantage_and_back() {
    let mut engine = new_match(MatchFormat::BestOf3);
    for _ in 0..3 {
        engine.add_point(P1);
        engine.add_point(P2);
    }
    assert_eq!(points_label(&engine), ("D".into(), "D".into()));

    engine.add_point(P1);
    assert_eq!(points_label(&engine), ("A".into(), "D".into()));
    engine.add_point(P2);
    assert_eq!(points_label(&engine), ("D".into(), "D".into()));

    engine.add_point(P2);
    assert_eq!(points_label(&engine), ("D".into(), "A".into()));
    engine.add_point(P2);
    let snap = engine.current_data().unwrap();
    assert_eq!(snap.score.player2_games, 1);
    assert_eq!(points_label(&engine), ("0".into(), "0".into()));
}

#[test]
fn six_all_tiebreak_won_seven_five() {
    let mut engine = new_match(MatchFormat::BestOf3);
    for _ in 0..6 {
        win_game_on_points(&mut engine, P1);
        win_game_on_points(&mut engine, P2);
    }
    let snap = engine.current_data().unwrap();
    assert!(snap.is_tiebreak);
    assert_eq!(snap.tiebreak_score, Some(TiebreakScore::default()));

    for _ in 0..5 {
        engine.add_tiebreak_point(P2);
        engine.add_tiebreak_point(P1);
    }
    engine.add_tiebreak_point(P2);
    assert!(engine.current().unwrap().is_tiebreak);
    engine.add_tiebreak_point(P2);

    let m = engine.current().unwrap();
    assert!(!m.is_tiebreak);
    assert_eq!(m.tiebreak_score, None);
    assert_eq!(m.score.player2_sets, 1);
    let record = m.sets[0];
    assert_eq!((record.player1_games, record.player2_games), (6, 7));
    assert_eq!(record.tiebreak, Some(TiebreakScore { player1: 5, player2: 7 }));
    assert!(invariants::check(m).is_ok());
}

#[test]
fn best_of_three_completes_after_two_sets() {
    let mut engine = new_match(MatchFormat::BestOf3);
    win_set_on_points(&mut engine, P2);
    win_set_on_points(&mut engine, P1);
    win_set_on_points(&mut engine, P1);

    let m = engine.current().unwrap();
    assert_eq!(m.status, MatchStatus::Completed);
    assert_eq!(m.winner(), Some(P1));
    assert_eq!(m.sets.len(), 3);
    assert_eq!(m.current_set_number, 4);
    assert_eq!(engine.current_data().unwrap().current_set, 4);

    let before = engine.current().cloned();
    assert_eq!(
        engine.add_point(P2),
        Outcome::Ignored(Rejection::NotInProgress(MatchStatus::Completed))
    );
    assert_eq!(engine.current().cloned(), before);
}

#[test]
fn best_of_five_needs_three_sets() {
    let mut engine = new_match(MatchFormat::BestOf5);
    win_set_on_points(&mut engine, P1);
    win_set_on_points(&mut engine, P1);
    assert_eq!(engine.current().unwrap().status, MatchStatus::InProgress);
    win_set_on_points(&mut engine, P1);

    let snap = engine.current_data().unwrap();
    assert_eq!(snap.match_status, MatchStatus::Completed);
    assert_eq!(snap.score.player1_sets, 3);
    assert_eq!(snap.resolve_display("sets.set3.player1"), "6");
    assert!(!engine.add_game(P2).is_applied());
}

#[test]
fn reset_keeps_players_and_clears_score() {
    let mut engine = new_match(MatchFormat::BestOf3);
    engine.set_event_info(Some("Wimbledon".into()), Some("Final".into()));
    win_set_on_points(&mut engine, P1);
    engine.add_point(P2);
    engine.set_game_score(6, 6);
    engine.start_tiebreak();
    engine.add_tiebreak_point(P1);

    assert!(engine.reset_match().is_applied());
    let m = engine.current().unwrap();
    assert_eq!(m.status, MatchStatus::NotStarted);
    assert_eq!(m.player1.name, "Novak Djokovic");
    assert_eq!(m.player2.name, "Rafael Nadal");
    assert_eq!(m.score, Default::default());
    assert!(m.sets.is_empty());
    assert_eq!(m.current_set_number, 1);
    assert_eq!(m.serving_player, P1);
    assert!(!m.is_tiebreak);
    assert_eq!(m.tiebreak_score, None);
    assert!(!m.adjusted);
    assert_eq!(m.started_at, None);
    assert_eq!(m.tournament.as_deref(), Some("Wimbledon"));
}

#[test]
fn thirty_love_round_trip() {
    let mut engine = new_match(MatchFormat::BestOf3);
    engine.set_point_score(PointValue::Thirty, PointValue::Love);
    engine.add_point(P1);
    assert_eq!(points_label(&engine), ("40".into(), "0".into()));
    engine.remove_point(P1);
    assert_eq!(points_label(&engine), ("30".into(), "0".into()));
}

#[test]
fn first_set_six_two() {
    let mut engine = new_match(MatchFormat::BestOf3);
    for _ in 0..4 {
        win_game_on_points(&mut engine, P1);
    }
    for _ in 0..2 {
        win_game_on_points(&mut engine, P2);
    }
    win_game_on_points(&mut engine, P1);
    assert_eq!(engine.current().unwrap().score.player1_games, 5);
    win_game_on_points(&mut engine, P1);

    let snap = engine.current_data().unwrap();
    assert_eq!(snap.resolve_display("sets.set1.player1"), "6");
    assert_eq!(snap.resolve_display("sets.set1.player2"), "2");
    assert_eq!(snap.current_set, 2);
    assert_eq!((snap.score.player1_games, snap.score.player2_games), (0, 0));
    assert_eq!(snap.score.player1_sets, 1);
}
