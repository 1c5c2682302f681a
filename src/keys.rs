use crate::app::{App, MenuItem};
use crate::state::commands::ScoreCommand;
use crossterm::event::KeyCode::Char;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::sync::Arc;
use tennis_engine::PlayerSlot::{P1, P2};
use tokio::sync::Mutex;

/// Scoring keys. Lowercase scores, uppercase takes it back.
pub fn command_for_key(key_event: KeyEvent) -> Option<ScoreCommand> {
    if key_event.modifiers.contains(KeyModifiers::CONTROL) {
        return None;
    }
    let command = match key_event.code {
        Char('a') => ScoreCommand::AddPoint(P1),
        Char('l') => ScoreCommand::AddPoint(P2),
        Char('A') => ScoreCommand::RemovePoint(P1),
        Char('L') => ScoreCommand::RemovePoint(P2),
        Char('g') => ScoreCommand::AddGame(P1),
        Char('h') => ScoreCommand::AddGame(P2),
        Char('G') => ScoreCommand::RemoveGame(P1),
        Char('H') => ScoreCommand::RemoveGame(P2),
        Char('s') => ScoreCommand::Start,
        Char('e') => ScoreCommand::End,
        Char('R') => ScoreCommand::Reset,
        Char('t') => ScoreCommand::StartTiebreak,
        Char('T') => ScoreCommand::EndTiebreak,
        Char('n') => ScoreCommand::NewSet,
        Char('[') => ScoreCommand::Serve(P1),
        Char(']') => ScoreCommand::Serve(P2),
        _ => return None,
    };
    Some(command)
}

pub async fn handle_key_bindings(key_event: KeyEvent, app: &Arc<Mutex<App>>) {
    let mut guard = app.lock().await;

    if guard.state.command_line.active {
        match key_event.code {
            KeyCode::Esc => guard.state.command_line.cancel(),
            KeyCode::Enter => guard.submit_command_line(),
            KeyCode::Backspace => guard.state.command_line.backspace(),
            KeyCode::Up => guard.state.command_line.history_prev(),
            KeyCode::Down => guard.state.command_line.history_next(),
            Char('c') if key_event.modifiers.contains(KeyModifiers::CONTROL) => {
                guard.state.command_line.cancel()
            }
            Char(ch) => guard.state.command_line.push(ch),
            _ => {}
        }
        return;
    }

    match (guard.state.active_tab, key_event.code, key_event.modifiers) {
        // Quit
        (_, Char('q'), _) | (_, Char('c'), KeyModifiers::CONTROL) => {
            crate::cleanup_terminal();
            std::process::exit(0);
        }

        // Tab switching
        (_, Char('1'), _) => guard.update_tab(MenuItem::Scoreboard),
        (_, Char('2'), _) => guard.update_tab(MenuItem::Bindings),
        (_, Char('?'), _) => guard.update_tab(MenuItem::Help),
        (MenuItem::Help, KeyCode::Esc, _) => guard.exit_help(),

        // Global
        (_, Char(':'), _) => guard.state.command_line.open(),
        (_, Char('f'), _) => guard.toggle_full_screen(),
        (_, Char('"'), _) => guard.toggle_show_logs(),

        _ => {
            if let Some(command) = command_for_key(key_event) {
                guard.apply(command);
            }
        }
    }
}
