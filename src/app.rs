use crate::state::app_settings::AppSettings;
use crate::state::app_state::{AppState, StatusLine};
use crate::state::bindings::ResolvedField;
use crate::state::commands::{ScoreCommand, parse_command_line};
use chrono::{TimeDelta, Utc};
use log::{info, warn};
use tennis_engine::ingest::RestoreError;
use tennis_engine::{MatchScoringEngine, MatchSnapshot, MatchStatus, Outcome, Player};
use tokio::sync::watch;

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum MenuItem {
    #[default]
    Scoreboard,
    Bindings,
    Help,
}

/// Owns the single scoring engine. Every applied command is published on the
/// snapshot channel for the binding worker.
pub struct App {
    pub settings: AppSettings,
    pub state: AppState,
    engine: MatchScoringEngine,
    snapshots: watch::Sender<Option<MatchSnapshot>>,
}

impl App {
    pub fn new(snapshots: watch::Sender<Option<MatchSnapshot>>) -> Self {
        Self::with_settings(AppSettings::load(), snapshots)
    }

    pub fn with_settings(settings: AppSettings, snapshots: watch::Sender<Option<MatchSnapshot>>) -> Self {
        let mut engine = MatchScoringEngine::new();
        engine.create_new_match(
            Player::named(settings.player1.as_str()),
            Player::named(settings.player2.as_str()),
            settings.format,
        );

        let app = Self {
            state: AppState::new(),
            settings,
            engine,
            snapshots,
        };

        if let Some(level) = app.settings.log_level {
            log::set_max_level(level);
            tui_logger::set_default_level(level);
        }

        app.publish();
        app
    }

    pub fn snapshot(&self) -> Option<MatchSnapshot> {
        self.engine.current_data()
    }

    // -----------------------------------------------------------------------
    // Scoring: key handling and the command line
    // -----------------------------------------------------------------------

    pub fn apply(&mut self, command: ScoreCommand) -> Outcome {
        let description = command.describe();
        let outcome = command.apply_to(&mut self.engine);
        match outcome {
            Outcome::Applied => {
                info!("{description}");
                self.state.status = Some(StatusLine::info(description));
                self.publish();
            }
            Outcome::Ignored(rejection) => {
                warn!("{description} ignored: {rejection}");
                self.state.status = Some(StatusLine::error(format!("ignored: {rejection}")));
            }
        }
        outcome
    }

    pub fn run_command_line(&mut self, line: &str) {
        match parse_command_line(line) {
            Ok(command) => {
                self.apply(command);
            }
            Err(e) => {
                warn!("command line {line:?}: {e}");
                self.state.status = Some(StatusLine::error(e.to_string()));
            }
        }
    }

    pub fn submit_command_line(&mut self) {
        if let Some(line) = self.state.command_line.submit() {
            self.run_command_line(&line);
        }
    }

    pub fn restore(&mut self, snapshot: &MatchSnapshot) -> Result<(), RestoreError> {
        self.engine.restore(snapshot)?;
        self.state.status = Some(StatusLine::info(format!(
            "imported {} vs {}",
            snapshot.player1.name, snapshot.player2.name
        )));
        self.publish();
        Ok(())
    }

    /// "score changed"
    fn publish(&self) {
        self.snapshots.send_replace(self.engine.current_data());
    }

    // -----------------------------------------------------------------------
    // Worker and timer events from main_ui_loop
    // -----------------------------------------------------------------------

    pub fn on_bindings_resolved(&mut self, fields: Vec<ResolvedField>) {
        self.state.bindings = fields;
    }

    pub fn on_tick(&mut self) {
        self.state.now = Some(Utc::now());
    }

    /// Time since the first serve. Stops at the last update once the match
    /// is over.
    pub fn elapsed(&self) -> Option<TimeDelta> {
        let current = self.engine.current()?;
        let started = current.started_at?;
        let until = match current.status {
            MatchStatus::Completed => current.updated_at,
            _ => self.state.now.unwrap_or_else(Utc::now),
        };
        Some((until - started).max(TimeDelta::zero()))
    }

    // -----------------------------------------------------------------------
    // Tab management
    // -----------------------------------------------------------------------

    pub fn update_tab(&mut self, next: MenuItem) {
        if self.state.active_tab == next {
            return;
        }
        self.state.previous_tab = self.state.active_tab;
        self.state.active_tab = next;
    }

    pub fn exit_help(&mut self) {
        if self.state.active_tab == MenuItem::Help {
            self.state.active_tab = self.state.previous_tab;
        }
    }

    pub fn toggle_show_logs(&mut self) {
        self.state.show_logs = !self.state.show_logs;
    }

    pub fn toggle_full_screen(&mut self) {
        self.settings.full_screen = !self.settings.full_screen;
    }
}
