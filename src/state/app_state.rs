use crate::app::MenuItem;
use crate::state::bindings::ResolvedField;
use chrono::{DateTime, Local, Utc};

// ---------------------------------------------------------------------------
// Command line (`:`)
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct CommandLineState {
    pub active: bool,
    pub input: String,
    /// Previously submitted lines, newest last.
    pub history: Vec<String>,
    history_cursor: Option<usize>,
}

impl CommandLineState {
    pub fn open(&mut self) {
        self.active = true;
        self.input.clear();
        self.history_cursor = None;
    }

    pub fn cancel(&mut self) {
        self.active = false;
        self.input.clear();
        self.history_cursor = None;
    }

    pub fn push(&mut self, ch: char) {
        self.input.push(ch);
    }

    pub fn backspace(&mut self) {
        if self.input.pop().is_none() {
            self.cancel();
        }
    }

    /// Close the line and hand back what was typed.
    pub fn submit(&mut self) -> Option<String> {
        let line = self.input.trim().to_string();
        self.cancel();
        if line.is_empty() {
            return None;
        }
        if self.history.last() != Some(&line) {
            self.history.push(line.clone());
        }
        if self.history.len() > 50 {
            self.history.remove(0);
        }
        Some(line)
    }

    pub fn history_prev(&mut self) {
        if self.history.is_empty() {
            return;
        }
        let idx = match self.history_cursor {
            Some(i) => i.saturating_sub(1),
            None => self.history.len() - 1,
        };
        self.history_cursor = Some(idx);
        self.input = self.history[idx].clone();
    }

    pub fn history_next(&mut self) {
        let Some(i) = self.history_cursor else {
            return;
        };
        if i + 1 < self.history.len() {
            self.history_cursor = Some(i + 1);
            self.input = self.history[i + 1].clone();
        } else {
            self.history_cursor = None;
            self.input.clear();
        }
    }
}

// ---------------------------------------------------------------------------
// Status line
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub text: String,
    pub is_error: bool,
    pub at: String,
}

impl StatusLine {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
            at: Local::now().format("%H:%M:%S").to_string(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            is_error: true,
            ..Self::info(text)
        }
    }
}

#[derive(Debug, Default)]
pub struct AppState {
    pub active_tab: MenuItem,
    pub previous_tab: MenuItem,
    pub show_logs: bool,
    pub command_line: CommandLineState,
    pub status: Option<StatusLine>,
    /// Latest values pushed by the binding worker.
    pub bindings: Vec<ResolvedField>,
    /// Wall clock of the last tick, drives the elapsed match time.
    pub now: Option<DateTime<Utc>>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            now: Some(Utc::now()),
            ..Self::default()
        }
    }
}
