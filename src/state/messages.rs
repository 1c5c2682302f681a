use crate::state::bindings::ResolvedField;
use crossterm::event::KeyEvent;

#[derive(Debug, Clone)]
pub enum BindingEvent {
    Resolved { fields: Vec<ResolvedField> },
}

#[derive(Debug, Clone)]
pub enum UiEvent {
    KeyPressed(KeyEvent),
    Resize,
    AppStarted,
    /// Once a second, for the match clock.
    Tick,
}
