use crate::state::bindings::{Binding, default_bindings, parse_bindings};
use log::{LevelFilter, warn};
use tennis_engine::MatchFormat;

pub const ENV_LOG_LEVEL: &str = "COURTSIDE_LOG_LEVEL";
pub const ENV_FORMAT: &str = "COURTSIDE_FORMAT";
pub const ENV_PLAYER1: &str = "COURTSIDE_PLAYER1";
pub const ENV_PLAYER2: &str = "COURTSIDE_PLAYER2";
pub const ENV_BINDINGS: &str = "COURTSIDE_BINDINGS";

#[derive(Debug, Clone)]
pub struct AppSettings {
    pub full_screen: bool,
    pub log_level: Option<LevelFilter>,
    pub format: MatchFormat,
    pub player1: String,
    pub player2: String,
    pub bindings: Vec<Binding>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            full_screen: false,
            log_level: None,
            format: MatchFormat::BestOf3,
            player1: "Player 1".to_string(),
            player2: "Player 2".to_string(),
            bindings: default_bindings(),
        }
    }
}

impl AppSettings {
    pub fn load() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup. Bad values fall back to the default
    /// with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut settings = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(level) = get(ENV_LOG_LEVEL) {
            match level.parse::<LevelFilter>() {
                Ok(level) => settings.log_level = Some(level),
                Err(_) => warn!("{ENV_LOG_LEVEL}: unknown level {level:?}"),
            }
        }
        if let Some(format) = get(ENV_FORMAT) {
            match format.parse::<MatchFormat>() {
                Ok(format) => settings.format = format,
                Err(e) => warn!("{ENV_FORMAT}: {e}"),
            }
        }
        if let Some(name) = get(ENV_PLAYER1) {
            settings.player1 = name;
        }
        if let Some(name) = get(ENV_PLAYER2) {
            settings.player2 = name;
        }
        if let Some(list) = get(ENV_BINDINGS) {
            match parse_bindings(&list) {
                Ok(bindings) if !bindings.is_empty() => settings.bindings = bindings,
                Ok(_) => warn!("{ENV_BINDINGS}: no bindings given, using defaults"),
                Err(e) => warn!("{ENV_BINDINGS}: {e}"),
            }
        }
        settings
    }
}
