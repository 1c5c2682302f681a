use std::fmt;
use tennis_engine::{
    MatchFormat, MatchScoringEngine, Outcome, ParseError, Player, PlayerSlot, PlayerUpdate,
    PointValue,
};

/// Everything the operator can ask the engine to do, from a key press or the
/// `:` command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScoreCommand {
    NewMatch {
        format: MatchFormat,
        player1: String,
        player2: String,
    },
    UpdatePlayer {
        slot: PlayerSlot,
        update: PlayerUpdate,
    },
    SetEvent {
        tournament: Option<String>,
        round: Option<String>,
    },
    Start,
    End,
    Reset,
    AddPoint(PlayerSlot),
    RemovePoint(PlayerSlot),
    AddGame(PlayerSlot),
    RemoveGame(PlayerSlot),
    AddTiebreakPoint(PlayerSlot),
    RemoveTiebreakPoint(PlayerSlot),
    StartTiebreak,
    EndTiebreak,
    NewSet,
    Serve(PlayerSlot),
    SetGames(i64, i64),
    SetPoints(PointValue, PointValue),
    SetSets(i64, i64),
}

impl ScoreCommand {
    pub fn apply_to(self, engine: &mut MatchScoringEngine) -> Outcome {
        match self {
            ScoreCommand::NewMatch {
                format,
                player1,
                player2,
            } => engine.create_new_match(Player::named(player1), Player::named(player2), format),
            ScoreCommand::UpdatePlayer { slot, update } => engine.update_player_info(slot, update),
            ScoreCommand::SetEvent { tournament, round } => engine.set_event_info(tournament, round),
            ScoreCommand::Start => engine.start_match(),
            ScoreCommand::End => engine.end_match(),
            ScoreCommand::Reset => engine.reset_match(),
            ScoreCommand::AddPoint(slot) => engine.add_point(slot),
            ScoreCommand::RemovePoint(slot) => engine.remove_point(slot),
            ScoreCommand::AddGame(slot) => engine.add_game(slot),
            ScoreCommand::RemoveGame(slot) => engine.remove_game(slot),
            ScoreCommand::AddTiebreakPoint(slot) => engine.add_tiebreak_point(slot),
            ScoreCommand::RemoveTiebreakPoint(slot) => engine.remove_tiebreak_point(slot),
            ScoreCommand::StartTiebreak => engine.start_tiebreak(),
            ScoreCommand::EndTiebreak => engine.end_tiebreak(),
            ScoreCommand::NewSet => engine.start_new_set(),
            ScoreCommand::Serve(slot) => engine.set_serve(slot),
            ScoreCommand::SetGames(p1, p2) => engine.set_game_score(p1, p2),
            ScoreCommand::SetPoints(p1, p2) => engine.set_point_score(p1, p2),
            ScoreCommand::SetSets(p1, p2) => engine.set_set_score(p1, p2),
        }
    }

    /// Short description for the status line.
    pub fn describe(&self) -> String {
        match self {
            ScoreCommand::NewMatch {
                format,
                player1,
                player2,
            } => format!("new match {player1} vs {player2} ({})", format.label()),
            ScoreCommand::UpdatePlayer { slot, .. } => format!("player {} updated", slot.number()),
            ScoreCommand::SetEvent { .. } => "event info".to_string(),
            ScoreCommand::Start => "match started".to_string(),
            ScoreCommand::End => "match ended".to_string(),
            ScoreCommand::Reset => "match reset".to_string(),
            ScoreCommand::AddPoint(slot) => format!("point player {}", slot.number()),
            ScoreCommand::RemovePoint(slot) => format!("point removed player {}", slot.number()),
            ScoreCommand::AddGame(slot) => format!("game player {}", slot.number()),
            ScoreCommand::RemoveGame(slot) => format!("game removed player {}", slot.number()),
            ScoreCommand::AddTiebreakPoint(slot) => {
                format!("tiebreak point player {}", slot.number())
            }
            ScoreCommand::RemoveTiebreakPoint(slot) => {
                format!("tiebreak point removed player {}", slot.number())
            }
            ScoreCommand::StartTiebreak => "tiebreak started".to_string(),
            ScoreCommand::EndTiebreak => "tiebreak ended".to_string(),
            ScoreCommand::NewSet => "new set".to_string(),
            ScoreCommand::Serve(slot) => format!("player {} serving", slot.number()),
            ScoreCommand::SetGames(p1, p2) => format!("games set to {p1}-{p2}"),
            ScoreCommand::SetPoints(p1, p2) => format!("points set to {p1}-{p2}"),
            ScoreCommand::SetSets(p1, p2) => format!("sets set to {p1}-{p2}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    Empty,
    Unknown(String),
    MissingArgument { command: &'static str, usage: &'static str },
    BadPlayer(String),
    BadNumber(String),
    BadPoint(ParseError),
    BadFormat(ParseError),
    UnclosedQuote,
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Empty => write!(f, "empty command"),
            CommandError::Unknown(cmd) => write!(f, "unknown command: {cmd}"),
            CommandError::MissingArgument { command, usage } => {
                write!(f, "{command}: usage: {usage}")
            }
            CommandError::BadPlayer(s) => write!(f, "player must be 1 or 2, got {s:?}"),
            CommandError::BadNumber(s) => write!(f, "not a number: {s:?}"),
            CommandError::BadPoint(e) => write!(f, "{e}"),
            CommandError::BadFormat(e) => write!(f, "{e}"),
            CommandError::UnclosedQuote => write!(f, "unclosed quote"),
        }
    }
}

impl std::error::Error for CommandError {}

/// Split on whitespace, keeping "double quoted" runs together.
fn tokenize(input: &str) -> Result<Vec<String>, CommandError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut has_token = false;

    for ch in input.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                has_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if has_token {
                    tokens.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            c => {
                current.push(c);
                has_token = true;
            }
        }
    }
    if in_quotes {
        return Err(CommandError::UnclosedQuote);
    }
    if has_token {
        tokens.push(current);
    }
    Ok(tokens)
}

fn player(token: Option<&String>, command: &'static str, usage: &'static str) -> Result<PlayerSlot, CommandError> {
    let token = token.ok_or(CommandError::MissingArgument { command, usage })?;
    token
        .parse::<i64>()
        .ok()
        .and_then(PlayerSlot::from_number)
        .ok_or_else(|| CommandError::BadPlayer(token.clone()))
}

fn number(token: Option<&String>, command: &'static str, usage: &'static str) -> Result<i64, CommandError> {
    let token = token.ok_or(CommandError::MissingArgument { command, usage })?;
    token
        .parse::<i64>()
        .map_err(|_| CommandError::BadNumber(token.clone()))
}

fn point(token: Option<&String>, command: &'static str, usage: &'static str) -> Result<PointValue, CommandError> {
    let token = token.ok_or(CommandError::MissingArgument { command, usage })?;
    token.parse().map_err(CommandError::BadPoint)
}

/// Remaining tokens joined back up; `None` when there are none.
fn rest(tokens: &[String], from: usize) -> Option<String> {
    let text = tokens.get(from..)?.join(" ");
    let text = text.trim();
    if text.is_empty() { None } else { Some(text.to_string()) }
}

pub fn parse_command_line(input: &str) -> Result<ScoreCommand, CommandError> {
    let tokens = tokenize(input)?;
    let Some(head) = tokens.first() else {
        return Err(CommandError::Empty);
    };
    let arg = |i: usize| tokens.get(i);

    let command = match head.to_lowercase().as_str() {
        "new" => {
            const USAGE: &str = "new <bo3|bo5> <player1> <player2>";
            let format = arg(1)
                .ok_or(CommandError::MissingArgument { command: "new", usage: USAGE })?
                .parse::<MatchFormat>()
                .map_err(CommandError::BadFormat)?;
            let (Some(player1), Some(player2)) = (arg(2), arg(3)) else {
                return Err(CommandError::MissingArgument { command: "new", usage: USAGE });
            };
            ScoreCommand::NewMatch {
                format,
                player1: player1.clone(),
                player2: player2.clone(),
            }
        }
        "name" => {
            const USAGE: &str = "name <1|2> <name>";
            let slot = player(arg(1), "name", USAGE)?;
            let name = rest(&tokens, 2).ok_or(CommandError::MissingArgument { command: "name", usage: USAGE })?;
            ScoreCommand::UpdatePlayer {
                slot,
                update: PlayerUpdate {
                    name: Some(name),
                    ..Default::default()
                },
            }
        }
        "country" => {
            const USAGE: &str = "country <1|2> <code|->";
            let slot = player(arg(1), "country", USAGE)?;
            let code = rest(&tokens, 2).ok_or(CommandError::MissingArgument { command: "country", usage: USAGE })?;
            let country = if code == "-" { None } else { Some(code.to_uppercase()) };
            ScoreCommand::UpdatePlayer {
                slot,
                update: PlayerUpdate {
                    country: Some(country),
                    ..Default::default()
                },
            }
        }
        "seed" => {
            const USAGE: &str = "seed <1|2> <n|->";
            let slot = player(arg(1), "seed", USAGE)?;
            let seed = match arg(2).map(String::as_str) {
                None => return Err(CommandError::MissingArgument { command: "seed", usage: USAGE }),
                Some("-") => None,
                Some(s) => Some(
                    s.parse::<u32>()
                        .map_err(|_| CommandError::BadNumber(s.to_string()))?,
                ),
            };
            ScoreCommand::UpdatePlayer {
                slot,
                update: PlayerUpdate {
                    seed: Some(seed),
                    ..Default::default()
                },
            }
        }
        "event" => ScoreCommand::SetEvent {
            tournament: arg(1).filter(|t| t.as_str() != "-").cloned(),
            round: rest(&tokens, 2),
        },
        "games" => {
            const USAGE: &str = "games <p1> <p2>";
            ScoreCommand::SetGames(number(arg(1), "games", USAGE)?, number(arg(2), "games", USAGE)?)
        }
        "sets" => {
            const USAGE: &str = "sets <p1> <p2>";
            ScoreCommand::SetSets(number(arg(1), "sets", USAGE)?, number(arg(2), "sets", USAGE)?)
        }
        "points" => {
            const USAGE: &str = "points <p1> <p2>";
            ScoreCommand::SetPoints(point(arg(1), "points", USAGE)?, point(arg(2), "points", USAGE)?)
        }
        "serve" => ScoreCommand::Serve(player(arg(1), "serve", "serve <1|2>")?),
        "point" => ScoreCommand::AddPoint(player(arg(1), "point", "point <1|2>")?),
        "unpoint" => ScoreCommand::RemovePoint(player(arg(1), "unpoint", "unpoint <1|2>")?),
        "game" => ScoreCommand::AddGame(player(arg(1), "game", "game <1|2>")?),
        "ungame" => ScoreCommand::RemoveGame(player(arg(1), "ungame", "ungame <1|2>")?),
        "tbpoint" => ScoreCommand::AddTiebreakPoint(player(arg(1), "tbpoint", "tbpoint <1|2>")?),
        "untbpoint" => {
            ScoreCommand::RemoveTiebreakPoint(player(arg(1), "untbpoint", "untbpoint <1|2>")?)
        }
        "start" => ScoreCommand::Start,
        "end" => ScoreCommand::End,
        "reset" => ScoreCommand::Reset,
        "tiebreak" => ScoreCommand::StartTiebreak,
        "untiebreak" => ScoreCommand::EndTiebreak,
        "newset" => ScoreCommand::NewSet,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(command)
}
