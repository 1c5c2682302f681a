use chrono::TimeDelta;
use tennis_engine::{MatchSnapshot, MatchStatus, PlayerSlot};
use tui::buffer::Buffer;
use tui::layout::Rect;
use tui::style::{Color, Modifier, Style};
use tui::widgets::Widget;

// ---------------------------------------------------------------------------
// Layout constants
// ---------------------------------------------------------------------------

/// Header, two player rows, footer.
pub const SCOREBUG_HEIGHT: u16 = 4;

const SERVE_W: u16 = 2;
const COUNTRY_W: u16 = 5;
const SET_W: u16 = 6;
const GAMES_W: u16 = 4;
const POINTS_W: u16 = 4;

const SERVE_MARKER: &str = "●";

// ---------------------------------------------------------------------------
// Row model
// ---------------------------------------------------------------------------

/// One player's line of the scorebug, already formatted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScorebugRow {
    pub serving: bool,
    pub name: String,
    pub country: String,
    /// Games per finished set; the tiebreak loser's points in parentheses.
    pub sets: Vec<String>,
    pub games: String,
    /// Game points, or tiebreak points while a tiebreak runs.
    pub points: String,
}

impl ScorebugRow {
    pub fn build(snapshot: &MatchSnapshot, slot: PlayerSlot) -> Self {
        let (player, games, points, tiebreak_points) = match slot {
            PlayerSlot::P1 => (
                &snapshot.player1,
                snapshot.score.player1_games,
                &snapshot.score.player1_points,
                snapshot.tiebreak_score.map(|tb| tb.player1),
            ),
            PlayerSlot::P2 => (
                &snapshot.player2,
                snapshot.score.player2_games,
                &snapshot.score.player2_points,
                snapshot.tiebreak_score.map(|tb| tb.player2),
            ),
        };

        let name = match player.seed {
            Some(seed) => format!("({seed}) {}", player.name),
            None => player.name.clone(),
        };

        let sets = snapshot
            .set_history()
            .into_iter()
            .map(|(_, set)| {
                let (mine, theirs) = match slot {
                    PlayerSlot::P1 => (set.player1, set.player2),
                    PlayerSlot::P2 => (set.player2, set.player1),
                };
                match set.tiebreak {
                    Some(tb) if mine < theirs => {
                        let lost_with = match slot {
                            PlayerSlot::P1 => tb.player1,
                            PlayerSlot::P2 => tb.player2,
                        };
                        format!("{mine}({lost_with})")
                    }
                    _ => mine.to_string(),
                }
            })
            .collect();

        let live = snapshot.match_status == MatchStatus::InProgress;
        let points = match (live, snapshot.is_tiebreak, tiebreak_points) {
            (false, _, _) => String::new(),
            (true, true, Some(tb)) => tb.to_string(),
            (true, _, _) => points.clone(),
        };

        Self {
            serving: live && snapshot.serving_player == slot.number(),
            name,
            country: player.country.clone().unwrap_or_default(),
            sets,
            games: if snapshot.match_status == MatchStatus::Completed {
                String::new()
            } else {
                games.to_string()
            },
            points,
        }
    }
}

pub fn format_clock(elapsed: TimeDelta) -> String {
    let secs = elapsed.num_seconds().max(0);
    format!("{}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

fn status_style(status: MatchStatus) -> Style {
    match status {
        MatchStatus::NotStarted => Style::default().fg(Color::DarkGray),
        MatchStatus::InProgress => Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        MatchStatus::Completed => Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
    }
}

// ---------------------------------------------------------------------------
// Scorebug widget
// ---------------------------------------------------------------------------

/// Broadcast-style score line:
///
/// ```text
///  Wimbledon · Final                          LIVE 1:02:13
///  ● (1) Novak Djokovic   SRB   6     4(5)    3    40
///    (2) Rafael Nadal     ESP   2     7       2    15
///  Best of 3 · Set 3
/// ```
pub struct Scorebug<'a> {
    pub snapshot: &'a MatchSnapshot,
    pub elapsed: Option<TimeDelta>,
}

impl<'a> Widget for Scorebug<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width < 30 || area.height < SCOREBUG_HEIGHT {
            return;
        }
        let snap = self.snapshot;
        let dim = Style::default().fg(Color::DarkGray);
        let right = area.x + area.width;

        // Header: event on the left, status and clock on the right.
        let event = match (&snap.tournament, &snap.round) {
            (Some(t), Some(r)) => format!("{t} · {r}"),
            (Some(t), None) => t.clone(),
            (None, Some(r)) => r.clone(),
            (None, None) => String::new(),
        };
        buf.set_stringn(area.x + 1, area.y, &event, area.width.saturating_sub(20) as usize, dim);
        let mut status = snap.match_status.label().to_string();
        if let Some(elapsed) = self.elapsed {
            status = format!("{status} {}", format_clock(elapsed));
        }
        let status_x = right.saturating_sub(status.chars().count() as u16 + 1);
        buf.set_string(status_x, area.y, &status, status_style(snap.match_status));

        // Player rows
        let rows = [
            ScorebugRow::build(snap, PlayerSlot::P1),
            ScorebugRow::build(snap, PlayerSlot::P2),
        ];
        let set_cols = rows[0].sets.len() as u16;
        let score_w = COUNTRY_W + set_cols * SET_W + GAMES_W + POINTS_W;
        let name_w = area.width.saturating_sub(SERVE_W + score_w + 1);
        let winner = match (snap.match_status, snap.score.player1_sets.cmp(&snap.score.player2_sets)) {
            (MatchStatus::Completed, std::cmp::Ordering::Greater) => Some(0),
            (MatchStatus::Completed, std::cmp::Ordering::Less) => Some(1),
            _ => None,
        };

        for (idx, row) in rows.iter().enumerate() {
            let y = area.y + 1 + idx as u16;
            let mut x = area.x + 1;
            let name_style = if winner == Some(idx) {
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };

            if row.serving {
                buf.set_string(x, y, SERVE_MARKER, Style::default().fg(Color::Yellow));
            }
            x += SERVE_W;
            buf.set_stringn(x, y, &row.name, name_w as usize, name_style);
            x += name_w;
            buf.set_stringn(x, y, &row.country, COUNTRY_W as usize, dim);
            x += COUNTRY_W;
            for set in &row.sets {
                buf.set_stringn(x, y, set, SET_W as usize, Style::default().fg(Color::Gray));
                x += SET_W;
            }
            buf.set_stringn(
                x,
                y,
                &row.games,
                GAMES_W as usize,
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            );
            x += GAMES_W;
            let points_style = if snap.is_tiebreak {
                Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            };
            buf.set_stringn(x, y, &row.points, POINTS_W as usize, points_style);
        }

        // Footer
        let mut footer = match snap.match_status {
            MatchStatus::Completed => format!("{} · Final", snap.format.label()),
            _ => format!("{} · Set {}", snap.format.label(), snap.current_set),
        };
        if snap.is_tiebreak {
            footer.push_str(" · TIEBREAK");
        }
        buf.set_stringn(area.x + 1, area.y + 3, &footer, area.width.saturating_sub(2) as usize, dim);
    }
}
