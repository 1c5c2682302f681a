use chrono::{Local, TimeDelta};
use log::error;
use tui::backend::Backend;
use tui::layout::{Alignment, Constraint, Layout, Rect};
use tui::style::{Color, Modifier, Style};
use tui::text::{Line, Span};
use tui::widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table, Tabs, Wrap};
use tui::{Frame, Terminal};
use tui_logger::{TuiLoggerLevelOutput, TuiLoggerWidget};

use crate::app::{App, MenuItem};
use crate::components::scorebug::{SCOREBUG_HEIGHT, Scorebug};
use crate::ui::layout::LayoutAreas;
use tennis_engine::MatchSnapshot;

static TABS: &[&str; 2] = &["Scoreboard", "Bindings"];

const HELP: &[(&str, &str)] = &[
    ("a / l", "point to player 1 / 2"),
    ("A / L", "take back a point from player 1 / 2"),
    ("g / h", "game to player 1 / 2"),
    ("G / H", "take back a game from player 1 / 2"),
    ("[ / ]", "player 1 / 2 serving"),
    ("t / T", "start / end tiebreak"),
    ("n", "close the set for the games leader"),
    ("s / e", "start / end match"),
    ("R", "reset match"),
    (":", "command line (Up/Down for history)"),
    ("1 / 2", "Scoreboard / Bindings tab"),
    ("\"", "toggle log pane"),
    ("f", "toggle full screen"),
    ("? / Esc", "help / back"),
    ("q", "quit"),
];

const COMMANDS: &[&str] = &[
    "new <bo3|bo5> <p1> <p2>     name|country|seed <1|2> <value|->",
    "games|sets <p1> <p2>        points <p1> <p2>   (0 15 30 40 D A)",
    "point|unpoint|game|ungame|tbpoint|untbpoint <1|2>   serve <1|2>",
    "event <tournament> [round]  start end reset tiebreak untiebreak newset",
];

pub fn draw<B>(terminal: &mut Terminal<B>, app: &mut App)
where
    B: Backend,
{
    let current_size = terminal.size().unwrap_or_default();
    if current_size.width <= 10 || current_size.height <= 10 {
        return;
    }

    let mut layout = LayoutAreas::new(current_size);
    let snapshot = app.snapshot();
    let elapsed = app.elapsed();

    let result = terminal.draw(|f| {
        layout.update(f.area(), app.settings.full_screen, app.state.show_logs);

        if !app.settings.full_screen {
            draw_tabs(f, layout.tab_bar, app);
        }

        match app.state.active_tab {
            MenuItem::Scoreboard => draw_scoreboard(f, layout.main, snapshot.as_ref(), elapsed),
            MenuItem::Bindings => draw_bindings(f, layout.main, app, snapshot.as_ref()),
            MenuItem::Help => draw_help(f, layout.main),
        }

        if let Some(logs) = layout.logs {
            draw_logs(f, logs);
        }
        draw_status_line(f, layout.status, app);
    });

    if let Err(e) = result {
        error!("draw failed: {e}");
    }
}

pub fn default_border<'a>(color: Color) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(color))
}

fn draw_tabs(f: &mut Frame, tab_bar: [Rect; 2], app: &App) {
    let style = Style::default().fg(Color::White);
    let border_type = BorderType::Rounded;

    let tab_index = match app.state.active_tab {
        MenuItem::Scoreboard => 0,
        MenuItem::Bindings => 1,
        MenuItem::Help => 0,
    };

    let titles: Vec<Line> = TABS.iter().map(|t| Line::from(*t)).collect();
    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .borders(Borders::LEFT | Borders::BOTTOM | Borders::TOP)
                .border_type(border_type),
        )
        .highlight_style(Style::default().add_modifier(Modifier::UNDERLINED))
        .select(tab_index)
        .style(style);
    f.render_widget(tabs, tab_bar[0]);

    let help = Paragraph::new("Help: ? ")
        .alignment(Alignment::Right)
        .block(
            Block::default()
                .borders(Borders::RIGHT | Borders::BOTTOM | Borders::TOP)
                .border_type(border_type),
        )
        .style(style);
    f.render_widget(help, tab_bar[1]);
}

fn draw_scoreboard(f: &mut Frame, area: Rect, snapshot: Option<&MatchSnapshot>, elapsed: Option<TimeDelta>) {
    let block = default_border(Color::White).title(" Scoreboard ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let Some(snap) = snapshot else {
        draw_placeholder(f, inner, "No match. Press : and type  new bo3 <player1> <player2>");
        return;
    };

    let [bug_area, _gap, detail_area] = Layout::vertical([
        Constraint::Length(SCOREBUG_HEIGHT),
        Constraint::Length(1),
        Constraint::Fill(1),
    ])
    .areas(inner);

    f.render_widget(Scorebug { snapshot: snap, elapsed }, bug_area);

    let label = Style::default().fg(Color::DarkGray);
    let serving = if snap.serving_player == 1 { &snap.player1.name } else { &snap.player2.name };
    let mut lines = vec![
        Line::from(vec![
            Span::styled("serving   ", label),
            Span::raw(serving.as_str()),
        ]),
        Line::from(vec![
            Span::styled("sets      ", label),
            Span::raw(format!("{}-{}", snap.score.player1_sets, snap.score.player2_sets)),
        ]),
    ];
    if let Some(tb) = snap.tiebreak_score {
        lines.push(Line::from(vec![
            Span::styled("tiebreak  ", label),
            Span::styled(
                format!("{}-{}", tb.player1, tb.player2),
                Style::default().fg(Color::Magenta),
            ),
        ]));
    }
    for (number, set) in snap.set_history() {
        let tiebreak = set
            .tiebreak
            .map(|tb| format!("  (tiebreak {}-{})", tb.player1, tb.player2))
            .unwrap_or_default();
        lines.push(Line::from(vec![
            Span::styled(format!("set {number:<6}"), label),
            Span::raw(format!("{}-{}{tiebreak}", set.player1, set.player2)),
        ]));
    }
    if let Some(started) = snap.started_at {
        lines.push(Line::from(vec![
            Span::styled("started   ", label),
            Span::raw(started.with_timezone(&Local).format("%H:%M:%S").to_string()),
        ]));
    }
    lines.push(Line::from(vec![
        Span::styled("match     ", label),
        Span::styled(snap.match_id.as_str(), label),
    ]));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Keys: a/l=point  g/h=game  [/]=serve  t=tiebreak  s=start  e=end  :=command  ?=help",
        label,
    )));

    f.render_widget(Paragraph::new(lines), detail_area);
}

fn draw_bindings(f: &mut Frame, area: Rect, app: &App, snapshot: Option<&MatchSnapshot>) {
    let [fields_area, raw_area] =
        Layout::horizontal([Constraint::Percentage(55), Constraint::Percentage(45)]).areas(area);

    let header = Row::new(vec!["Field", "Path", "Value"])
        .style(Style::default().fg(Color::DarkGray).add_modifier(Modifier::BOLD));
    let rows: Vec<Row> = app
        .state
        .bindings
        .iter()
        .map(|field| {
            let value_style = if field.found {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default().fg(Color::Red)
            };
            let value = if field.found { field.value.clone() } else { "<missing>".to_string() };
            Row::new(vec![
                Cell::from(field.label.as_str()),
                Cell::from(field.path.as_str()).style(Style::default().fg(Color::Gray)),
                Cell::from(value).style(value_style),
            ])
        })
        .collect();
    let table = Table::new(
        rows,
        [Constraint::Length(12), Constraint::Fill(1), Constraint::Length(16)],
    )
    .header(header)
    .block(default_border(Color::White).title(" Bindings "));
    f.render_widget(table, fields_area);

    let raw = snapshot
        .and_then(|snap| serde_json::to_string_pretty(snap).ok())
        .unwrap_or_else(|| "null".to_string());
    f.render_widget(
        Paragraph::new(raw)
            .style(Style::default().fg(Color::Gray))
            .block(default_border(Color::DarkGray).title(" Snapshot ")),
        raw_area,
    );
}

fn draw_help(f: &mut Frame, area: Rect) {
    let block = default_border(Color::White).title(" Help ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let key_style = Style::default().fg(Color::Yellow);
    let mut lines: Vec<Line> = HELP
        .iter()
        .map(|(keys, what)| Line::from(vec![Span::styled(format!("{keys:<10}"), key_style), Span::raw(*what)]))
        .collect();
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Commands", Style::default().add_modifier(Modifier::BOLD))));
    lines.extend(COMMANDS.iter().map(|c| Line::from(Span::raw(*c))));

    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}

fn draw_logs(f: &mut Frame, area: Rect) {
    let logger = TuiLoggerWidget::default()
        .block(default_border(Color::DarkGray).title(" Logs "))
        .style_error(Style::default().fg(Color::Red))
        .style_warn(Style::default().fg(Color::Yellow))
        .style_info(Style::default().fg(Color::Gray))
        .style_debug(Style::default().fg(Color::DarkGray))
        .output_separator(' ')
        .output_timestamp(Some("%H:%M:%S".to_string()))
        .output_level(Some(TuiLoggerLevelOutput::Abbreviated))
        .output_target(false)
        .output_file(false)
        .output_line(false);
    f.render_widget(logger, area);
}

fn draw_status_line(f: &mut Frame, area: Rect, app: &App) {
    let line = if app.state.command_line.active {
        Line::from(vec![
            Span::styled(":", Style::default().fg(Color::Yellow)),
            Span::raw(app.state.command_line.input.as_str()),
            Span::styled("_", Style::default().fg(Color::Yellow)),
        ])
    } else if let Some(status) = &app.state.status {
        let style = if status.is_error {
            Style::default().fg(Color::Red)
        } else {
            Style::default().fg(Color::Green)
        };
        Line::from(vec![
            Span::styled(format!("{} ", status.at), Style::default().fg(Color::DarkGray)),
            Span::styled(status.text.as_str(), style),
        ])
    } else {
        Line::from(Span::styled(
            "Press : for commands, ? for help",
            Style::default().fg(Color::DarkGray),
        ))
    };
    f.render_widget(Paragraph::new(line), area);
}

fn draw_placeholder(f: &mut Frame, area: Rect, msg: &str) {
    f.render_widget(
        Paragraph::new(msg)
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center),
        area,
    );
}
