mod app;
mod components;
mod draw;
mod keys;
mod state;
mod ui;

use crate::app::App;
use crate::state::bindings::BindingWorker;
use crate::state::messages::{BindingEvent, UiEvent};
use anyhow::Context;
use crossterm::event::{self as crossterm_event, Event};
use crossterm::{cursor, execute, terminal};
use log::{info, warn};
use std::io::Stdout;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::{io, panic};
use tennis_engine::{MatchSnapshot, ingest};
use tokio::sync::{Mutex, mpsc, watch};
use tokio::time::Duration;
use tui::{Terminal, backend::CrosstermBackend};

#[derive(Debug, PartialEq)]
enum CliAction {
    Run { import: Option<PathBuf> },
    Help,
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let import = match parse_cli_args(std::env::args().skip(1)) {
        Ok(CliAction::Run { import }) => import,
        Ok(CliAction::Help) => {
            println!("{}", usage_text());
            return Ok(());
        }
        Ok(CliAction::Version) => {
            println!("courtside {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Err(message) => {
            eprintln!("{message}\n\n{}", usage_text());
            std::process::exit(2);
        }
    };

    // Read the feed before touching the terminal so errors print normally.
    let imported = import.as_deref().map(load_import).transpose()?;

    better_panic::install();

    tui_logger::init_logger(log::LevelFilter::Error)?;
    tui_logger::set_default_level(log::LevelFilter::Error);

    let (snapshot_tx, snapshot_rx) = watch::channel::<Option<MatchSnapshot>>(None);
    let mut app = App::new(snapshot_tx);
    if let Some((snapshot, total)) = imported {
        if total > 1 {
            warn!("feed holds {total} matches, scoring the first");
        }
        app.restore(&snapshot)
            .with_context(|| format!("restoring match {}", snapshot.match_id))?;
        info!("imported match {}", snapshot.match_id);
    }
    let bindings = app.settings.bindings.clone();
    let app = Arc::new(Mutex::new(app));

    let backend = CrosstermBackend::new(io::stdout());
    let terminal = Terminal::new(backend)?;

    setup_panic_hook();
    setup_terminal()?;

    let (ui_event_tx, ui_event_rx) = mpsc::channel::<UiEvent>(100);
    let (binding_evt_tx, binding_evt_rx) = mpsc::channel::<BindingEvent>(100);

    // Input handler thread
    let input_handler = tokio::spawn(input_handler_task(ui_event_tx.clone()));

    // Binding thread, wakes on every "score changed"
    let binding_worker = BindingWorker::new(bindings, snapshot_rx, binding_evt_tx);
    let binding_task = tokio::spawn(binding_worker.run());

    // Match clock
    let tick_tx = ui_event_tx.clone();
    let tick_task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(1));
        loop {
            interval.tick().await;
            if tick_tx.send(UiEvent::Tick).await.is_err() {
                break;
            }
        }
    });

    let _ = ui_event_tx.send(UiEvent::AppStarted).await;

    main_ui_loop(terminal, app, ui_event_rx, binding_evt_rx).await;

    input_handler.abort();
    binding_task.abort();
    tick_task.abort();

    Ok(())
}

fn parse_cli_args(args: impl IntoIterator<Item = String>) -> Result<CliAction, String> {
    let mut args = args.into_iter();
    let mut import = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(CliAction::Help),
            "-V" | "--version" => return Ok(CliAction::Version),
            "-i" | "--import" => {
                let Some(path) = args.next() else {
                    return Err(format!("{arg} needs a file path"));
                };
                import = Some(PathBuf::from(path));
            }
            _ => return Err(format!("Unknown argument: {arg}")),
        }
    }

    Ok(CliAction::Run { import })
}

/// First match of a raw feed file, plus how many the feed held.
fn load_import(path: &Path) -> anyhow::Result<(MatchSnapshot, usize)> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let snapshots =
        ingest::parse_feed(&text).with_context(|| format!("parsing {}", path.display()))?;
    let total = snapshots.len();
    let first = snapshots
        .into_iter()
        .next()
        .with_context(|| format!("{} holds no matches", path.display()))?;
    Ok((first, total))
}

fn usage_text() -> &'static str {
    "courtside - live tennis scoring console

Usage:
  courtside [--import <feed.json>]
  courtside --help
  courtside --version

Environment:
  COURTSIDE_LOG_LEVEL   error, warn, info, debug or trace (default error)
  COURTSIDE_FORMAT      bo3 or bo5 (default bo3)
  COURTSIDE_PLAYER1     Initial name for player 1
  COURTSIDE_PLAYER2     Initial name for player 2
  COURTSIDE_BINDINGS    Comma separated label=path list, e.g. p1=player1.name,pts=score.player1Points"
}

async fn main_ui_loop(
    mut terminal: Terminal<CrosstermBackend<Stdout>>,
    app: Arc<Mutex<App>>,
    mut ui_events: mpsc::Receiver<UiEvent>,
    mut binding_events: mpsc::Receiver<BindingEvent>,
) {
    loop {
        tokio::select! {
            Some(ui_event) = ui_events.recv() => {
                if handle_ui_event(ui_event, &app).await {
                    let mut app_guard = app.lock().await;
                    draw::draw(&mut terminal, &mut app_guard);
                }
            }

            Some(binding_event) = binding_events.recv() => {
                let mut app_guard = app.lock().await;
                match binding_event {
                    BindingEvent::Resolved { fields } => app_guard.on_bindings_resolved(fields),
                }
                draw::draw(&mut terminal, &mut app_guard);
            }

            else => break,
        }
    }
}

async fn handle_ui_event(ui_event: UiEvent, app: &Arc<Mutex<App>>) -> bool {
    match ui_event {
        UiEvent::AppStarted | UiEvent::Resize => true,
        UiEvent::KeyPressed(key_event) => {
            keys::handle_key_bindings(key_event, app).await;
            true
        }
        UiEvent::Tick => {
            let mut guard = app.lock().await;
            guard.on_tick();
            // The clock only moves while a match is running.
            guard.elapsed().is_some()
        }
    }
}

async fn input_handler_task(ui_events: mpsc::Sender<UiEvent>) {
    loop {
        if let Ok(event) = crossterm_event::read() {
            let ui_event = match event {
                Event::Key(key_event) => Some(UiEvent::KeyPressed(key_event)),
                Event::Resize(_, _) => Some(UiEvent::Resize),
                _ => None,
            };

            if let Some(ui_event) = ui_event
                && ui_events.send(ui_event).await.is_err()
            {
                break;
            }
        }
    }
}

fn setup_terminal() -> io::Result<()> {
    let mut stdout = io::stdout();
    execute!(stdout, cursor::Hide)?;
    execute!(stdout, terminal::EnterAlternateScreen)?;
    execute!(stdout, terminal::Clear(terminal::ClearType::All))?;
    terminal::enable_raw_mode()
}

pub fn cleanup_terminal() {
    let mut stdout = io::stdout();
    let _ = execute!(stdout, cursor::MoveTo(0, 0));
    let _ = execute!(stdout, terminal::Clear(terminal::ClearType::All));
    let _ = execute!(stdout, terminal::LeaveAlternateScreen);
    let _ = execute!(stdout, cursor::Show);
    let _ = terminal::disable_raw_mode();
}

fn setup_panic_hook() {
    panic::set_hook(Box::new(|panic_info| {
        cleanup_terminal();
        better_panic::Settings::auto().create_panic_handler()(panic_info);
    }));
}
