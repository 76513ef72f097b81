mod app;
mod ui;

use anyhow::Result;
use app::{App, InputMode, Options};
use clap::Parser;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use ratatui::DefaultTerminal;
use risk_map::map::LayoutMode;
use risk_map::{NavDirection, ViewConfig};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "risk-map", about = "Interactive facility risk map for the terminal")]
struct Args {
    /// Location snapshot JSON (bare array or dashboard payload); built-in demo facility if omitted
    #[arg(short, long)]
    snapshot: Option<PathBuf>,

    /// Initial layout: grid, scatter or cluster
    #[arg(short, long, default_value = "grid")]
    layout: LayoutMode,

    /// Hide search, filter, layout and animation controls
    #[arg(long)]
    no_controls: bool,

    /// Start with animations off
    #[arg(long)]
    no_animation: bool,

    /// Keep a selection even when filtering hides it
    #[arg(long)]
    keep_hidden_selection: bool,

    /// Seconds between snapshot reloads
    #[arg(long, default_value_t = 30)]
    refresh_secs: u64,

    /// Log file (the terminal is owned by the UI)
    #[arg(long, default_value = "risk-map.log")]
    log_file: PathBuf,
}

/// Raw mode, alternate screen and mouse capture for the lifetime of the value.
/// Dropping it restores the terminal, including on early error returns.
struct TerminalSession {
    terminal: DefaultTerminal,
}

impl TerminalSession {
    fn start() -> Result<Self> {
        let session = Self {
            terminal: ratatui::init(),
        };
        execute!(std::io::stdout(), EnableMouseCapture)?;
        Ok(session)
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let _ = execute!(std::io::stdout(), DisableMouseCapture);
        ratatui::restore();
    }
}

fn init_logging(path: &Path) -> Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_file)?;

    let options = Options {
        snapshot: args.snapshot,
        layout: args.layout,
        config: ViewConfig {
            show_controls: !args.no_controls,
            clear_hidden_selection: !args.keep_hidden_selection,
        },
        animation: !args.no_animation,
        refresh_every: Duration::from_secs(args.refresh_secs.max(1)),
    };

    let mut session = TerminalSession::start()?;
    session.terminal.clear()?;
    info!("Risk map started");

    run(&mut session.terminal, options)
}

/// Handle mouse events for selection and hover
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => app.click_at(mouse.column, mouse.row),
        MouseEventKind::Moved => app.hover_at(mouse.column, mouse.row),
        _ => {}
    }
}

/// Keys while typing into the search box
fn handle_search_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter | KeyCode::Esc => app.end_search(),
        KeyCode::Backspace => app.search_pop(),
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => app.search_clear(),
        KeyCode::Char(c) => app.search_push(c),
        _ => {}
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if app.input_mode == InputMode::Search {
        handle_search_key(app, key);
        return;
    }

    match key.code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Esc => app.escape(),

        // Walk the filtered list
        KeyCode::Left | KeyCode::Char('h') => app.navigate(NavDirection::Left),
        KeyCode::Right | KeyCode::Char('l') => app.navigate(NavDirection::Right),
        KeyCode::Enter => app.view_details(),

        // Display-only toggles
        KeyCode::Char('L') => app.map_renderer.toggle_labels(),
        KeyCode::Char('G') => app.map_renderer.toggle_grid(),
        KeyCode::Char('C') => app.map_renderer.toggle_gradient(),
        KeyCode::Char('a') => app.toggle_alerts(),
        KeyCode::Char('R') => app.refresh_now(),

        _ if app.controls_enabled() => handle_control_key(app, key),
        _ => {}
    }
}

/// Search, filter, layout and animation controls
fn handle_control_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('/') => app.start_search(),
        KeyCode::Char(c @ '1'..='4') => app.toggle_filter(c as usize - '1' as usize),
        KeyCode::Char('0') => app.show_all_levels(),
        KeyCode::Char('g') => app.set_layout(LayoutMode::Grid),
        KeyCode::Char('s') => app.set_layout(LayoutMode::Scatter),
        KeyCode::Char('c') => app.set_layout(LayoutMode::Cluster),
        KeyCode::Tab => app.cycle_layout(),
        KeyCode::Char(' ') => app.toggle_animation(),
        KeyCode::Char('r') => app.reset_filters(),
        _ => {}
    }
}

fn run(terminal: &mut DefaultTerminal, options: Options) -> Result<()> {
    let size = terminal.size()?;
    let mut app = App::new(options, size.width, size.height);

    // Main loop
    loop {
        // Draw
        terminal.draw(|frame| ui::render(frame, &app))?;

        // Handle events with ~60fps target
        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                // Only handle key press events (not release)
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    app.notice = None;
                    handle_key(&mut app, key);
                }
                Event::Mouse(mouse) => handle_mouse(&mut app, mouse),
                Event::Resize(width, height) => app.resize(width, height),
                _ => {}
            }
        }

        app.tick();

        if app.should_quit {
            break;
        }
    }

    info!("Risk map closed");
    Ok(())
}
